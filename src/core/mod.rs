pub mod ids;
pub mod numeric;
pub mod rating;
