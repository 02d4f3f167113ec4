pub mod assembler;
pub mod facility_summary;
pub mod limits;
