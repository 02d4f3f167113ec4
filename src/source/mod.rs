pub mod event;
pub mod index;
pub mod reference;
pub mod snapshot;
pub mod tables;
