pub mod assembler;
pub mod grouping;
pub mod metrics;
pub mod summary;
