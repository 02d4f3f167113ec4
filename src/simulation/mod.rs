//! Synthetic inputs for demos, benchmarks and tests.

pub mod fixtures;
pub mod synthetic;
