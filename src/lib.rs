//! # facility-rollup
//!
//! Credit facility summary assembly and line-of-business rollup engine.
//!
//! Given the normalized source tables of a credit portfolio (facility master,
//! counterparties, dated exposure/collateral/pricing snapshots and risk
//! events), this crate derives one summary row per facility as of a reporting
//! date, re-aggregates those rows into desk, L2 and L1 groups, and runs an
//! advisory validation pass over the result.
//!
//! ## Architecture
//!
//! - **core**: Identifiers, rating scales, decimal helpers
//! - **source**: Source table rows, join indexes, as-of snapshot selection
//! - **assembly**: Facility summary derivation and limit classification
//! - **rollup**: Desk / L2 / L1 aggregation
//! - **validation**: Recomputation and consistency checks
//! - **pipeline**: End-to-end run and JSON output sink
//! - **simulation**: Row fixtures and deterministic synthetic portfolios

pub mod assembly;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod rollup;
pub mod simulation;
pub mod source;
pub mod validation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::assembly::assembler::FacilitySummaryAssembler;
    pub use crate::assembly::facility_summary::FacilitySummary;
    pub use crate::assembly::limits::LimitStatus;
    pub use crate::config::{PipelineConfig, ReportingCalendar, ValidationThresholds};
    pub use crate::core::ids::{CounterpartyId, FacilityId, LegalEntityId};
    pub use crate::error::PipelineError;
    pub use crate::pipeline::{run_pipeline, PipelineOutput};
    pub use crate::rollup::assembler::RollupAssembler;
    pub use crate::rollup::summary::RollupOutput;
    pub use crate::source::tables::SourceTables;
    pub use crate::validation::checks::Validator;
    pub use crate::validation::report::ValidationReport;
}
