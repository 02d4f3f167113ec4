//! End-to-end run: assemble facilities, roll them up, validate, and write
//! the output tables.

use crate::assembly::assembler::FacilitySummaryAssembler;
use crate::assembly::facility_summary::FacilitySummary;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::rollup::assembler::RollupAssembler;
use crate::rollup::summary::RollupOutput;
use crate::source::tables::SourceTables;
use crate::validation::checks::Validator;
use crate::validation::report::ValidationReport;
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const FACILITY_SUMMARY_FILE: &str = "facility_summary.json";
pub const DESK_SUMMARY_FILE: &str = "desk_summary.json";
pub const LOB_L2_SUMMARY_FILE: &str = "lob_l2_summary.json";
pub const LOB_L1_SUMMARY_FILE: &str = "lob_l1_summary.json";
pub const VALIDATION_REPORT_FILE: &str = "validation_report.json";

/// Everything one run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutput {
    pub facilities: Vec<FacilitySummary>,
    pub rollups: RollupOutput,
    pub validation: ValidationReport,
}

/// Run every stage over in-memory tables.
///
/// Validation findings are logged and returned, never raised.
pub fn run_pipeline(tables: &SourceTables, config: &PipelineConfig) -> PipelineOutput {
    let calendar = config.calendar;
    info!(
        "assembling {} facilities as of {} (prior month {}, today {})",
        tables.facilities.len(),
        calendar.as_of_date,
        calendar.prior_month_date,
        calendar.today
    );

    let facilities = FacilitySummaryAssembler::new(tables, calendar).assemble();
    let rollups = RollupAssembler::new(tables, calendar).assemble(&facilities);
    info!(
        "rolled up {} desks, {} L2 groups, {} L1 groups",
        rollups.desks.len(),
        rollups.lob_l2.len(),
        rollups.lob_l1.len()
    );

    let validation = Validator::new(tables, calendar, config.validation.clone()).validate(&facilities, Some(&rollups));
    for issue in validation.issues() {
        warn!("{issue}");
    }
    if validation.is_clean() {
        info!("validation passed");
    } else {
        info!("validation found {} issues", validation.len());
    }

    PipelineOutput {
        facilities,
        rollups,
        validation,
    }
}

/// Load source tables from disk and run the pipeline.
pub fn run_from_path(input: impl AsRef<Path>, config: &PipelineConfig) -> Result<PipelineOutput, PipelineError> {
    config.validate()?;
    let tables = SourceTables::from_path(input)?;
    info!("loaded {} source rows", tables.row_count());
    Ok(run_pipeline(&tables, config))
}

impl PipelineOutput {
    /// Write the four output tables and the validation report as JSON files
    /// under `dir`, creating it if needed.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), PipelineError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|source| PipelineError::Write {
            path: dir.display().to_string(),
            source,
        })?;
        write_table(dir, FACILITY_SUMMARY_FILE, "facility summary", &self.facilities)?;
        write_table(dir, DESK_SUMMARY_FILE, "desk summary", &self.rollups.desks)?;
        write_table(dir, LOB_L2_SUMMARY_FILE, "L2 summary", &self.rollups.lob_l2)?;
        write_table(dir, LOB_L1_SUMMARY_FILE, "L1 summary", &self.rollups.lob_l1)?;
        write_table(dir, VALIDATION_REPORT_FILE, "validation report", &self.validation)?;
        info!("wrote output tables to {}", dir.display());
        Ok(())
    }
}

fn write_table<T: Serialize + ?Sized>(
    dir: &Path,
    file_name: &str,
    table: &'static str,
    rows: &T,
) -> Result<(), PipelineError> {
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(rows).map_err(|source| PipelineError::Serialize { table, source })?;
    fs::write(&path, json).map_err(|source| PipelineError::Write {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportingCalendar;
    use crate::simulation::synthetic::{generate_sources, SyntheticConfig};

    #[test]
    fn test_pipeline_over_synthetic_sources_is_clean() {
        let calendar = ReportingCalendar::default();
        let tables = generate_sources(&SyntheticConfig::default(), &calendar);
        let output = run_pipeline(&tables, &PipelineConfig::default());
        assert_eq!(output.facilities.len(), tables.facilities.len());
        assert!(output.validation.is_clean(), "{}", output.validation);
    }

    #[test]
    fn test_write_to_dir_creates_every_table() {
        let tables = generate_sources(&SyntheticConfig::default(), &ReportingCalendar::default());
        let output = run_pipeline(&tables, &PipelineConfig::default());
        let dir = std::env::temp_dir().join(format!("facility-rollup-test-{}", std::process::id()));
        output.write_to_dir(&dir).unwrap();
        for file in [
            FACILITY_SUMMARY_FILE,
            DESK_SUMMARY_FILE,
            LOB_L2_SUMMARY_FILE,
            LOB_L1_SUMMARY_FILE,
            VALIDATION_REPORT_FILE,
        ] {
            assert!(dir.join(file).is_file(), "missing {file}");
        }
        let facilities: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join(FACILITY_SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(facilities.as_array().map(Vec::len), Some(tables.facilities.len()));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_input_is_a_read_error() {
        let err = run_from_path("/nonexistent/tables.json", &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, PipelineError::Read { .. }));
    }
}
