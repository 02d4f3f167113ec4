//! Run configuration: reporting dates and validation thresholds.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```json
//! { "calendar": { "as_of_date": "2025-03-31", "prior_month_date": "2025-02-28" } }
//! ```

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors arising from loading or checking configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("prior-month date {prior} must be before as-of date {as_of}")]
    PriorNotBeforeAsOf { prior: NaiveDate, as_of: NaiveDate },
    #[error("validation tolerance must not be negative, got {0}")]
    NegativeTolerance(Decimal),
}

/// Reference dates every derived age, tenor and snapshot pick is measured
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingCalendar {
    /// Date of the current snapshot.
    pub as_of_date: NaiveDate,
    /// Date of the month-over-month comparison snapshot.
    pub prior_month_date: NaiveDate,
    /// Fixed "today" for remaining-days and aging arithmetic.
    pub today: NaiveDate,
}

impl ReportingCalendar {
    pub fn new(as_of_date: NaiveDate, prior_month_date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            as_of_date,
            prior_month_date,
            today,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prior_month_date >= self.as_of_date {
            return Err(ConfigError::PriorNotBeforeAsOf {
                prior: self.prior_month_date,
                as_of: self.as_of_date,
            });
        }
        Ok(())
    }
}

impl Default for ReportingCalendar {
    fn default() -> Self {
        // Month-end reporting cycle for January 2025.
        let as_of = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap_or_default();
        let prior = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default();
        Self::new(as_of, prior, as_of)
    }
}

/// Thresholds for the advisory validation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// Maximum absolute difference tolerated when recomputing a ratio.
    pub tolerance: Decimal,
    pub min_syndicated_facilities: usize,
    pub min_cross_entity_facilities: usize,
    pub min_amended_facilities: usize,
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            tolerance: dec!(0.0001),
            min_syndicated_facilities: 1,
            min_cross_entity_facilities: 1,
            min_amended_facilities: 1,
        }
    }
}

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub calendar: ReportingCalendar,
    pub validation: ValidationThresholds,
}

impl PipelineConfig {
    /// Load configuration from a JSON file and check it.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: display, source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.calendar.validate()?;
        if self.validation.tolerance < Decimal::ZERO {
            return Err(ConfigError::NegativeTolerance(self.validation.tolerance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_calendar_is_valid() {
        let calendar = ReportingCalendar::default();
        assert!(calendar.validate().is_ok());
        assert_eq!(calendar.today, calendar.as_of_date);
    }

    #[test]
    fn test_prior_after_as_of_rejected() {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        let calendar = ReportingCalendar::new(d(1, 31), d(2, 28), d(1, 31));
        assert!(matches!(
            calendar.validate(),
            Err(ConfigError::PriorNotBeforeAsOf { .. })
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let json = r#"{ "calendar": { "as_of_date": "2025-03-31", "prior_month_date": "2025-02-28" } }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.calendar.as_of_date,
            NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()
        );
        // `today` was omitted and keeps its default
        assert_eq!(config.calendar.today, ReportingCalendar::default().today);
        assert_eq!(config.validation, ValidationThresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut config = PipelineConfig::default();
        config.validation.tolerance = dec!(-0.1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeTolerance(_))
        ));
    }
}
