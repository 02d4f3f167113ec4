use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors arising from parsing rating and severity labels.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatingParseError {
    #[error("unknown external rating '{0}'")]
    UnknownExternalRating(String),
    #[error("invalid internal rating '{0}'")]
    InvalidInternalRating(String),
    #[error("unknown flag severity '{0}'")]
    UnknownSeverity(String),
}

/// Agency-style external rating on a coarse letter scale.
///
/// Variants are declared worst-first, so the derived ordering reads
/// `CCC < B < BB < BBB < A < AA < AAA`: a lower value is a worse rating.
///
/// # Examples
///
/// ```
/// use facility_rollup::core::rating::ExternalRating;
///
/// let current: ExternalRating = "BB".parse().unwrap();
/// let prior: ExternalRating = "BBB".parse().unwrap();
/// assert!(current.is_downgrade_from(prior));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ExternalRating {
    #[serde(rename = "CCC")]
    Ccc,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "BB")]
    Bb,
    #[serde(rename = "BBB")]
    Bbb,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "AAA")]
    Aaa,
}

impl ExternalRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalRating::Ccc => "CCC",
            ExternalRating::B => "B",
            ExternalRating::Bb => "BB",
            ExternalRating::Bbb => "BBB",
            ExternalRating::A => "A",
            ExternalRating::Aa => "AA",
            ExternalRating::Aaa => "AAA",
        }
    }

    /// True when `self` sits strictly below `prior` on the scale.
    pub fn is_downgrade_from(self, prior: ExternalRating) -> bool {
        self < prior
    }

    pub fn is_investment_grade(self) -> bool {
        self >= ExternalRating::Bbb
    }
}

impl fmt::Display for ExternalRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExternalRating {
    type Err = RatingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CCC" => Ok(ExternalRating::Ccc),
            "B" => Ok(ExternalRating::B),
            "BB" => Ok(ExternalRating::Bb),
            "BBB" => Ok(ExternalRating::Bbb),
            "A" => Ok(ExternalRating::A),
            "AA" => Ok(ExternalRating::Aa),
            "AAA" => Ok(ExternalRating::Aaa),
            other => Err(RatingParseError::UnknownExternalRating(other.to_string())),
        }
    }
}

/// Parse an internal rating grade. Higher grades are worse.
pub fn parse_internal_rating(value: &str) -> Result<u32, RatingParseError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| RatingParseError::InvalidInternalRating(value.to_string()))
}

/// Severity of a risk flag, ordered `LOW < MEDIUM < HIGH < CRITICAL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "LOW",
            Severity::Medium => "MEDIUM",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = RatingParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Severity::Low),
            "MEDIUM" => Ok(Severity::Medium),
            "HIGH" => Ok(Severity::High),
            "CRITICAL" => Ok(Severity::Critical),
            other => Err(RatingParseError::UnknownSeverity(other.to_string())),
        }
    }
}
