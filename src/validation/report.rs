use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Class of consistency problem found by the validation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCategory {
    ReferentialIntegrity,
    RatioMismatch,
    FlagMismatch,
    MissingField,
    SanityThreshold,
    DuplicateKey,
    RollupConservation,
}

impl fmt::Display for IssueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IssueCategory::ReferentialIntegrity => "referential-integrity",
            IssueCategory::RatioMismatch => "ratio-mismatch",
            IssueCategory::FlagMismatch => "flag-mismatch",
            IssueCategory::MissingField => "missing-field",
            IssueCategory::SanityThreshold => "sanity-threshold",
            IssueCategory::DuplicateKey => "duplicate-key",
            IssueCategory::RollupConservation => "rollup-conservation",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub category: IssueCategory,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.category, self.message)
    }
}

/// Advisory findings of one validation pass. An empty report means every
/// check passed; a non-empty one never blocks output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: IssueCategory, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            category,
            message: message.into(),
        });
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Human-readable issue lines.
    pub fn messages(&self) -> Vec<String> {
        self.issues.iter().map(ToString::to_string).collect()
    }

    pub fn count(&self, category: IssueCategory) -> usize {
        self.issues.iter().filter(|i| i.category == category).count()
    }

    pub fn counts_by_category(&self) -> BTreeMap<IssueCategory, usize> {
        let mut counts = BTreeMap::new();
        for issue in &self.issues {
            *counts.entry(issue.category).or_insert(0) += 1;
        }
        counts
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Validation Report ===")?;
        if self.is_clean() {
            return writeln!(f, "No issues found.");
        }
        writeln!(f, "Issues: {}", self.issues.len())?;
        for (category, count) in self.counts_by_category() {
            writeln!(f, "  {:<22} {}", category.to_string(), count)?;
        }
        writeln!(f)?;
        for issue in &self.issues {
            writeln!(f, "  {}", issue)?;
        }
        Ok(())
    }
}
