use crate::core::numeric::safe_ratio;
use crate::source::event::{LimitDefinition, LimitUtilizationEvent};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monitoring status of a limit against its two thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LimitStatus {
    #[serde(rename = "Breach")]
    Breach,
    #[serde(rename = "Warning")]
    Warning,
    #[serde(rename = "No Breach")]
    NoBreach,
}

impl LimitStatus {
    /// Classify a utilization fraction. Both thresholds are inclusive: a
    /// utilization exactly at the outer threshold is a breach.
    pub fn classify(utilization: Decimal, inner_threshold: Decimal, outer_threshold: Decimal) -> Self {
        if utilization >= outer_threshold {
            LimitStatus::Breach
        } else if utilization >= inner_threshold {
            LimitStatus::Warning
        } else {
            LimitStatus::NoBreach
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitStatus::Breach => "Breach",
            LimitStatus::Warning => "Warning",
            LimitStatus::NoBreach => "No Breach",
        }
    }
}

impl fmt::Display for LimitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A limit evaluated on one as-of date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitReading {
    pub limit_id: String,
    pub limit_amount_usd: Decimal,
    pub utilized_amount_usd: Decimal,
    pub headroom_usd: Decimal,
    pub utilization_pct: Decimal,
    pub status: LimitStatus,
}

impl LimitReading {
    /// Evaluate `limit` against the utilization `event` the caller selected.
    /// Without an event, `utilized_when_missing` is used instead.
    pub fn evaluate(
        limit: &LimitDefinition,
        event: Option<&LimitUtilizationEvent>,
        utilized_when_missing: Decimal,
    ) -> Self {
        let utilized = event
            .map(|event| event.utilized_amount_usd)
            .unwrap_or(utilized_when_missing);
        let utilization = safe_ratio(utilized, limit.limit_amount_usd);
        Self {
            limit_id: limit.limit_id.clone(),
            limit_amount_usd: limit.limit_amount_usd,
            utilized_amount_usd: utilized,
            headroom_usd: limit.limit_amount_usd - utilized,
            utilization_pct: utilization,
            status: LimitStatus::classify(
                utilization,
                limit.inner_threshold_pct,
                limit.outer_threshold_pct,
            ),
        }
    }
}
