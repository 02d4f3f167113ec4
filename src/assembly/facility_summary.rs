use crate::assembly::limits::LimitStatus;
use crate::core::ids::{CounterpartyId, FacilityId, LegalEntityId};
use crate::core::rating::{ExternalRating, Severity};
use crate::source::reference::FacilityStatus;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Month-over-month direction of a facility's gross exposure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExposureTrend {
    Up,
    Down,
    #[default]
    Flat,
}

impl ExposureTrend {
    /// Moves beyond ±2% count as a trend.
    pub const THRESHOLD: Decimal = dec!(0.02);

    pub fn from_change(change_pct: Decimal) -> Self {
        if change_pct > Self::THRESHOLD {
            ExposureTrend::Up
        } else if change_pct < -Self::THRESHOLD {
            ExposureTrend::Down
        } else {
            ExposureTrend::Flat
        }
    }
}

impl fmt::Display for ExposureTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExposureTrend::Up => "UP",
            ExposureTrend::Down => "DOWN",
            ExposureTrend::Flat => "FLAT",
        };
        f.write_str(label)
    }
}

/// One denormalized row per facility at the current as-of date.
///
/// Combines the facility's reference data with the snapshot and event rows
/// that relate to it, plus derived ratios and status flags. Ratios are
/// fractions (0.25 = 25%). Fields backed by a missing relation hold zero,
/// an empty value or `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilitySummary {
    // Identity
    pub facility_id: FacilityId,
    pub facility_name: String,
    pub counterparty_id: CounterpartyId,
    pub counterparty_name: String,
    pub ultimate_parent_id: Option<CounterpartyId>,
    pub facility_type: String,
    pub product_type: String,
    pub facility_status: FacilityStatus,
    pub lob_l1: String,
    pub lob_l2: String,
    pub lob_l3: String,
    pub region: String,
    pub industry_code: String,
    pub currency_code: String,
    pub booking_legal_entity_id: LegalEntityId,
    pub as_of_date: NaiveDate,
    pub origination_date: NaiveDate,
    pub maturity_date: NaiveDate,

    // Exposure
    pub committed_amount_usd: Decimal,
    pub outstanding_exposure_usd: Decimal,
    pub prior_outstanding_exposure_usd: Decimal,
    pub utilized_amount_usd: Decimal,
    pub undrawn_amount_usd: Decimal,
    pub ead_usd: Decimal,
    pub rwa_usd: Decimal,
    pub utilization_pct: Decimal,
    pub exposure_change_pct: Decimal,
    pub exposure_trend_direction: ExposureTrend,

    // Credit quality
    pub internal_risk_rating: Option<u32>,
    pub prior_internal_risk_rating: Option<u32>,
    pub external_rating: Option<ExternalRating>,
    pub prior_external_rating: Option<ExternalRating>,
    pub pd: Decimal,
    pub lgd: Decimal,
    pub expected_loss_usd: Decimal,
    pub has_internal_downgrade: bool,
    pub has_external_downgrade: bool,
    pub has_any_downgrade: bool,

    // Collateral
    pub risk_mitigant_amount_usd: Decimal,
    pub coverage_ratio_pct: Decimal,
    pub collateral_count: usize,
    pub primary_mitigant_group: Option<String>,

    // Pricing
    pub spread_bps: Decimal,
    pub base_rate_pct: Decimal,
    pub all_in_rate_pct: Decimal,
    pub has_pricing_exception: bool,
    pub has_rate_floor: bool,

    // Delinquency
    pub days_past_due: u32,
    pub delinquency_status: String,
    pub is_delinquent: bool,
    pub overdue_amount_usd: Decimal,

    // Profitability
    pub net_interest_income_usd: Decimal,
    pub total_revenue_usd: Decimal,
    pub operating_expense_usd: Decimal,
    pub nim_pct: Decimal,
    pub roa_pct: Decimal,
    pub roe_pct: Decimal,

    // Syndication and lending entities
    pub participating_counterparty_ids: Vec<CounterpartyId>,
    pub is_syndicated: bool,
    pub lender_legal_entity_ids: Vec<LegalEntityId>,
    pub bank_share_pct: Decimal,
    pub is_cross_entity: bool,

    // Amendments
    pub amendment_count: usize,
    pub has_amendment: bool,
    pub latest_amendment_type: Option<String>,
    pub latest_amendment_status: Option<String>,
    pub amended_fields: Vec<String>,
    pub amendment_aging_days: Option<i64>,

    // Risk flags
    pub risk_flag_codes: Vec<String>,
    pub is_deteriorated: bool,
    pub is_criticized: bool,
    pub is_watch_list: bool,
    pub has_covenant_breach: bool,
    pub highest_flag_severity: Option<Severity>,

    // Counterparty limit
    pub counterparty_limit_amount_usd: Option<Decimal>,
    pub counterparty_limit_utilized_usd: Option<Decimal>,
    pub counterparty_limit_utilization_pct: Option<Decimal>,
    pub counterparty_limit_status: Option<LimitStatus>,

    // Financial metrics
    pub dscr: Option<Decimal>,
    pub ltv: Option<Decimal>,
    pub fccr: Option<Decimal>,
    pub tnw_usd: Option<Decimal>,

    // Lifecycle
    pub days_remaining: i64,
    pub tenor_months: i64,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_thresholds() {
        assert_eq!(ExposureTrend::from_change(dec!(0.021)), ExposureTrend::Up);
        assert_eq!(ExposureTrend::from_change(dec!(0.02)), ExposureTrend::Flat);
        assert_eq!(ExposureTrend::from_change(dec!(-0.02)), ExposureTrend::Flat);
        assert_eq!(ExposureTrend::from_change(dec!(-0.05)), ExposureTrend::Down);
    }

    #[test]
    fn test_trend_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&ExposureTrend::Down).unwrap(), "\"DOWN\"");
    }
}
