//! Irregular-cadence event tables: amendments, rating observations, risk
//! flags, limits and ad hoc financial metrics.

use crate::core::ids::{CounterpartyId, FacilityId};
use crate::core::rating::Severity;
use crate::source::index::Dated;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Risk flag codes the assembler turns into boolean presence flags.
pub mod flag_codes {
    pub const DETERIORATED: &str = "DETERIORATED";
    pub const CRITICIZED: &str = "CRITICIZED";
    pub const WATCH_LIST: &str = "WATCH_LIST";
    pub const COVENANT_BREACH: &str = "COVENANT_BREACH";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentEvent {
    pub amendment_id: String,
    pub facility_id: FacilityId,
    /// e.g. "Maturity Extension", "Pricing Change", "Covenant Waiver"
    pub amendment_type: String,
    /// e.g. "Identified", "In Progress", "Completed"
    pub amendment_status: String,
    pub identified_date: NaiveDate,
    pub effective_date: Option<NaiveDate>,
}

/// One field-level change belonging to an amendment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmendmentChangeDetail {
    pub change_detail_id: String,
    pub amendment_id: String,
    pub field_name: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingType {
    Internal,
    External,
}

/// A rating value observed for a counterparty on an as-of date, with the
/// value it replaced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyRatingObservation {
    pub observation_id: String,
    pub counterparty_id: CounterpartyId,
    pub as_of_date: NaiveDate,
    pub rating_type: RatingType,
    pub rating_value: String,
    pub prior_rating_value: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagScope {
    Facility,
    Counterparty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskFlag {
    pub flag_id: String,
    pub scope: FlagScope,
    pub facility_id: Option<FacilityId>,
    pub counterparty_id: Option<CounterpartyId>,
    pub flag_code: String,
    pub severity: Severity,
    pub raised_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LimitScope {
    Counterparty,
    LobL2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitDefinition {
    pub limit_id: String,
    pub scope: LimitScope,
    pub counterparty_id: Option<CounterpartyId>,
    /// L1 owning the L2 below. When absent the limit applies to the L2
    /// name under every L1.
    #[serde(default)]
    pub lob_l1: Option<String>,
    /// Name of the L2 line of business, for `LOB_L2` limits.
    pub lob_l2: Option<String>,
    pub limit_amount_usd: Decimal,
    /// Utilization fraction at which the limit enters `Warning`.
    pub inner_threshold_pct: Decimal,
    /// Utilization fraction at which the limit is in `Breach`.
    pub outer_threshold_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitUtilizationEvent {
    pub event_id: String,
    pub limit_id: String,
    pub as_of_date: NaiveDate,
    pub utilized_amount_usd: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinancialMetric {
    Dscr,
    Ltv,
    Fccr,
    Tnw,
}

/// A DSCR/LTV/FCCR reading for a facility or a TNW reading for a
/// counterparty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialMetricObservation {
    pub observation_id: String,
    pub metric: FinancialMetric,
    pub facility_id: Option<FacilityId>,
    pub counterparty_id: Option<CounterpartyId>,
    pub as_of_date: NaiveDate,
    pub value: Decimal,
}

impl Dated for CounterpartyRatingObservation {
    fn as_of_date(&self) -> NaiveDate {
        self.as_of_date
    }
}

impl Dated for LimitUtilizationEvent {
    fn as_of_date(&self) -> NaiveDate {
        self.as_of_date
    }
}

impl Dated for FinancialMetricObservation {
    fn as_of_date(&self) -> NaiveDate {
        self.as_of_date
    }
}
