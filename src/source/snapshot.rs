//! Month-end snapshot tables. Each row is one facility (or collateral item)
//! on one as-of date.

use crate::core::ids::FacilityId;
use crate::source::index::Dated;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityExposureSnapshot {
    pub facility_id: FacilityId,
    pub as_of_date: NaiveDate,
    pub gross_exposure_usd: Decimal,
    pub drawn_amount: Decimal,
    pub undrawn_amount: Decimal,
    pub ead_amount: Decimal,
    pub rwa_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralSnapshot {
    pub collateral_id: String,
    pub facility_id: FacilityId,
    pub as_of_date: NaiveDate,
    /// e.g. "Real Estate", "Cash", "Receivables"
    pub mitigant_group: String,
    pub mitigant_subtype: String,
    pub haircut_pct: Decimal,
    pub allocated_amount_usd: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityPricingSnapshot {
    pub facility_id: FacilityId,
    pub as_of_date: NaiveDate,
    pub spread_bps: Decimal,
    pub base_rate_pct: Decimal,
    pub all_in_rate_pct: Decimal,
    #[serde(default)]
    pub pricing_exception_flag: bool,
    #[serde(default)]
    pub rate_floor_active_flag: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityDelinquencySnapshot {
    pub facility_id: FacilityId,
    pub as_of_date: NaiveDate,
    pub days_past_due: u32,
    /// e.g. "Current", "30 DPD", "90+ DPD"
    pub delinquency_status: String,
    pub overdue_principal_amt: Decimal,
    pub overdue_interest_amt: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityProfitabilitySnapshot {
    pub facility_id: FacilityId,
    pub as_of_date: NaiveDate,
    pub net_interest_income_usd: Decimal,
    pub total_revenue_usd: Decimal,
    pub operating_expense_usd: Decimal,
    pub net_interest_margin_pct: Decimal,
    pub return_on_assets_pct: Decimal,
    pub return_on_equity_pct: Decimal,
}

macro_rules! dated {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Dated for $ty {
                fn as_of_date(&self) -> NaiveDate {
                    self.as_of_date
                }
            }
        )*
    };
}

dated!(
    FacilityExposureSnapshot,
    CollateralSnapshot,
    FacilityPricingSnapshot,
    FacilityDelinquencySnapshot,
    FacilityProfitabilitySnapshot,
);
