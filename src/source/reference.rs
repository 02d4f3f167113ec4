//! Slowly changing reference tables: facilities, counterparties, the
//! counterparty hierarchy, bank legal entities and the two allocation tables
//! that link them.

use crate::core::ids::{CounterpartyId, FacilityId, LegalEntityId};
use crate::core::rating::ExternalRating;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a facility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacilityStatus {
    #[default]
    Active,
    Matured,
    Closed,
}

impl fmt::Display for FacilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FacilityStatus::Active => "Active",
            FacilityStatus::Matured => "Matured",
            FacilityStatus::Closed => "Closed",
        };
        f.write_str(label)
    }
}

/// One credit facility and its position in the line-of-business tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityMaster {
    pub facility_id: FacilityId,
    pub counterparty_id: CounterpartyId,
    pub facility_name: String,
    /// e.g. "Revolving Credit", "Term Loan"
    pub facility_type: String,
    pub product_type: String,
    pub committed_facility_amt: Decimal,
    pub origination_date: NaiveDate,
    pub maturity_date: NaiveDate,
    pub facility_status: FacilityStatus,
    pub lob_l1: String,
    pub lob_l2: String,
    /// Desk.
    pub lob_l3: String,
    pub region: String,
    pub industry_code: String,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    pub booking_legal_entity_id: LegalEntityId,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counterparty {
    pub counterparty_id: CounterpartyId,
    pub legal_name: String,
    /// Internal grade, higher is worse.
    pub internal_risk_rating: u32,
    pub external_rating: Option<ExternalRating>,
    /// Probability of default, as a fraction.
    pub pd: Decimal,
    /// Loss given default, as a fraction.
    pub lgd: Decimal,
    pub industry_code: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterpartyHierarchy {
    pub counterparty_id: CounterpartyId,
    pub immediate_parent_id: Option<CounterpartyId>,
    pub ultimate_parent_id: CounterpartyId,
    pub ownership_pct: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegalEntity {
    pub legal_entity_id: LegalEntityId,
    pub legal_entity_name: String,
    pub country_code: String,
}

/// A counterparty's role and pro-rata share in a facility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityCounterpartyParticipation {
    pub participation_id: String,
    pub facility_id: FacilityId,
    pub counterparty_id: CounterpartyId,
    /// e.g. "BORROWER", "CO_BORROWER", "GUARANTOR"
    pub role: String,
    pub participation_pct: Decimal,
    pub is_primary: bool,
}

/// The bank-side share of a facility held by one legal entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityLenderAllocation {
    pub allocation_id: String,
    pub facility_id: FacilityId,
    pub legal_entity_id: LegalEntityId,
    pub bank_share_pct: Decimal,
    pub bank_commitment_amt: Decimal,
}
