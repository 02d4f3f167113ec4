use crate::error::PipelineError;
use crate::source::event::{
    AmendmentChangeDetail, AmendmentEvent, CounterpartyRatingObservation,
    FinancialMetricObservation, LimitDefinition, LimitUtilizationEvent, RiskFlag,
};
use crate::source::reference::{
    Counterparty, CounterpartyHierarchy, FacilityCounterpartyParticipation,
    FacilityLenderAllocation, FacilityMaster, LegalEntity,
};
use crate::source::snapshot::{
    CollateralSnapshot, FacilityDelinquencySnapshot, FacilityExposureSnapshot,
    FacilityPricingSnapshot, FacilityProfitabilitySnapshot,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Every input table of one run, held in memory.
///
/// Tables are immutable inputs to the assembler: nothing downstream mutates
/// them. Any table may be absent from the JSON document and is then empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceTables {
    pub facilities: Vec<FacilityMaster>,
    pub counterparties: Vec<Counterparty>,
    pub counterparty_hierarchy: Vec<CounterpartyHierarchy>,
    pub legal_entities: Vec<LegalEntity>,
    pub participations: Vec<FacilityCounterpartyParticipation>,
    pub lender_allocations: Vec<FacilityLenderAllocation>,

    pub exposure_snapshots: Vec<FacilityExposureSnapshot>,
    pub collateral_snapshots: Vec<CollateralSnapshot>,
    pub pricing_snapshots: Vec<FacilityPricingSnapshot>,
    pub delinquency_snapshots: Vec<FacilityDelinquencySnapshot>,
    pub profitability_snapshots: Vec<FacilityProfitabilitySnapshot>,

    pub amendments: Vec<AmendmentEvent>,
    pub amendment_changes: Vec<AmendmentChangeDetail>,
    pub rating_observations: Vec<CounterpartyRatingObservation>,
    pub risk_flags: Vec<RiskFlag>,
    pub limits: Vec<LimitDefinition>,
    pub limit_utilizations: Vec<LimitUtilizationEvent>,
    pub financial_metrics: Vec<FinancialMetricObservation>,
}

impl SourceTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load all tables from one JSON document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|source| PipelineError::Read {
            path: display.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| PipelineError::Parse {
            path: display,
            source,
        })
    }

    /// Total rows across every table.
    pub fn row_count(&self) -> usize {
        self.facilities.len()
            + self.counterparties.len()
            + self.counterparty_hierarchy.len()
            + self.legal_entities.len()
            + self.participations.len()
            + self.lender_allocations.len()
            + self.exposure_snapshots.len()
            + self.collateral_snapshots.len()
            + self.pricing_snapshots.len()
            + self.delinquency_snapshots.len()
            + self.profitability_snapshots.len()
            + self.amendments.len()
            + self.amendment_changes.len()
            + self.rating_observations.len()
            + self.risk_flags.len()
            + self.limits.len()
            + self.limit_utilizations.len()
            + self.financial_metrics.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tables_default_to_empty() {
        let json = r#"{
            "legal_entities": [
                { "legal_entity_id": "LE-US", "legal_entity_name": "Bank NA", "country_code": "US" }
            ]
        }"#;
        let tables: SourceTables = serde_json::from_str(json).unwrap();
        assert_eq!(tables.legal_entities.len(), 1);
        assert!(tables.facilities.is_empty());
        assert_eq!(tables.row_count(), 1);
    }

    #[test]
    fn test_rows_parse_with_string_amounts() {
        let json = r#"{
            "facilities": [{
                "facility_id": "FAC-1", "counterparty_id": "CP-1",
                "facility_name": "Acme Revolver", "facility_type": "Revolving Credit",
                "product_type": "Corporate Loan", "committed_facility_amt": "1000000",
                "origination_date": "2022-01-15", "maturity_date": "2027-01-15",
                "facility_status": "Active", "lob_l1": "Corporate Banking",
                "lob_l2": "Large Corporate", "lob_l3": "Industrials Desk",
                "region": "North America", "industry_code": "Manufacturing",
                "booking_legal_entity_id": "LE-US"
            }],
            "counterparties": [{
                "counterparty_id": "CP-1", "legal_name": "Acme Corp",
                "internal_risk_rating": 4, "external_rating": "BBB",
                "pd": "0.012", "lgd": 0.45, "industry_code": "Manufacturing",
                "country_code": "US"
            }]
        }"#;
        let tables: SourceTables = serde_json::from_str(json).unwrap();
        assert_eq!(tables.facilities[0].currency_code, "USD");
        assert_eq!(tables.counterparties[0].pd.to_string(), "0.012");
    }
}
