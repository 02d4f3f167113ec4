//! Row constructors with sensible defaults for every field a caller does not
//! name. The synthetic generator builds its tables from these, and tests use
//! them to assemble small scenarios.

use crate::core::ids::{CounterpartyId, FacilityId, LegalEntityId};
use crate::core::rating::{ExternalRating, Severity};
use crate::source::event::{
    AmendmentChangeDetail, AmendmentEvent, CounterpartyRatingObservation, FinancialMetric,
    FinancialMetricObservation, FlagScope, LimitDefinition, LimitScope, LimitUtilizationEvent,
    RatingType, RiskFlag,
};
use crate::source::reference::{
    Counterparty, FacilityCounterpartyParticipation, FacilityLenderAllocation, FacilityMaster,
    FacilityStatus, LegalEntity,
};
use crate::source::snapshot::{
    CollateralSnapshot, FacilityDelinquencySnapshot, FacilityExposureSnapshot,
    FacilityPricingSnapshot, FacilityProfitabilitySnapshot,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Calendar date shorthand; out-of-range input yields the epoch default.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

/// A line-of-business path: (L1, L2, desk).
pub type LobPath<'p> = (&'p str, &'p str, &'p str);

/// An active facility maturing well after the default reporting dates.
pub fn facility(id: &str, counterparty: &str, lob: LobPath<'_>, committed: Decimal) -> FacilityMaster {
    FacilityMaster {
        facility_id: FacilityId::new(id),
        counterparty_id: CounterpartyId::new(counterparty),
        facility_name: format!("{id} Facility"),
        facility_type: "Term Loan".to_string(),
        product_type: "Corporate Loan".to_string(),
        committed_facility_amt: committed,
        origination_date: date(2022, 1, 15),
        maturity_date: date(2028, 1, 15),
        facility_status: FacilityStatus::Active,
        lob_l1: lob.0.to_string(),
        lob_l2: lob.1.to_string(),
        lob_l3: lob.2.to_string(),
        region: "North America".to_string(),
        industry_code: "Manufacturing".to_string(),
        currency_code: "USD".to_string(),
        booking_legal_entity_id: LegalEntityId::new("LE-US"),
    }
}

pub fn counterparty(id: &str, internal_rating: u32, external: Option<ExternalRating>) -> Counterparty {
    Counterparty {
        counterparty_id: CounterpartyId::new(id),
        legal_name: format!("{id} Holdings"),
        internal_risk_rating: internal_rating,
        external_rating: external,
        pd: dec!(0.01),
        lgd: dec!(0.45),
        industry_code: "Manufacturing".to_string(),
        country_code: "US".to_string(),
    }
}

pub fn legal_entity(id: &str) -> LegalEntity {
    LegalEntity {
        legal_entity_id: LegalEntityId::new(id),
        legal_entity_name: format!("{id} Bank"),
        country_code: "US".to_string(),
    }
}

pub fn participation(facility: &str, counterparty: &str, pct: Decimal, is_primary: bool) -> FacilityCounterpartyParticipation {
    FacilityCounterpartyParticipation {
        participation_id: format!("PART-{facility}-{counterparty}"),
        facility_id: FacilityId::new(facility),
        counterparty_id: CounterpartyId::new(counterparty),
        role: if is_primary { "BORROWER" } else { "CO_BORROWER" }.to_string(),
        participation_pct: pct,
        is_primary,
    }
}

pub fn lender_allocation(facility: &str, legal_entity: &str, share: Decimal, amount: Decimal) -> FacilityLenderAllocation {
    FacilityLenderAllocation {
        allocation_id: format!("ALLOC-{facility}-{legal_entity}"),
        facility_id: FacilityId::new(facility),
        legal_entity_id: LegalEntityId::new(legal_entity),
        bank_share_pct: share,
        bank_commitment_amt: amount,
    }
}

/// Exposure snapshot with undrawn = gross − drawn, EAD = gross and RWA at
/// 75% of gross.
pub fn exposure(facility: &str, as_of: NaiveDate, gross: Decimal, drawn: Decimal) -> FacilityExposureSnapshot {
    FacilityExposureSnapshot {
        facility_id: FacilityId::new(facility),
        as_of_date: as_of,
        gross_exposure_usd: gross,
        drawn_amount: drawn,
        undrawn_amount: gross - drawn,
        ead_amount: gross,
        rwa_amount: gross * dec!(0.75),
    }
}

pub fn collateral(id: &str, facility: &str, as_of: NaiveDate, group: &str, allocated: Decimal) -> CollateralSnapshot {
    CollateralSnapshot {
        collateral_id: id.to_string(),
        facility_id: FacilityId::new(facility),
        as_of_date: as_of,
        mitigant_group: group.to_string(),
        mitigant_subtype: format!("{group} - General"),
        haircut_pct: dec!(0.2),
        allocated_amount_usd: allocated,
    }
}

/// Pricing snapshot with a 4.5% base rate and all-in = base + spread.
pub fn pricing(facility: &str, as_of: NaiveDate, spread_bps: Decimal) -> FacilityPricingSnapshot {
    let base = dec!(0.045);
    FacilityPricingSnapshot {
        facility_id: FacilityId::new(facility),
        as_of_date: as_of,
        spread_bps,
        base_rate_pct: base,
        all_in_rate_pct: base + spread_bps / dec!(10000),
        pricing_exception_flag: false,
        rate_floor_active_flag: false,
    }
}

pub fn delinquency(facility: &str, as_of: NaiveDate, days_past_due: u32) -> FacilityDelinquencySnapshot {
    let status = match days_past_due {
        0 => "Current",
        1..=29 => "1-29 DPD",
        30..=89 => "30-89 DPD",
        _ => "90+ DPD",
    };
    FacilityDelinquencySnapshot {
        facility_id: FacilityId::new(facility),
        as_of_date: as_of,
        days_past_due,
        delinquency_status: status.to_string(),
        overdue_principal_amt: Decimal::ZERO,
        overdue_interest_amt: Decimal::ZERO,
    }
}

pub fn profitability(facility: &str, as_of: NaiveDate, nii: Decimal, revenue: Decimal) -> FacilityProfitabilitySnapshot {
    FacilityProfitabilitySnapshot {
        facility_id: FacilityId::new(facility),
        as_of_date: as_of,
        net_interest_income_usd: nii,
        total_revenue_usd: revenue,
        operating_expense_usd: revenue * dec!(0.4),
        net_interest_margin_pct: dec!(0.025),
        return_on_assets_pct: dec!(0.012),
        return_on_equity_pct: dec!(0.11),
    }
}

pub fn amendment(id: &str, facility: &str, amendment_type: &str, identified: NaiveDate) -> AmendmentEvent {
    AmendmentEvent {
        amendment_id: id.to_string(),
        facility_id: FacilityId::new(facility),
        amendment_type: amendment_type.to_string(),
        amendment_status: "Identified".to_string(),
        identified_date: identified,
        effective_date: None,
    }
}

pub fn amendment_change(id: &str, amendment: &str, field: &str, old: &str, new: &str) -> AmendmentChangeDetail {
    AmendmentChangeDetail {
        change_detail_id: id.to_string(),
        amendment_id: amendment.to_string(),
        field_name: field.to_string(),
        old_value: Some(old.to_string()),
        new_value: Some(new.to_string()),
    }
}

pub fn rating_observation(
    counterparty: &str,
    as_of: NaiveDate,
    rating_type: RatingType,
    current: &str,
    prior: Option<&str>,
) -> CounterpartyRatingObservation {
    let kind = match rating_type {
        RatingType::Internal => "INT",
        RatingType::External => "EXT",
    };
    CounterpartyRatingObservation {
        observation_id: format!("RAT-{counterparty}-{kind}-{as_of}"),
        counterparty_id: CounterpartyId::new(counterparty),
        as_of_date: as_of,
        rating_type,
        rating_value: current.to_string(),
        prior_rating_value: prior.map(str::to_string),
    }
}

pub fn facility_flag(id: &str, facility: &str, code: &str, severity: Severity) -> RiskFlag {
    RiskFlag {
        flag_id: id.to_string(),
        scope: FlagScope::Facility,
        facility_id: Some(FacilityId::new(facility)),
        counterparty_id: None,
        flag_code: code.to_string(),
        severity,
        raised_date: date(2025, 1, 10),
    }
}

pub fn counterparty_flag(id: &str, counterparty: &str, code: &str, severity: Severity) -> RiskFlag {
    RiskFlag {
        flag_id: id.to_string(),
        scope: FlagScope::Counterparty,
        facility_id: None,
        counterparty_id: Some(CounterpartyId::new(counterparty)),
        flag_code: code.to_string(),
        severity,
        raised_date: date(2025, 1, 10),
    }
}

pub fn counterparty_limit(id: &str, counterparty: &str, amount: Decimal, inner: Decimal, outer: Decimal) -> LimitDefinition {
    LimitDefinition {
        limit_id: id.to_string(),
        scope: LimitScope::Counterparty,
        counterparty_id: Some(CounterpartyId::new(counterparty)),
        lob_l1: None,
        lob_l2: None,
        limit_amount_usd: amount,
        inner_threshold_pct: inner,
        outer_threshold_pct: outer,
    }
}

pub fn lob_limit(id: &str, lob_l2: &str, amount: Decimal, inner: Decimal, outer: Decimal) -> LimitDefinition {
    LimitDefinition {
        limit_id: id.to_string(),
        scope: LimitScope::LobL2,
        counterparty_id: None,
        lob_l1: None,
        lob_l2: Some(lob_l2.to_string()),
        limit_amount_usd: amount,
        inner_threshold_pct: inner,
        outer_threshold_pct: outer,
    }
}

pub fn limit_utilization(limit: &str, as_of: NaiveDate, utilized: Decimal) -> LimitUtilizationEvent {
    LimitUtilizationEvent {
        event_id: format!("LU-{limit}-{as_of}"),
        limit_id: limit.to_string(),
        as_of_date: as_of,
        utilized_amount_usd: utilized,
    }
}

pub fn facility_metric(facility: &str, metric: FinancialMetric, as_of: NaiveDate, value: Decimal) -> FinancialMetricObservation {
    FinancialMetricObservation {
        observation_id: format!("FM-{facility}-{metric:?}-{as_of}"),
        metric,
        facility_id: Some(FacilityId::new(facility)),
        counterparty_id: None,
        as_of_date: as_of,
        value,
    }
}

pub fn counterparty_metric(counterparty: &str, metric: FinancialMetric, as_of: NaiveDate, value: Decimal) -> FinancialMetricObservation {
    FinancialMetricObservation {
        observation_id: format!("FM-{counterparty}-{metric:?}-{as_of}"),
        metric,
        facility_id: None,
        counterparty_id: Some(CounterpartyId::new(counterparty)),
        as_of_date: as_of,
        value,
    }
}
