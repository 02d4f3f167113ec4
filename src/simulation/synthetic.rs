//! Deterministic synthetic source tables.
//!
//! Every row is a pure function of its index: the same configuration and
//! calendar always produce the same tables. Patterns are chosen so a default
//! run contains syndicated, cross-entity, amended, delinquent, flagged,
//! limit-breaching and matured facilities, and passes validation cleanly.

use crate::config::ReportingCalendar;
use crate::core::ids::CounterpartyId;
use crate::core::rating::{ExternalRating, Severity};
use crate::simulation::fixtures::{
    amendment, amendment_change, collateral, counterparty, counterparty_flag, counterparty_limit,
    counterparty_metric, date, delinquency, exposure, facility, facility_flag, facility_metric,
    lender_allocation, legal_entity, limit_utilization, lob_limit, participation, pricing,
    profitability, rating_observation, LobPath,
};
use crate::source::event::{flag_codes, FinancialMetric, RatingType};
use crate::source::reference::{CounterpartyHierarchy, FacilityStatus};
use crate::source::tables::SourceTables;
use chrono::Days;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const LOB_PATHS: [LobPath<'static>; 6] = [
    ("Corporate Banking", "Large Corporate", "Industrials Desk"),
    ("Corporate Banking", "Large Corporate", "Energy Desk"),
    ("Corporate Banking", "Mid Market", "Regional Desk"),
    ("Commercial Real Estate", "Income Property", "Office Desk"),
    ("Commercial Real Estate", "Construction", "Development Desk"),
    ("Global Markets", "Leveraged Finance", "Sponsor Desk"),
];

const REGIONS: [&str; 4] = ["North America", "EMEA", "APAC", "LATAM"];
const INDUSTRIES: [&str; 5] = ["Manufacturing", "Energy", "Real Estate", "Technology", "Healthcare"];
const LEGAL_ENTITIES: [&str; 3] = ["LE-US", "LE-UK", "LE-SG"];
const MITIGANT_GROUPS: [&str; 4] = ["Real Estate", "Cash", "Receivables", "Equipment"];
const AMENDMENT_TYPES: [(&str, &str); 3] = [
    ("Maturity Extension", "maturity_date"),
    ("Pricing Change", "spread_bps"),
    ("Covenant Waiver", "dscr_covenant"),
];
const DAYS_PAST_DUE: [u32; 7] = [0, 0, 0, 0, 15, 45, 95];
const EXTERNAL_SCALE: [ExternalRating; 7] = [
    ExternalRating::Ccc,
    ExternalRating::B,
    ExternalRating::Bb,
    ExternalRating::Bbb,
    ExternalRating::A,
    ExternalRating::Aa,
    ExternalRating::Aaa,
];

/// Size of a synthetic portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticConfig {
    pub facility_count: usize,
    pub counterparty_count: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            facility_count: 60,
            counterparty_count: 18,
        }
    }
}

pub fn facility_id(index: usize) -> String {
    format!("FAC-{index:05}")
}

pub fn counterparty_id(index: usize) -> String {
    format!("CP-{index:04}")
}

/// Build a complete, referentially consistent set of source tables.
pub fn generate_sources(config: &SyntheticConfig, calendar: &ReportingCalendar) -> SourceTables {
    let counterparty_count = config.counterparty_count.max(1);
    let mut tables = SourceTables::new();

    for id in LEGAL_ENTITIES {
        tables.legal_entities.push(legal_entity(id));
    }
    for i in 0..counterparty_count {
        add_counterparty(&mut tables, i, calendar);
    }
    for (k, (_, lob_l2, _)) in distinct_lob_l2().into_iter().enumerate() {
        let limit_id = format!("LIM-L2-{k:02}");
        let amount = Decimal::from(250_000_000u64 * (k as u64 + 1));
        tables.limits.push(lob_limit(&limit_id, lob_l2, amount, dec!(0.8), dec!(0.95)));
        // Odd groups report no utilization and fall back to their exposure
        if k % 2 == 0 {
            let utilized = amount * Decimal::new(60 + 15 * k as i64, 2);
            tables.limit_utilizations.push(limit_utilization(&limit_id, calendar.as_of_date, utilized));
        }
    }
    for j in 0..config.facility_count {
        add_facility(&mut tables, j, counterparty_count, calendar);
    }
    tables
}

fn distinct_lob_l2() -> Vec<LobPath<'static>> {
    let mut out: Vec<LobPath<'static>> = Vec::new();
    for path in LOB_PATHS {
        if !out.iter().any(|p| p.0 == path.0 && p.1 == path.1) {
            out.push(path);
        }
    }
    out
}

fn add_counterparty(tables: &mut SourceTables, i: usize, calendar: &ReportingCalendar) {
    let id = counterparty_id(i);
    let internal = 1 + (i % 10) as u32;
    let external = EXTERNAL_SCALE[i % EXTERNAL_SCALE.len()];

    let mut row = counterparty(&id, internal, Some(external));
    row.pd = Decimal::new(25 * (1 + (i % 10) as i64), 4);
    row.lgd = Decimal::new(35 + 5 * (i % 5) as i64, 2);
    row.industry_code = INDUSTRIES[i % INDUSTRIES.len()].to_string();
    tables.counterparties.push(row);

    let parent = (i / 4) * 4;
    tables.counterparty_hierarchy.push(CounterpartyHierarchy {
        counterparty_id: CounterpartyId::new(&id),
        immediate_parent_id: (parent != i).then(|| CounterpartyId::new(counterparty_id(parent))),
        ultimate_parent_id: CounterpartyId::new(counterparty_id(parent)),
        ownership_pct: if parent == i { Decimal::ONE } else { dec!(0.75) },
    });

    // Every fifth counterparty was one notch better last month
    let prior_internal = if i % 5 == 0 && internal > 1 { internal - 1 } else { internal };
    tables.rating_observations.push(rating_observation(
        &id,
        calendar.as_of_date,
        RatingType::Internal,
        &internal.to_string(),
        Some(&prior_internal.to_string()),
    ));
    let prior_external = if i % 7 == 3 {
        EXTERNAL_SCALE[(i % EXTERNAL_SCALE.len() + 1).min(EXTERNAL_SCALE.len() - 1)]
    } else {
        external
    };
    tables.rating_observations.push(rating_observation(
        &id,
        calendar.as_of_date,
        RatingType::External,
        external.as_str(),
        Some(prior_external.as_str()),
    ));

    if i % 6 == 2 {
        tables.risk_flags.push(counterparty_flag(
            &format!("FLG-{id}-CRIT"),
            &id,
            flag_codes::CRITICIZED,
            Severity::High,
        ));
    }
    if i % 9 == 4 {
        tables.risk_flags.push(counterparty_flag(
            &format!("FLG-{id}-COV"),
            &id,
            flag_codes::COVENANT_BREACH,
            Severity::Critical,
        ));
    }

    let limit_id = format!("LIM-{id}");
    tables.limits.push(counterparty_limit(&limit_id, &id, dec!(20000000), dec!(0.8), dec!(0.95)));
    let utilized = dec!(20000000) * Decimal::new(50 + 5 * (i % 10) as i64, 2);
    tables.limit_utilizations.push(limit_utilization(&limit_id, calendar.prior_month_date, utilized * dec!(0.9)));
    tables.limit_utilizations.push(limit_utilization(&limit_id, calendar.as_of_date, utilized));

    if i % 2 == 0 {
        let tnw = Decimal::from(50_000_000u64 * (1 + (i % 3) as u64));
        tables.financial_metrics.push(counterparty_metric(&id, FinancialMetric::Tnw, calendar.as_of_date, tnw));
    }
}

fn add_facility(tables: &mut SourceTables, j: usize, counterparty_count: usize, calendar: &ReportingCalendar) {
    let id = facility_id(j);
    let cp = counterparty_id(j % counterparty_count);
    let as_of = calendar.as_of_date;
    let prior = calendar.prior_month_date;
    let booking = LEGAL_ENTITIES[j % LEGAL_ENTITIES.len()];

    let committed = Decimal::from(1_000_000u64 * (1 + (j % 9) as u64));
    let mut master = facility(&id, &cp, LOB_PATHS[j % LOB_PATHS.len()], committed);
    master.region = REGIONS[j % REGIONS.len()].to_string();
    master.industry_code = INDUSTRIES[j % INDUSTRIES.len()].to_string();
    master.booking_legal_entity_id = booking.into();
    master.origination_date = date(2020 + (j % 4) as i32, 1 + (j % 12) as u32, 15);
    master.maturity_date = date(2026 + (j % 5) as i32, 1 + (j % 12) as u32, 15);
    if j % 10 == 9 {
        master.facility_status = FacilityStatus::Matured;
        master.maturity_date = date(2024, 6, 30);
    }
    tables.facilities.push(master);

    // Participation: every fourth facility is syndicated with the next counterparty
    let syndicated = j % 4 == 0 && counterparty_count > 1;
    let primary_share = if syndicated { dec!(0.6) } else { Decimal::ONE };
    tables.participations.push(participation(&id, &cp, primary_share, true));
    if syndicated {
        let co_borrower = counterparty_id((j + 1) % counterparty_count);
        tables.participations.push(participation(&id, &co_borrower, dec!(0.4), false));
    }

    // Lending: every fifth facility is split across two legal entities
    if j % 5 == 0 {
        let other = LEGAL_ENTITIES[(j + 1) % LEGAL_ENTITIES.len()];
        tables.lender_allocations.push(lender_allocation(&id, booking, dec!(0.7), committed * dec!(0.7)));
        tables.lender_allocations.push(lender_allocation(&id, other, dec!(0.3), committed * dec!(0.3)));
    } else {
        tables.lender_allocations.push(lender_allocation(&id, booking, Decimal::ONE, committed));
    }

    // Exposure moves up, sideways or down month over month
    let gross = committed * Decimal::new(50 + 10 * (j % 5) as i64, 2);
    let prior_factor = [dec!(0.95), Decimal::ONE, dec!(1.05)][j % 3];
    tables.exposure_snapshots.push(exposure(&id, prior, gross * prior_factor, gross * prior_factor * dec!(0.8)));
    tables.exposure_snapshots.push(exposure(&id, as_of, gross, gross * dec!(0.8)));

    if j % 3 != 2 {
        let group = MITIGANT_GROUPS[j % MITIGANT_GROUPS.len()];
        let collateral_id = format!("COL-{j:05}-A");
        tables.collateral_snapshots.push(collateral(&collateral_id, &id, prior, group, gross * dec!(0.35)));
        tables.collateral_snapshots.push(collateral(&collateral_id, &id, as_of, group, gross * dec!(0.4)));
        if j % 6 == 0 {
            let extra = format!("COL-{j:05}-B");
            tables.collateral_snapshots.push(collateral(&extra, &id, as_of, "Cash", gross * dec!(0.1)));
        }
    }

    let spread = Decimal::from(150 + 25 * (j % 8) as u64);
    tables.pricing_snapshots.push(pricing(&id, prior, spread - Decimal::from(10 * (j % 3) as u64)));
    let mut current_pricing = pricing(&id, as_of, spread);
    current_pricing.pricing_exception_flag = j % 11 == 0;
    current_pricing.rate_floor_active_flag = j % 7 == 1;
    tables.pricing_snapshots.push(current_pricing);

    let days_past_due = DAYS_PAST_DUE[j % DAYS_PAST_DUE.len()];
    let mut arrears = delinquency(&id, as_of, days_past_due);
    if days_past_due > 0 {
        arrears.overdue_principal_amt = gross * dec!(0.01);
        arrears.overdue_interest_amt = gross * dec!(0.002);
    }
    tables.delinquency_snapshots.push(arrears);

    tables
        .profitability_snapshots
        .push(profitability(&id, as_of, committed * dec!(0.02), committed * dec!(0.03)));

    if j % 6 == 1 {
        let amendment_id = format!("AMD-{j:05}");
        let (kind, field) = AMENDMENT_TYPES[j % AMENDMENT_TYPES.len()];
        let identified = calendar
            .today
            .checked_sub_days(Days::new((j % 30) as u64))
            .unwrap_or(calendar.today);
        tables.amendments.push(amendment(&amendment_id, &id, kind, identified));
        tables.amendment_changes.push(amendment_change(
            &format!("CHG-{j:05}-1"),
            &amendment_id,
            field,
            "original",
            "amended",
        ));
    }

    if j % 7 == 3 {
        tables.risk_flags.push(facility_flag(
            &format!("FLG-{id}-DET"),
            &id,
            flag_codes::DETERIORATED,
            Severity::High,
        ));
    }
    if j % 13 == 5 {
        tables.risk_flags.push(facility_flag(
            &format!("FLG-{id}-WL"),
            &id,
            flag_codes::WATCH_LIST,
            Severity::Medium,
        ));
    }

    if j % 2 == 0 {
        let dscr = dec!(1.1) + Decimal::new((j % 8) as i64, 1);
        tables.financial_metrics.push(facility_metric(&id, FinancialMetric::Dscr, as_of, dscr));
    }
    if j % 3 == 0 {
        let ltv = dec!(0.5) + Decimal::new(5 * (j % 6) as i64, 2);
        tables.financial_metrics.push(facility_metric(&id, FinancialMetric::Ltv, as_of, ltv));
    }
    if j % 4 == 0 {
        tables.financial_metrics.push(facility_metric(&id, FinancialMetric::Fccr, as_of, dec!(1.25)));
    }
}
