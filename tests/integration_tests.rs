use facility_rollup::assembly::assembler::FacilitySummaryAssembler;
use facility_rollup::assembly::facility_summary::ExposureTrend;
use facility_rollup::assembly::limits::LimitStatus;
use facility_rollup::config::{PipelineConfig, ReportingCalendar};
use facility_rollup::core::rating::{ExternalRating, Severity};
use facility_rollup::pipeline::run_pipeline;
use facility_rollup::rollup::assembler::RollupAssembler;
use facility_rollup::simulation::fixtures::*;
use facility_rollup::simulation::synthetic::{generate_sources, SyntheticConfig};
use facility_rollup::source::event::{flag_codes, FinancialMetric, RatingType};
use facility_rollup::source::tables::SourceTables;
use facility_rollup::validation::report::IssueCategory;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const INDUSTRIALS: LobPath<'static> = ("Corporate Banking", "Large Corporate", "Industrials Desk");
const ENERGY: LobPath<'static> = ("Corporate Banking", "Large Corporate", "Energy Desk");
const OFFICE: LobPath<'static> = ("Commercial Real Estate", "Income Property", "Office Desk");

/// A three-facility book covering the scenarios risk officers ask about:
/// a syndicated, downgraded, breaching borrower; a plain facility on the
/// same desk; and a matured real-estate loan with no current snapshots.
fn portfolio() -> SourceTables {
    let as_of = date(2025, 1, 31);
    let prior = date(2024, 12, 31);
    let mut t = SourceTables::new();

    t.legal_entities.push(legal_entity("LE-US"));
    t.legal_entities.push(legal_entity("LE-UK"));
    t.counterparties.push(counterparty("CP-ACME", 6, Some(ExternalRating::Bb)));
    t.counterparties.push(counterparty("CP-BETA", 3, Some(ExternalRating::A)));
    t.counterparties.push(counterparty("CP-GAMMA", 5, None));
    t.counterparties.push(counterparty("CP-DELTA", 4, None));
    t.counterparties.push(counterparty("CP-OMEGA", 4, None));

    // Syndicated revolver for ACME
    t.facilities.push(facility("FAC-1", "CP-ACME", INDUSTRIALS, dec!(1000)));
    t.participations.push(participation("FAC-1", "CP-ACME", dec!(0.5), true));
    t.participations.push(participation("FAC-1", "CP-DELTA", dec!(0.3), false));
    t.participations.push(participation("FAC-1", "CP-OMEGA", dec!(0.2), false));
    t.lender_allocations.push(lender_allocation("FAC-1", "LE-US", dec!(0.6), dec!(600)));
    t.lender_allocations.push(lender_allocation("FAC-1", "LE-UK", dec!(0.4), dec!(400)));
    t.exposure_snapshots.push(exposure("FAC-1", prior, dec!(500), dec!(400)));
    t.exposure_snapshots.push(exposure("FAC-1", as_of, dec!(600), dec!(450)));
    t.collateral_snapshots.push(collateral("COL-1", "FAC-1", as_of, "Real Estate", dec!(240)));
    t.collateral_snapshots.push(collateral("COL-2", "FAC-1", as_of, "Cash", dec!(60)));
    t.pricing_snapshots.push(pricing("FAC-1", prior, dec!(150)));
    t.pricing_snapshots.push(pricing("FAC-1", as_of, dec!(150)));
    t.delinquency_snapshots.push(delinquency("FAC-1", as_of, 35));
    t.amendments.push(amendment("AMD-1", "FAC-1", "Pricing Change", date(2025, 1, 21)));
    t.amendment_changes.push(amendment_change("CHG-1", "AMD-1", "spread_bps", "125", "150"));
    t.rating_observations.push(rating_observation("CP-ACME", as_of, RatingType::Internal, "6", Some("4")));
    t.rating_observations.push(rating_observation("CP-ACME", as_of, RatingType::External, "BB", Some("BBB")));
    t.risk_flags.push(counterparty_flag("FLG-1", "CP-ACME", flag_codes::WATCH_LIST, Severity::Medium));
    t.risk_flags.push(facility_flag("FLG-2", "FAC-1", flag_codes::DETERIORATED, Severity::High));
    t.limits.push(counterparty_limit("LIM-ACME", "CP-ACME", dec!(1000), dec!(0.8), dec!(0.95)));
    t.limit_utilizations.push(limit_utilization("LIM-ACME", as_of, dec!(960)));
    t.financial_metrics.push(facility_metric("FAC-1", FinancialMetric::Dscr, as_of, dec!(1.35)));
    t.financial_metrics.push(counterparty_metric("CP-ACME", FinancialMetric::Tnw, as_of, dec!(5000000)));

    // Plain term loan on the same desk
    t.facilities.push(facility("FAC-2", "CP-BETA", INDUSTRIALS, dec!(2000)));
    t.participations.push(participation("FAC-2", "CP-BETA", Decimal::ONE, true));
    t.lender_allocations.push(lender_allocation("FAC-2", "LE-US", Decimal::ONE, dec!(2000)));
    t.exposure_snapshots.push(exposure("FAC-2", prior, dec!(1800), dec!(1500)));
    t.exposure_snapshots.push(exposure("FAC-2", as_of, dec!(1800), dec!(1500)));
    t.pricing_snapshots.push(pricing("FAC-2", prior, dec!(300)));
    t.pricing_snapshots.push(pricing("FAC-2", as_of, dec!(250)));

    // Energy desk facility, same L2
    t.facilities.push(facility("FAC-3", "CP-GAMMA", ENERGY, dec!(500)));
    t.exposure_snapshots.push(exposure("FAC-3", as_of, dec!(400), dec!(300)));
    t.pricing_snapshots.push(pricing("FAC-3", as_of, dec!(200)));

    // Matured real-estate loan with nothing reported
    let mut matured = facility("FAC-4", "CP-GAMMA", OFFICE, dec!(750));
    matured.facility_status = facility_rollup::source::reference::FacilityStatus::Matured;
    matured.maturity_date = date(2024, 9, 30);
    t.facilities.push(matured);

    t
}

#[test]
fn syndicated_breaching_facility_end_to_end() {
    let tables = portfolio();
    let rows = FacilitySummaryAssembler::new(&tables, ReportingCalendar::default()).assemble();
    let acme = &rows[0];

    assert_eq!(acme.facility_id.as_str(), "FAC-1");
    assert_eq!(acme.counterparty_name, "CP-ACME Holdings");
    assert_eq!(acme.outstanding_exposure_usd, dec!(600));
    assert_eq!(acme.utilization_pct, dec!(0.45));
    assert_eq!(acme.exposure_change_pct, dec!(0.2));
    assert_eq!(acme.exposure_trend_direction, ExposureTrend::Up);
    assert_eq!(acme.risk_mitigant_amount_usd, dec!(300));
    assert_eq!(acme.coverage_ratio_pct, dec!(0.5));
    assert_eq!(acme.collateral_count, 2);
    assert_eq!(acme.primary_mitigant_group.as_deref(), Some("Real Estate"));
    // PD 0.01 × LGD 0.45 × EAD 600
    assert_eq!(acme.expected_loss_usd, dec!(2.7));

    assert!(acme.is_syndicated);
    assert_eq!(acme.participating_counterparty_ids.len(), 3);
    assert!(acme.is_cross_entity);
    assert_eq!(acme.bank_share_pct, Decimal::ONE);

    assert!(acme.has_internal_downgrade);
    assert!(acme.has_external_downgrade);
    assert!(acme.has_any_downgrade);
    assert!(acme.is_deteriorated);
    assert!(acme.is_watch_list);
    assert!(!acme.is_criticized);
    assert_eq!(acme.highest_flag_severity, Some(Severity::High));

    assert_eq!(acme.counterparty_limit_status, Some(LimitStatus::Breach));
    assert_eq!(acme.counterparty_limit_utilization_pct, Some(dec!(0.96)));

    assert!(acme.is_delinquent);
    assert!(acme.has_amendment);
    assert_eq!(acme.amended_fields, vec!["spread_bps".to_string()]);
    assert_eq!(acme.amendment_aging_days, Some(-10));
    assert_eq!(acme.dscr, Some(dec!(1.35)));
    assert_eq!(acme.tnw_usd, Some(dec!(5000000)));
    assert_eq!(acme.ltv, None);
}

#[test]
fn facility_without_snapshots_is_zeroed_not_dropped() {
    let tables = portfolio();
    let rows = FacilitySummaryAssembler::new(&tables, ReportingCalendar::default()).assemble();
    assert_eq!(rows.len(), 4);

    let matured = &rows[3];
    assert_eq!(matured.outstanding_exposure_usd, Decimal::ZERO);
    assert_eq!(matured.utilization_pct, Decimal::ZERO);
    assert_eq!(matured.coverage_ratio_pct, Decimal::ZERO);
    assert_eq!(matured.exposure_trend_direction, ExposureTrend::Flat);
    assert!(!matured.is_active);
    assert!(!matured.is_syndicated);
    assert_eq!(matured.counterparty_limit_status, None);
    assert_eq!(matured.amendment_aging_days, None);
}

#[test]
fn desk_and_lob_rollups() {
    let tables = portfolio();
    let calendar = ReportingCalendar::default();
    let rows = FacilitySummaryAssembler::new(&tables, calendar).assemble();
    let output = RollupAssembler::new(&tables, calendar).assemble(&rows);

    let desks: Vec<&str> = output.desks.iter().map(|d| d.lob_l3.as_str()).collect();
    assert_eq!(desks, vec!["Industrials Desk", "Energy Desk", "Office Desk"]);

    let industrials = &output.desks[0].metrics;
    assert_eq!(industrials.facility_count, 2);
    assert_eq!(industrials.total_exposure_usd, dec!(2400));
    assert_eq!(industrials.total_committed_usd, dec!(3000));
    // (600 × 150 + 1800 × 250) / 2400
    assert_eq!(industrials.avg_spread_bps, dec!(225));
    assert_eq!(industrials.delinquent_count, 1);
    assert_eq!(industrials.syndicated_count, 1);
    // Only FAC-1 reports DSCR
    assert_eq!(industrials.avg_dscr, Some(dec!(1.35)));

    let large_corporate = &output.lob_l2[0];
    assert_eq!(large_corporate.desk_count, 2);
    assert_eq!(large_corporate.metrics.total_exposure_usd, dec!(2800));
    assert_eq!(large_corporate.desk_range.top_desk.as_deref(), Some("Industrials Desk"));
    assert_eq!(large_corporate.desk_range.bottom_desk.as_deref(), Some("Energy Desk"));
    // CP-GAMMA books in both Large Corporate and Income Property
    assert_eq!(large_corporate.interconnected_counterparty_count, 1);

    assert_eq!(output.lob_l1.len(), 2);
    assert_eq!(output.lob_l1[0].lob_l2_count, 1);
    assert_eq!(output.lob_l1[1].metrics.total_exposure_usd, Decimal::ZERO);
}

#[test]
fn pipeline_reports_but_does_not_block_on_issues() {
    let mut tables = portfolio();
    // A participation pointing at an unknown counterparty
    tables.participations.push(participation("FAC-3", "CP-GHOST", Decimal::ONE, true));
    let output = run_pipeline(&tables, &PipelineConfig::default());

    assert_eq!(output.facilities.len(), 4);
    assert_eq!(output.validation.count(IssueCategory::ReferentialIntegrity), 1);
    assert_eq!(output.validation.count(IssueCategory::RatioMismatch), 0);
    assert_eq!(output.validation.count(IssueCategory::RollupConservation), 0);
}

#[test]
fn portfolio_validates_cleanly() {
    let tables = portfolio();
    let output = run_pipeline(&tables, &PipelineConfig::default());
    assert!(output.validation.is_clean(), "{}", output.validation);
}

#[test]
fn source_tables_load_from_json() {
    let tables = portfolio();
    let json = serde_json::to_string(&tables).unwrap();
    let reloaded: SourceTables = serde_json::from_str(&json).unwrap();
    let calendar = ReportingCalendar::default();

    let original = FacilitySummaryAssembler::new(&tables, calendar).assemble();
    let roundtrip = FacilitySummaryAssembler::new(&reloaded, calendar).assemble();
    assert_eq!(
        serde_json::to_value(&original).unwrap(),
        serde_json::to_value(&roundtrip).unwrap()
    );
}

#[test]
fn later_reporting_date_picks_latest_prior_snapshot() {
    let tables = portfolio();
    // No snapshots exist for mid-February; January's rows stand in.
    let calendar = ReportingCalendar::new(date(2025, 2, 14), date(2025, 1, 31), date(2025, 2, 14));
    let rows = FacilitySummaryAssembler::new(&tables, calendar).assemble();
    assert_eq!(rows[0].outstanding_exposure_usd, dec!(600));
    assert_eq!(rows[0].exposure_change_pct, Decimal::ZERO);
}

#[test]
fn earlier_reporting_date_ignores_future_snapshots() {
    let tables = portfolio();
    let calendar = ReportingCalendar::new(date(2024, 12, 31), date(2024, 11, 30), date(2024, 12, 31));
    let rows = FacilitySummaryAssembler::new(&tables, calendar).assemble();
    assert_eq!(rows[0].outstanding_exposure_usd, dec!(500));
    // FAC-3 only has a January snapshot
    assert_eq!(rows[2].outstanding_exposure_usd, Decimal::ZERO);
}

#[test]
fn synthetic_portfolio_runs_clean() {
    let calendar = ReportingCalendar::default();
    let tables = generate_sources(
        &SyntheticConfig {
            facility_count: 120,
            counterparty_count: 25,
        },
        &calendar,
    );
    let output = run_pipeline(&tables, &PipelineConfig::default());

    assert_eq!(output.facilities.len(), 120);
    assert!(output.validation.is_clean(), "{}", output.validation);
    assert!(output.facilities.iter().any(|f| f.is_syndicated));
    assert!(output.facilities.iter().any(|f| f.is_cross_entity));
    assert!(output.facilities.iter().any(|f| f.has_amendment));
    assert!(output.facilities.iter().any(|f| !f.is_active));
    assert!(output
        .facilities
        .iter()
        .any(|f| f.counterparty_limit_status == Some(LimitStatus::Breach)));

    let grand: Decimal = output.facilities.iter().map(|f| f.outstanding_exposure_usd).sum();
    let l1: Decimal = output.rollups.lob_l1.iter().map(|g| g.metrics.total_exposure_usd).sum();
    assert_eq!(grand, l1);
}
