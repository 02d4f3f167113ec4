//! Desk rollup example.
//!
//! Builds a two-desk book by hand, assembles facility summaries and rolls
//! them up to desk, L2 and L1 level.

use facility_rollup::config::{PipelineConfig, ReportingCalendar};
use facility_rollup::core::rating::ExternalRating;
use facility_rollup::pipeline::run_pipeline;
use facility_rollup::simulation::fixtures::*;
use facility_rollup::source::tables::SourceTables;
use rust_decimal_macros::dec;

fn main() {
    println!("╔═══════════════════════════════════════════╗");
    println!("║  facility-rollup: Desk Rollup Example     ║");
    println!("╚═══════════════════════════════════════════╝\n");

    let calendar = ReportingCalendar::default();
    let industrials = ("Corporate Banking", "Large Corporate", "Industrials Desk");
    let energy = ("Corporate Banking", "Large Corporate", "Energy Desk");

    let mut tables = SourceTables::new();
    tables.legal_entities.push(legal_entity("LE-US"));
    tables.counterparties.push(counterparty("CP-ACME", 4, Some(ExternalRating::Bbb)));
    tables.counterparties.push(counterparty("CP-BOREAL", 6, Some(ExternalRating::Bb)));

    tables.facilities.push(facility("FAC-1", "CP-ACME", industrials, dec!(25_000_000)));
    tables.facilities.push(facility("FAC-2", "CP-ACME", industrials, dec!(10_000_000)));
    tables.facilities.push(facility("FAC-3", "CP-BOREAL", energy, dec!(40_000_000)));

    for (id, gross, spread) in [
        ("FAC-1", dec!(20_000_000), dec!(175)),
        ("FAC-2", dec!(6_000_000), dec!(225)),
        ("FAC-3", dec!(38_000_000), dec!(310)),
    ] {
        tables.exposure_snapshots.push(exposure(id, calendar.as_of_date, gross, gross));
        tables.pricing_snapshots.push(pricing(id, calendar.as_of_date, spread));
    }
    tables.limits.push(counterparty_limit("LIM-BOREAL", "CP-BOREAL", dec!(40_000_000), dec!(0.8), dec!(0.95)));
    tables.limit_utilizations.push(limit_utilization("LIM-BOREAL", calendar.as_of_date, dec!(38_000_000)));

    let output = run_pipeline(&tables, &PipelineConfig::default());

    println!("━━━ Facilities ━━━\n");
    for f in &output.facilities {
        let limit = f
            .counterparty_limit_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<16} exposure ${:<12} utilization {:<6} limit {}",
            f.facility_id,
            f.lob_l3,
            f.outstanding_exposure_usd.to_string(),
            f.utilization_pct.round_dp(4).to_string(),
            limit
        );
    }

    println!("\n━━━ Desks ━━━\n");
    for d in &output.rollups.desks {
        println!(
            "{:<16} facilities {}  exposure ${}  avg spread {} bps",
            d.lob_l3,
            d.metrics.facility_count,
            d.metrics.total_exposure_usd,
            d.metrics.avg_spread_bps.round_dp(2)
        );
    }

    println!("\n━━━ Lines of business ━━━\n");
    for g in &output.rollups.lob_l2 {
        println!(
            "{} / {}: exposure ${}, top desk {}",
            g.lob_l1,
            g.lob_l2,
            g.metrics.total_exposure_usd,
            g.desk_range.top_desk.as_deref().unwrap_or("-")
        );
    }

    // Small hand-built books trip the portfolio-wide sanity minimums
    println!("\n{}", output.validation);
}
