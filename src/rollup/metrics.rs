use crate::assembly::assembler::mitigant_total;
use crate::assembly::facility_summary::FacilitySummary;
use crate::config::ReportingCalendar;
use crate::core::ids::{CounterpartyId, FacilityId};
use crate::core::numeric::{safe_ratio, weighted_average, weighted_average_present};
use crate::source::index::{latest_and_prior, select_as_of, TableIndex};
use crate::source::snapshot::{CollateralSnapshot, FacilityPricingSnapshot};
use crate::source::tables::SourceTables;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Aggregates shared by every rollup level.
///
/// Averages are weighted by current outstanding exposure unless noted.
/// Metric averages (`avg_dscr` etc.) only weigh facilities that report the
/// metric and are `None` when none do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMetrics {
    pub facility_count: usize,
    pub counterparty_count: usize,

    pub total_exposure_usd: Decimal,
    pub prior_total_exposure_usd: Decimal,
    pub exposure_change_pct: Decimal,
    pub total_committed_usd: Decimal,
    pub total_utilized_usd: Decimal,
    pub utilization_pct: Decimal,
    pub total_ead_usd: Decimal,
    pub total_expected_loss_usd: Decimal,
    pub expected_loss_rate_pct: Decimal,
    pub total_rwa_usd: Decimal,
    pub total_operating_expense_usd: Decimal,
    pub total_nii_usd: Decimal,
    pub total_revenue_usd: Decimal,

    pub delinquent_count: usize,
    pub deteriorated_count: usize,
    pub criticized_count: usize,
    pub downgraded_count: usize,
    pub cross_entity_count: usize,
    pub syndicated_count: usize,
    pub active_count: usize,

    pub avg_spread_bps: Decimal,
    pub avg_base_rate_pct: Decimal,
    pub avg_all_in_rate_pct: Decimal,
    pub avg_coverage_ratio_pct: Decimal,
    pub avg_internal_risk_rating: Decimal,
    pub avg_nim_pct: Decimal,
    pub avg_roa_pct: Decimal,
    pub avg_dscr: Option<Decimal>,
    pub avg_ltv: Option<Decimal>,
    pub avg_fccr: Option<Decimal>,
    pub avg_tnw_usd: Option<Decimal>,

    pub top_sector: Option<String>,
    pub top_sector_pct: Decimal,
    pub top_region: Option<String>,
    pub top_region_pct: Decimal,

    /// Weighted by prior-month exposure.
    pub prior_avg_spread_bps: Decimal,
    /// Weighted by prior-month exposure.
    pub prior_avg_coverage_ratio_pct: Decimal,
    pub spread_change_bps: Decimal,
}

/// Prior-month pricing and collateral, read again from the raw snapshot
/// tables rather than from the assembled rows.
pub struct PriorMonthLookup<'a> {
    calendar: ReportingCalendar,
    pricing: TableIndex<'a, FacilityId, FacilityPricingSnapshot>,
    collateral: TableIndex<'a, FacilityId, CollateralSnapshot>,
}

impl<'a> PriorMonthLookup<'a> {
    pub fn new(tables: &'a SourceTables, calendar: ReportingCalendar) -> Self {
        Self {
            calendar,
            pricing: TableIndex::build(&tables.pricing_snapshots, |s| s.facility_id.clone()),
            collateral: TableIndex::build(&tables.collateral_snapshots, |s| s.facility_id.clone()),
        }
    }

    /// Spread on the prior-month pricing snapshot, falling back to the
    /// current one; zero when the facility has no pricing.
    pub fn prior_spread_bps(&self, facility_id: &FacilityId) -> Decimal {
        latest_and_prior(
            self.pricing.get(facility_id),
            self.calendar.as_of_date,
            self.calendar.prior_month_date,
        )
        .prior
        .map(|p| p.spread_bps)
        .unwrap_or_default()
    }

    /// Prior-month collateral over prior-month exposure.
    pub fn prior_coverage_ratio(&self, row: &FacilitySummary) -> Decimal {
        let rows = self.collateral.get(&row.facility_id);
        let date = if select_as_of(rows, self.calendar.prior_month_date).is_some() {
            self.calendar.prior_month_date
        } else {
            self.calendar.as_of_date
        };
        safe_ratio(mitigant_total(rows, date), row.prior_outstanding_exposure_usd)
    }
}

/// Largest exposure bucket under `bucket_fn` and its share of `total`.
/// On equal exposure the bucket seen first wins.
pub fn top_bucket<F>(rows: &[&FacilitySummary], total: Decimal, bucket_fn: F) -> (Option<String>, Decimal)
where
    F: Fn(&FacilitySummary) -> &str,
{
    let mut buckets: Vec<(&str, Decimal)> = Vec::new();
    for row in rows {
        let name = bucket_fn(row);
        match buckets.iter_mut().find(|(bucket, _)| *bucket == name) {
            Some((_, exposure)) => *exposure += row.outstanding_exposure_usd,
            None => buckets.push((name, row.outstanding_exposure_usd)),
        }
    }
    let mut top: Option<(&str, Decimal)> = None;
    for (name, exposure) in buckets {
        match top {
            Some((_, best)) if best >= exposure => {}
            _ => top = Some((name, exposure)),
        }
    }
    match top {
        Some((name, exposure)) => (Some(name.to_string()), safe_ratio(exposure, total)),
        None => (None, Decimal::ZERO),
    }
}

fn count(rows: &[&FacilitySummary], pred: impl Fn(&FacilitySummary) -> bool) -> usize {
    rows.iter().filter(|row| pred(row)).count()
}

fn sum(rows: &[&FacilitySummary], field: impl Fn(&FacilitySummary) -> Decimal) -> Decimal {
    rows.iter().map(|row| field(row)).sum()
}

impl GroupMetrics {
    /// Aggregate one group of facility rows.
    pub fn compute(rows: &[&FacilitySummary], prior: &PriorMonthLookup<'_>) -> Self {
        let weights: Vec<Decimal> = rows.iter().map(|r| r.outstanding_exposure_usd).collect();
        let prior_weights: Vec<Decimal> = rows
            .iter()
            .map(|r| r.prior_outstanding_exposure_usd)
            .collect();
        let avg = |field: fn(&FacilitySummary) -> Decimal| {
            let values: Vec<Decimal> = rows.iter().map(|r| field(r)).collect();
            weighted_average(&values, &weights)
        };
        let avg_present = |field: fn(&FacilitySummary) -> Option<Decimal>| {
            let values: Vec<Option<Decimal>> = rows.iter().map(|r| field(r)).collect();
            weighted_average_present(&values, &weights)
        };

        let total_exposure = sum(rows, |r| r.outstanding_exposure_usd);
        let prior_total_exposure = sum(rows, |r| r.prior_outstanding_exposure_usd);
        let total_committed = sum(rows, |r| r.committed_amount_usd);
        let total_utilized = sum(rows, |r| r.utilized_amount_usd);
        let total_ead = sum(rows, |r| r.ead_usd);
        let total_el = sum(rows, |r| r.expected_loss_usd);

        let mut counterparties: Vec<&CounterpartyId> = rows.iter().map(|r| &r.counterparty_id).collect();
        counterparties.sort();
        counterparties.dedup();

        let (top_sector, top_sector_pct) = top_bucket(rows, total_exposure, |r| r.industry_code.as_str());
        let (top_region, top_region_pct) = top_bucket(rows, total_exposure, |r| r.region.as_str());

        let avg_spread = avg(|r| r.spread_bps);
        let prior_spreads: Vec<Decimal> = rows
            .iter()
            .map(|r| prior.prior_spread_bps(&r.facility_id))
            .collect();
        let prior_coverage: Vec<Decimal> = rows.iter().map(|r| prior.prior_coverage_ratio(r)).collect();
        let prior_avg_spread = weighted_average(&prior_spreads, &prior_weights);

        GroupMetrics {
            facility_count: rows.len(),
            counterparty_count: counterparties.len(),

            total_exposure_usd: total_exposure,
            prior_total_exposure_usd: prior_total_exposure,
            exposure_change_pct: safe_ratio(total_exposure - prior_total_exposure, prior_total_exposure),
            total_committed_usd: total_committed,
            total_utilized_usd: total_utilized,
            utilization_pct: safe_ratio(total_utilized, total_committed),
            total_ead_usd: total_ead,
            total_expected_loss_usd: total_el,
            expected_loss_rate_pct: safe_ratio(total_el, total_ead),
            total_rwa_usd: sum(rows, |r| r.rwa_usd),
            total_operating_expense_usd: sum(rows, |r| r.operating_expense_usd),
            total_nii_usd: sum(rows, |r| r.net_interest_income_usd),
            total_revenue_usd: sum(rows, |r| r.total_revenue_usd),

            delinquent_count: count(rows, |r| r.is_delinquent),
            deteriorated_count: count(rows, |r| r.is_deteriorated),
            criticized_count: count(rows, |r| r.is_criticized),
            downgraded_count: count(rows, |r| r.has_any_downgrade),
            cross_entity_count: count(rows, |r| r.is_cross_entity),
            syndicated_count: count(rows, |r| r.is_syndicated),
            active_count: count(rows, |r| r.is_active),

            avg_spread_bps: avg_spread,
            avg_base_rate_pct: avg(|r| r.base_rate_pct),
            avg_all_in_rate_pct: avg(|r| r.all_in_rate_pct),
            avg_coverage_ratio_pct: avg(|r| r.coverage_ratio_pct),
            avg_internal_risk_rating: avg(|r| Decimal::from(r.internal_risk_rating.unwrap_or(0))),
            avg_nim_pct: avg(|r| r.nim_pct),
            avg_roa_pct: avg(|r| r.roa_pct),
            avg_dscr: avg_present(|r| r.dscr),
            avg_ltv: avg_present(|r| r.ltv),
            avg_fccr: avg_present(|r| r.fccr),
            avg_tnw_usd: avg_present(|r| r.tnw_usd),

            top_sector,
            top_sector_pct,
            top_region,
            top_region_pct,

            prior_avg_spread_bps: prior_avg_spread,
            prior_avg_coverage_ratio_pct: weighted_average(&prior_coverage, &prior_weights),
            spread_change_bps: avg_spread - prior_avg_spread,
        }
    }
}
