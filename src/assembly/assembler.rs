use crate::assembly::facility_summary::{ExposureTrend, FacilitySummary};
use crate::assembly::limits::LimitReading;
use crate::config::ReportingCalendar;
use crate::core::ids::{CounterpartyId, FacilityId, LegalEntityId};
use crate::core::numeric::{days_between, months_between, safe_ratio};
use crate::core::rating::{parse_internal_rating, ExternalRating, Severity};
use crate::source::event::{
    flag_codes, AmendmentChangeDetail, AmendmentEvent, CounterpartyRatingObservation,
    FinancialMetric, FinancialMetricObservation, FlagScope, LimitDefinition, LimitScope,
    LimitUtilizationEvent, RatingType, RiskFlag,
};
use crate::source::index::{latest_and_prior, select_all_as_of, select_as_of, select_on, TableIndex};
use crate::source::reference::{
    Counterparty, CounterpartyHierarchy, FacilityCounterpartyParticipation,
    FacilityLenderAllocation, FacilityMaster, FacilityStatus,
};
use crate::source::snapshot::{
    CollateralSnapshot, FacilityDelinquencySnapshot, FacilityExposureSnapshot,
    FacilityPricingSnapshot, FacilityProfitabilitySnapshot,
};
use crate::source::tables::SourceTables;
use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;

/// Sum of collateral allocated on the date `date` resolves to.
pub fn mitigant_total(rows: &[&CollateralSnapshot], date: NaiveDate) -> Decimal {
    select_all_as_of(rows, date)
        .iter()
        .map(|c| c.allocated_amount_usd)
        .sum()
}

/// Distinct values in first-seen order.
fn distinct_in_order<T: PartialEq + Clone>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::new();
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

/// Joins the source tables into one [`FacilitySummary`] per facility.
///
/// Construction is the build phase: every table the derivation reads is
/// indexed once by its join key. [`assemble`](Self::assemble) then derives
/// each facility independently against those indexes. No lookup can fail;
/// a missing relation yields defaults.
pub struct FacilitySummaryAssembler<'a> {
    tables: &'a SourceTables,
    calendar: ReportingCalendar,
    counterparties: TableIndex<'a, CounterpartyId, Counterparty>,
    hierarchy: TableIndex<'a, CounterpartyId, CounterpartyHierarchy>,
    participations: TableIndex<'a, FacilityId, FacilityCounterpartyParticipation>,
    lender_allocations: TableIndex<'a, FacilityId, FacilityLenderAllocation>,
    exposures: TableIndex<'a, FacilityId, FacilityExposureSnapshot>,
    collateral: TableIndex<'a, FacilityId, CollateralSnapshot>,
    pricing: TableIndex<'a, FacilityId, FacilityPricingSnapshot>,
    delinquency: TableIndex<'a, FacilityId, FacilityDelinquencySnapshot>,
    profitability: TableIndex<'a, FacilityId, FacilityProfitabilitySnapshot>,
    amendments: TableIndex<'a, FacilityId, AmendmentEvent>,
    amendment_changes: TableIndex<'a, String, AmendmentChangeDetail>,
    ratings: TableIndex<'a, (CounterpartyId, RatingType), CounterpartyRatingObservation>,
    facility_flags: TableIndex<'a, FacilityId, RiskFlag>,
    counterparty_flags: TableIndex<'a, CounterpartyId, RiskFlag>,
    counterparty_limits: TableIndex<'a, CounterpartyId, LimitDefinition>,
    utilizations: TableIndex<'a, String, LimitUtilizationEvent>,
    facility_metrics: TableIndex<'a, (FacilityId, FinancialMetric), FinancialMetricObservation>,
    counterparty_metrics:
        TableIndex<'a, (CounterpartyId, FinancialMetric), FinancialMetricObservation>,
}

impl<'a> FacilitySummaryAssembler<'a> {
    pub fn new(tables: &'a SourceTables, calendar: ReportingCalendar) -> Self {
        let assembler = Self {
            tables,
            calendar,
            counterparties: TableIndex::build(&tables.counterparties, |c| c.counterparty_id.clone()),
            hierarchy: TableIndex::build(&tables.counterparty_hierarchy, |h| {
                h.counterparty_id.clone()
            }),
            participations: TableIndex::build(&tables.participations, |p| p.facility_id.clone()),
            lender_allocations: TableIndex::build(&tables.lender_allocations, |a| {
                a.facility_id.clone()
            }),
            exposures: TableIndex::build(&tables.exposure_snapshots, |s| s.facility_id.clone()),
            collateral: TableIndex::build(&tables.collateral_snapshots, |s| s.facility_id.clone()),
            pricing: TableIndex::build(&tables.pricing_snapshots, |s| s.facility_id.clone()),
            delinquency: TableIndex::build(&tables.delinquency_snapshots, |s| {
                s.facility_id.clone()
            }),
            profitability: TableIndex::build(&tables.profitability_snapshots, |s| {
                s.facility_id.clone()
            }),
            amendments: TableIndex::build(&tables.amendments, |a| a.facility_id.clone()),
            amendment_changes: TableIndex::build(&tables.amendment_changes, |c| {
                c.amendment_id.clone()
            }),
            ratings: TableIndex::build(&tables.rating_observations, |r| {
                (r.counterparty_id.clone(), r.rating_type)
            }),
            facility_flags: TableIndex::build_filtered(&tables.risk_flags, |f| {
                match f.scope {
                    FlagScope::Facility => f.facility_id.clone(),
                    FlagScope::Counterparty => None,
                }
            }),
            counterparty_flags: TableIndex::build_filtered(&tables.risk_flags, |f| {
                match f.scope {
                    FlagScope::Counterparty => f.counterparty_id.clone(),
                    FlagScope::Facility => None,
                }
            }),
            counterparty_limits: TableIndex::build_filtered(&tables.limits, |l| match l.scope {
                LimitScope::Counterparty => l.counterparty_id.clone(),
                LimitScope::LobL2 => None,
            }),
            utilizations: TableIndex::build(&tables.limit_utilizations, |u| u.limit_id.clone()),
            facility_metrics: TableIndex::build_filtered(&tables.financial_metrics, |m| {
                m.facility_id.clone().map(|id| (id, m.metric))
            }),
            counterparty_metrics: TableIndex::build_filtered(&tables.financial_metrics, |m| {
                m.counterparty_id.clone().map(|id| (id, m.metric))
            }),
        };
        debug!(
            "indexed {} facilities, {} exposure keys, {} collateral keys",
            tables.facilities.len(),
            assembler.exposures.len(),
            assembler.collateral.len()
        );
        assembler
    }

    pub fn calendar(&self) -> &ReportingCalendar {
        &self.calendar
    }

    /// One summary per facility master row, in master order.
    pub fn assemble(&self) -> Vec<FacilitySummary> {
        self.tables
            .facilities
            .iter()
            .map(|facility| self.assemble_facility(facility))
            .collect()
    }

    /// Derive the summary row for a single facility.
    pub fn assemble_facility(&self, facility: &FacilityMaster) -> FacilitySummary {
        let cal = &self.calendar;
        let fid = &facility.facility_id;
        let counterparty = self.counterparties.first(&facility.counterparty_id);

        // Exposure
        let exposure = latest_and_prior(self.exposures.get(fid), cal.as_of_date, cal.prior_month_date);
        let outstanding = exposure.latest.map(|e| e.gross_exposure_usd).unwrap_or_default();
        let prior_outstanding = exposure.prior.map(|e| e.gross_exposure_usd).unwrap_or_default();
        let drawn = exposure.latest.map(|e| e.drawn_amount).unwrap_or_default();
        let ead = exposure.latest.map(|e| e.ead_amount).unwrap_or_default();
        let exposure_change_pct = safe_ratio(outstanding - prior_outstanding, prior_outstanding);

        // Credit quality
        let pd = counterparty.map(|c| c.pd).unwrap_or_default();
        let lgd = counterparty.map(|c| c.lgd).unwrap_or_default();
        let migration = self.rating_migration(&facility.counterparty_id, counterparty);

        // Collateral
        let collateral_rows = select_all_as_of(self.collateral.get(fid), cal.as_of_date);
        let mitigant = mitigant_total(self.collateral.get(fid), cal.as_of_date);

        let pricing = select_as_of(self.pricing.get(fid), cal.as_of_date);
        let delinquency = select_as_of(self.delinquency.get(fid), cal.as_of_date);
        let profitability = select_as_of(self.profitability.get(fid), cal.as_of_date);

        let participating_counterparty_ids = distinct_in_order(
            self.participations.get(fid).iter().map(|p| p.counterparty_id.clone()),
        );
        let allocations = self.lender_allocations.get(fid);
        let lender_legal_entity_ids: Vec<LegalEntityId> =
            distinct_in_order(allocations.iter().map(|a| a.legal_entity_id.clone()));

        let amendments = self.amendments.get(fid);
        let latest_amendment = latest_amendment(amendments);
        let amended_fields = latest_amendment
            .map(|a| {
                self.amendment_changes
                    .get(&a.amendment_id)
                    .iter()
                    .map(|c| c.field_name.clone())
                    .collect()
            })
            .unwrap_or_default();

        let flags = self.flags_for(fid, &facility.counterparty_id);
        let has_flag = |code: &str| flags.iter().any(|f| f.flag_code == code);
        let highest_flag_severity: Option<Severity> = flags.iter().map(|f| f.severity).max();

        let limit = self.counterparty_limit(&facility.counterparty_id);

        FacilitySummary {
            facility_id: fid.clone(),
            facility_name: facility.facility_name.clone(),
            counterparty_id: facility.counterparty_id.clone(),
            counterparty_name: counterparty.map(|c| c.legal_name.clone()).unwrap_or_default(),
            ultimate_parent_id: self
                .hierarchy
                .first(&facility.counterparty_id)
                .map(|h| h.ultimate_parent_id.clone()),
            facility_type: facility.facility_type.clone(),
            product_type: facility.product_type.clone(),
            facility_status: facility.facility_status,
            lob_l1: facility.lob_l1.clone(),
            lob_l2: facility.lob_l2.clone(),
            lob_l3: facility.lob_l3.clone(),
            region: facility.region.clone(),
            industry_code: facility.industry_code.clone(),
            currency_code: facility.currency_code.clone(),
            booking_legal_entity_id: facility.booking_legal_entity_id.clone(),
            as_of_date: cal.as_of_date,
            origination_date: facility.origination_date,
            maturity_date: facility.maturity_date,

            committed_amount_usd: facility.committed_facility_amt,
            outstanding_exposure_usd: outstanding,
            prior_outstanding_exposure_usd: prior_outstanding,
            utilized_amount_usd: drawn,
            undrawn_amount_usd: exposure.latest.map(|e| e.undrawn_amount).unwrap_or_default(),
            ead_usd: ead,
            rwa_usd: exposure.latest.map(|e| e.rwa_amount).unwrap_or_default(),
            utilization_pct: safe_ratio(drawn, facility.committed_facility_amt),
            exposure_change_pct,
            exposure_trend_direction: ExposureTrend::from_change(exposure_change_pct),

            internal_risk_rating: counterparty.map(|c| c.internal_risk_rating),
            prior_internal_risk_rating: migration.prior_internal,
            external_rating: counterparty.and_then(|c| c.external_rating),
            prior_external_rating: migration.prior_external,
            pd,
            lgd,
            expected_loss_usd: pd * lgd * ead,
            has_internal_downgrade: migration.internal_downgrade,
            has_external_downgrade: migration.external_downgrade,
            has_any_downgrade: migration.internal_downgrade || migration.external_downgrade,

            risk_mitigant_amount_usd: mitigant,
            coverage_ratio_pct: safe_ratio(mitigant, outstanding),
            collateral_count: collateral_rows.len(),
            primary_mitigant_group: primary_mitigant_group(&collateral_rows),

            spread_bps: pricing.map(|p| p.spread_bps).unwrap_or_default(),
            base_rate_pct: pricing.map(|p| p.base_rate_pct).unwrap_or_default(),
            all_in_rate_pct: pricing.map(|p| p.all_in_rate_pct).unwrap_or_default(),
            has_pricing_exception: pricing.map(|p| p.pricing_exception_flag).unwrap_or(false),
            has_rate_floor: pricing.map(|p| p.rate_floor_active_flag).unwrap_or(false),

            days_past_due: delinquency.map(|d| d.days_past_due).unwrap_or(0),
            delinquency_status: delinquency
                .map(|d| d.delinquency_status.clone())
                .unwrap_or_default(),
            is_delinquent: delinquency.map(|d| d.days_past_due > 0).unwrap_or(false),
            overdue_amount_usd: delinquency
                .map(|d| d.overdue_principal_amt + d.overdue_interest_amt)
                .unwrap_or_default(),

            net_interest_income_usd: profitability
                .map(|p| p.net_interest_income_usd)
                .unwrap_or_default(),
            total_revenue_usd: profitability.map(|p| p.total_revenue_usd).unwrap_or_default(),
            operating_expense_usd: profitability
                .map(|p| p.operating_expense_usd)
                .unwrap_or_default(),
            nim_pct: profitability.map(|p| p.net_interest_margin_pct).unwrap_or_default(),
            roa_pct: profitability.map(|p| p.return_on_assets_pct).unwrap_or_default(),
            roe_pct: profitability.map(|p| p.return_on_equity_pct).unwrap_or_default(),

            is_syndicated: participating_counterparty_ids.len() > 1,
            participating_counterparty_ids,
            is_cross_entity: lender_legal_entity_ids.len() > 1,
            lender_legal_entity_ids,
            bank_share_pct: allocations.iter().map(|a| a.bank_share_pct).sum(),

            amendment_count: amendments.len(),
            has_amendment: !amendments.is_empty(),
            latest_amendment_type: latest_amendment.map(|a| a.amendment_type.clone()),
            latest_amendment_status: latest_amendment.map(|a| a.amendment_status.clone()),
            amended_fields,
            amendment_aging_days: latest_amendment
                .map(|a| days_between(cal.today, a.identified_date)),

            risk_flag_codes: distinct_in_order(flags.iter().map(|f| f.flag_code.clone())),
            is_deteriorated: has_flag(flag_codes::DETERIORATED),
            is_criticized: has_flag(flag_codes::CRITICIZED),
            is_watch_list: has_flag(flag_codes::WATCH_LIST),
            has_covenant_breach: has_flag(flag_codes::COVENANT_BREACH),
            highest_flag_severity,

            counterparty_limit_amount_usd: limit.as_ref().map(|l| l.limit_amount_usd),
            counterparty_limit_utilized_usd: limit.as_ref().map(|l| l.utilized_amount_usd),
            counterparty_limit_utilization_pct: limit.as_ref().map(|l| l.utilization_pct),
            counterparty_limit_status: limit.as_ref().map(|l| l.status),

            dscr: self.facility_metric(fid, FinancialMetric::Dscr),
            ltv: self.facility_metric(fid, FinancialMetric::Ltv),
            fccr: self.facility_metric(fid, FinancialMetric::Fccr),
            tnw_usd: select_as_of(
                self.counterparty_metrics
                    .get(&(facility.counterparty_id.clone(), FinancialMetric::Tnw)),
                cal.as_of_date,
            )
            .map(|m| m.value),

            days_remaining: days_between(cal.today, facility.maturity_date),
            tenor_months: months_between(facility.origination_date, facility.maturity_date),
            is_active: facility.facility_status == FacilityStatus::Active
                && facility.maturity_date >= cal.today,
        }
    }

    fn rating_migration(
        &self,
        counterparty_id: &CounterpartyId,
        counterparty: Option<&Counterparty>,
    ) -> RatingMigration {
        let as_of = self.calendar.as_of_date;
        // Only an observation dated on the as-of date carries this month's migration.
        let prior_value = |rating_type: RatingType| -> Option<&'a str> {
            select_on(self.ratings.get(&(counterparty_id.clone(), rating_type)), as_of)
                .and_then(|obs| obs.prior_rating_value.as_deref())
        };

        let prior_internal = prior_value(RatingType::Internal)
            .and_then(|v| parse_internal_rating(v).ok());
        let prior_external = prior_value(RatingType::External)
            .and_then(|v| v.parse::<ExternalRating>().ok());

        let current_internal = counterparty.map(|c| c.internal_risk_rating);
        let current_external = counterparty.and_then(|c| c.external_rating);

        RatingMigration {
            prior_internal,
            prior_external,
            internal_downgrade: matches!(
                (current_internal, prior_internal),
                (Some(current), Some(prior)) if current > prior
            ),
            external_downgrade: matches!(
                (current_external, prior_external),
                (Some(current), Some(prior)) if current.is_downgrade_from(prior)
            ),
        }
    }

    /// Facility-scoped flags followed by the counterparty's flags.
    fn flags_for(&self, facility_id: &FacilityId, counterparty_id: &CounterpartyId) -> Vec<&'a RiskFlag> {
        self.facility_flags
            .get(facility_id)
            .iter()
            .chain(self.counterparty_flags.get(counterparty_id))
            .copied()
            .collect()
    }

    fn counterparty_limit(&self, counterparty_id: &CounterpartyId) -> Option<LimitReading> {
        let limit = self.counterparty_limits.first(counterparty_id)?;
        let event = select_on(self.utilizations.get(&limit.limit_id), self.calendar.as_of_date);
        Some(LimitReading::evaluate(limit, event, Decimal::ZERO))
    }

    fn facility_metric(&self, facility_id: &FacilityId, metric: FinancialMetric) -> Option<Decimal> {
        select_as_of(
            self.facility_metrics.get(&(facility_id.clone(), metric)),
            self.calendar.as_of_date,
        )
        .map(|m| m.value)
    }
}

struct RatingMigration {
    prior_internal: Option<u32>,
    prior_external: Option<ExternalRating>,
    internal_downgrade: bool,
    external_downgrade: bool,
}

/// The amendment with the latest identified date; the first such row on ties.
fn latest_amendment<'a>(amendments: &[&'a AmendmentEvent]) -> Option<&'a AmendmentEvent> {
    let mut latest: Option<&'a AmendmentEvent> = None;
    for &amendment in amendments {
        match latest {
            Some(current) if current.identified_date >= amendment.identified_date => {}
            _ => latest = Some(amendment),
        }
    }
    latest
}

/// The mitigant group carrying the largest allocated amount.
fn primary_mitigant_group(rows: &[&CollateralSnapshot]) -> Option<String> {
    let mut totals: Vec<(&str, Decimal)> = Vec::new();
    for row in rows {
        match totals.iter_mut().find(|(group, _)| *group == row.mitigant_group) {
            Some((_, total)) => *total += row.allocated_amount_usd,
            None => totals.push((row.mitigant_group.as_str(), row.allocated_amount_usd)),
        }
    }
    let mut best: Option<(&str, Decimal)> = None;
    for (group, total) in totals {
        match best {
            Some((_, best_total)) if best_total >= total => {}
            _ => best = Some((group, total)),
        }
    }
    best.map(|(group, _)| group.to_string())
}
