use crate::assembly::assembler::mitigant_total;
use crate::assembly::facility_summary::FacilitySummary;
use crate::config::{ReportingCalendar, ValidationThresholds};
use crate::core::ids::{CounterpartyId, FacilityId, LegalEntityId};
use crate::core::numeric::{approx_eq, safe_ratio};
use crate::rollup::summary::RollupOutput;
use crate::source::event::AmendmentEvent;
use crate::source::index::{latest_and_prior, TableIndex};
use crate::source::reference::{FacilityCounterpartyParticipation, FacilityMaster};
use crate::source::snapshot::{CollateralSnapshot, FacilityExposureSnapshot};
use crate::source::tables::SourceTables;
use crate::validation::report::{IssueCategory, ValidationReport};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

/// Post-hoc consistency checker over assembled rows and their sources.
///
/// Recomputes key ratios and flags straight from the source tables and
/// compares them with the assembled values. Findings are collected into a
/// [`ValidationReport`]; nothing here fails or mutates its inputs.
pub struct Validator<'a> {
    tables: &'a SourceTables,
    calendar: ReportingCalendar,
    thresholds: ValidationThresholds,
    facility_ids: HashSet<&'a FacilityId>,
    counterparty_ids: HashSet<&'a CounterpartyId>,
    legal_entity_ids: HashSet<&'a LegalEntityId>,
    masters: TableIndex<'a, FacilityId, FacilityMaster>,
    participations: TableIndex<'a, FacilityId, FacilityCounterpartyParticipation>,
    amendments: TableIndex<'a, FacilityId, AmendmentEvent>,
    exposures: TableIndex<'a, FacilityId, FacilityExposureSnapshot>,
    collateral: TableIndex<'a, FacilityId, CollateralSnapshot>,
}

impl<'a> Validator<'a> {
    pub fn new(tables: &'a SourceTables, calendar: ReportingCalendar, thresholds: ValidationThresholds) -> Self {
        Self {
            tables,
            calendar,
            thresholds,
            facility_ids: tables.facilities.iter().map(|f| &f.facility_id).collect(),
            counterparty_ids: tables.counterparties.iter().map(|c| &c.counterparty_id).collect(),
            legal_entity_ids: tables.legal_entities.iter().map(|e| &e.legal_entity_id).collect(),
            masters: TableIndex::build(&tables.facilities, |f| f.facility_id.clone()),
            participations: TableIndex::build(&tables.participations, |p| p.facility_id.clone()),
            amendments: TableIndex::build(&tables.amendments, |a| a.facility_id.clone()),
            exposures: TableIndex::build(&tables.exposure_snapshots, |s| s.facility_id.clone()),
            collateral: TableIndex::build(&tables.collateral_snapshots, |s| s.facility_id.clone()),
        }
    }

    /// Run every check. Rollup conservation is checked when `rollups` is given.
    pub fn validate(&self, facilities: &[FacilitySummary], rollups: Option<&RollupOutput>) -> ValidationReport {
        let mut report = ValidationReport::new();
        self.check_referential_integrity(facilities, &mut report);
        self.check_primary_keys(&mut report);
        for row in facilities {
            self.check_ratios(row, &mut report);
            self.check_flags(row, &mut report);
            check_required_fields(row, &mut report);
        }
        self.check_sanity_thresholds(facilities, &mut report);
        if let Some(rollups) = rollups {
            check_rollup_conservation(facilities, rollups, &mut report);
        }
        report
    }

    fn check_referential_integrity(&self, facilities: &[FacilitySummary], report: &mut ValidationReport) {
        let t = self.tables;
        let mut missing = |table: &str, row: &dyn Display, kind: &str, id: &dyn Display| {
            report.push(
                IssueCategory::ReferentialIntegrity,
                format!("{table} {row}: unknown {kind} {id}"),
            );
        };

        for f in &t.facilities {
            if !self.counterparty_ids.contains(&f.counterparty_id) {
                missing("facilities", &f.facility_id, "counterparty", &f.counterparty_id);
            }
            if !self.legal_entity_ids.contains(&f.booking_legal_entity_id) {
                missing("facilities", &f.facility_id, "legal entity", &f.booking_legal_entity_id);
            }
        }
        for h in &t.counterparty_hierarchy {
            if !self.counterparty_ids.contains(&h.counterparty_id) {
                missing("counterparty_hierarchy", &h.counterparty_id, "counterparty", &h.counterparty_id);
            }
            if !self.counterparty_ids.contains(&h.ultimate_parent_id) {
                missing("counterparty_hierarchy", &h.counterparty_id, "ultimate parent", &h.ultimate_parent_id);
            }
        }
        for p in &t.participations {
            if !self.facility_ids.contains(&p.facility_id) {
                missing("participations", &p.participation_id, "facility", &p.facility_id);
            }
            if !self.counterparty_ids.contains(&p.counterparty_id) {
                missing("participations", &p.participation_id, "counterparty", &p.counterparty_id);
            }
        }
        for a in &t.lender_allocations {
            if !self.facility_ids.contains(&a.facility_id) {
                missing("lender_allocations", &a.allocation_id, "facility", &a.facility_id);
            }
            if !self.legal_entity_ids.contains(&a.legal_entity_id) {
                missing("lender_allocations", &a.allocation_id, "legal entity", &a.legal_entity_id);
            }
        }

        let snapshot_facilities = t
            .exposure_snapshots
            .iter()
            .map(|s| ("exposure_snapshots", &s.facility_id))
            .chain(t.collateral_snapshots.iter().map(|s| ("collateral_snapshots", &s.facility_id)))
            .chain(t.pricing_snapshots.iter().map(|s| ("pricing_snapshots", &s.facility_id)))
            .chain(t.delinquency_snapshots.iter().map(|s| ("delinquency_snapshots", &s.facility_id)))
            .chain(t.profitability_snapshots.iter().map(|s| ("profitability_snapshots", &s.facility_id)))
            .chain(t.amendments.iter().map(|a| ("amendments", &a.facility_id)));
        for (table, facility_id) in snapshot_facilities {
            if !self.facility_ids.contains(facility_id) {
                missing(table, facility_id, "facility", facility_id);
            }
        }

        let amendment_ids: HashSet<&str> = t.amendments.iter().map(|a| a.amendment_id.as_str()).collect();
        for c in &t.amendment_changes {
            if !amendment_ids.contains(c.amendment_id.as_str()) {
                missing("amendment_changes", &c.change_detail_id, "amendment", &c.amendment_id);
            }
        }
        for r in &t.rating_observations {
            if !self.counterparty_ids.contains(&r.counterparty_id) {
                missing("rating_observations", &r.observation_id, "counterparty", &r.counterparty_id);
            }
        }
        for flag in &t.risk_flags {
            if let Some(fid) = &flag.facility_id {
                if !self.facility_ids.contains(fid) {
                    missing("risk_flags", &flag.flag_id, "facility", fid);
                }
            }
            if let Some(cp) = &flag.counterparty_id {
                if !self.counterparty_ids.contains(cp) {
                    missing("risk_flags", &flag.flag_id, "counterparty", cp);
                }
            }
        }
        for limit in &t.limits {
            if let Some(cp) = &limit.counterparty_id {
                if !self.counterparty_ids.contains(cp) {
                    missing("limits", &limit.limit_id, "counterparty", cp);
                }
            }
        }
        let limit_ids: HashSet<&str> = t.limits.iter().map(|l| l.limit_id.as_str()).collect();
        for u in &t.limit_utilizations {
            if !limit_ids.contains(u.limit_id.as_str()) {
                missing("limit_utilizations", &u.event_id, "limit", &u.limit_id);
            }
        }
        for m in &t.financial_metrics {
            if let Some(fid) = &m.facility_id {
                if !self.facility_ids.contains(fid) {
                    missing("financial_metrics", &m.observation_id, "facility", fid);
                }
            }
            if let Some(cp) = &m.counterparty_id {
                if !self.counterparty_ids.contains(cp) {
                    missing("financial_metrics", &m.observation_id, "counterparty", cp);
                }
            }
        }
        for row in facilities {
            if !self.facility_ids.contains(&row.facility_id) {
                missing("facility_summary", &row.facility_id, "facility", &row.facility_id);
            }
        }
    }

    fn check_primary_keys(&self, report: &mut ValidationReport) {
        let t = self.tables;
        check_unique(report, "facilities", t.facilities.iter().map(|r| r.facility_id.to_string()));
        check_unique(report, "counterparties", t.counterparties.iter().map(|r| r.counterparty_id.to_string()));
        check_unique(
            report,
            "counterparty_hierarchy",
            t.counterparty_hierarchy.iter().map(|r| r.counterparty_id.to_string()),
        );
        check_unique(report, "legal_entities", t.legal_entities.iter().map(|r| r.legal_entity_id.to_string()));
        check_unique(report, "participations", t.participations.iter().map(|r| r.participation_id.clone()));
        check_unique(report, "lender_allocations", t.lender_allocations.iter().map(|r| r.allocation_id.clone()));
        check_unique(
            report,
            "exposure_snapshots",
            t.exposure_snapshots.iter().map(|r| format!("{}@{}", r.facility_id, r.as_of_date)),
        );
        check_unique(
            report,
            "collateral_snapshots",
            t.collateral_snapshots.iter().map(|r| format!("{}@{}", r.collateral_id, r.as_of_date)),
        );
        check_unique(
            report,
            "pricing_snapshots",
            t.pricing_snapshots.iter().map(|r| format!("{}@{}", r.facility_id, r.as_of_date)),
        );
        check_unique(
            report,
            "delinquency_snapshots",
            t.delinquency_snapshots.iter().map(|r| format!("{}@{}", r.facility_id, r.as_of_date)),
        );
        check_unique(
            report,
            "profitability_snapshots",
            t.profitability_snapshots.iter().map(|r| format!("{}@{}", r.facility_id, r.as_of_date)),
        );
        check_unique(report, "amendments", t.amendments.iter().map(|r| r.amendment_id.clone()));
        check_unique(report, "amendment_changes", t.amendment_changes.iter().map(|r| r.change_detail_id.clone()));
        check_unique(report, "rating_observations", t.rating_observations.iter().map(|r| r.observation_id.clone()));
        check_unique(report, "risk_flags", t.risk_flags.iter().map(|r| r.flag_id.clone()));
        check_unique(report, "limits", t.limits.iter().map(|r| r.limit_id.clone()));
        check_unique(report, "limit_utilizations", t.limit_utilizations.iter().map(|r| r.event_id.clone()));
        check_unique(report, "financial_metrics", t.financial_metrics.iter().map(|r| r.observation_id.clone()));
    }

    fn check_ratios(&self, row: &FacilitySummary, report: &mut ValidationReport) {
        let tolerance = self.thresholds.tolerance;
        let cal = &self.calendar;
        let exposure = latest_and_prior(self.exposures.get(&row.facility_id), cal.as_of_date, cal.prior_month_date);
        let gross = exposure.latest.map(|e| e.gross_exposure_usd).unwrap_or_default();
        let prior_gross = exposure.prior.map(|e| e.gross_exposure_usd).unwrap_or_default();
        let drawn = exposure.latest.map(|e| e.drawn_amount).unwrap_or_default();
        let committed = self
            .masters
            .first(&row.facility_id)
            .map(|f| f.committed_facility_amt)
            .unwrap_or(row.committed_amount_usd);
        let mitigant = mitigant_total(self.collateral.get(&row.facility_id), cal.as_of_date);

        let expected = [
            ("utilization_pct", row.utilization_pct, safe_ratio(drawn, committed)),
            ("coverage_ratio_pct", row.coverage_ratio_pct, safe_ratio(mitigant, gross)),
            (
                "exposure_change_pct",
                row.exposure_change_pct,
                safe_ratio(gross - prior_gross, prior_gross),
            ),
        ];
        for (field, actual, recomputed) in expected {
            if !approx_eq(actual, recomputed, tolerance) {
                report.push(
                    IssueCategory::RatioMismatch,
                    format!("{}: {field} is {actual}, recomputed {recomputed}", row.facility_id),
                );
            }
        }
    }

    fn check_flags(&self, row: &FacilitySummary, report: &mut ValidationReport) {
        let participants: HashSet<&CounterpartyId> = self
            .participations
            .get(&row.facility_id)
            .iter()
            .map(|p| &p.counterparty_id)
            .collect();
        if row.is_syndicated != (participants.len() > 1) {
            report.push(
                IssueCategory::FlagMismatch,
                format!(
                    "{}: is_syndicated is {} but {} distinct participants found",
                    row.facility_id,
                    row.is_syndicated,
                    participants.len()
                ),
            );
        }
        if row.is_syndicated != (row.participating_counterparty_ids.len() > 1) {
            report.push(
                IssueCategory::FlagMismatch,
                format!(
                    "{}: is_syndicated disagrees with {} listed participants",
                    row.facility_id,
                    row.participating_counterparty_ids.len()
                ),
            );
        }

        let amendments = self.amendments.get(&row.facility_id).len();
        if row.has_amendment != (amendments > 0) {
            report.push(
                IssueCategory::FlagMismatch,
                format!(
                    "{}: has_amendment is {} but {amendments} amendment events found",
                    row.facility_id, row.has_amendment
                ),
            );
        }
    }

    fn check_sanity_thresholds(&self, facilities: &[FacilitySummary], report: &mut ValidationReport) {
        let th = &self.thresholds;
        let syndicated = facilities.iter().filter(|f| f.is_syndicated).count();
        let cross_entity = facilities.iter().filter(|f| f.is_cross_entity).count();
        let amended = facilities.iter().filter(|f| f.has_amendment).count();
        let active = facilities.iter().filter(|f| f.is_active).count();

        let minimums = [
            ("syndicated", syndicated, th.min_syndicated_facilities),
            ("cross-entity", cross_entity, th.min_cross_entity_facilities),
            ("amended", amended, th.min_amended_facilities),
        ];
        for (label, found, minimum) in minimums {
            if found < minimum {
                report.push(
                    IssueCategory::SanityThreshold,
                    format!("expected at least {minimum} {label} facilities, found {found}"),
                );
            }
        }
        if active == 0 {
            report.push(IssueCategory::SanityThreshold, "no active facilities");
        }
        if active == facilities.len() {
            report.push(IssueCategory::SanityThreshold, "no matured or inactive facilities");
        }
    }
}

fn check_unique<K: Eq + Hash + Display>(report: &mut ValidationReport, table: &str, keys: impl Iterator<Item = K>) {
    let mut seen: HashSet<K> = HashSet::new();
    let mut reported: HashSet<String> = HashSet::new();
    for key in keys {
        let label = key.to_string();
        if !seen.insert(key) && reported.insert(label.clone()) {
            report.push(
                IssueCategory::DuplicateKey,
                format!("{table}: duplicate primary key {label}"),
            );
        }
    }
}

fn check_required_fields(row: &FacilitySummary, report: &mut ValidationReport) {
    let mut require = |field: &str, present: bool| {
        if !present {
            report.push(
                IssueCategory::MissingField,
                format!("{}: {field} is empty", row.facility_id),
            );
        }
    };
    require("facility_id", !row.facility_id.is_blank());
    require("counterparty_id", !row.counterparty_id.is_blank());
    require("counterparty_name", !row.counterparty_name.trim().is_empty());
    require("lob_l1", !row.lob_l1.trim().is_empty());
    require("lob_l2", !row.lob_l2.trim().is_empty());
    require("lob_l3", !row.lob_l3.trim().is_empty());
    require("region", !row.region.trim().is_empty());
    require("booking_legal_entity_id", !row.booking_legal_entity_id.is_blank());
}

fn exposure_where(facilities: &[FacilitySummary], pred: impl Fn(&FacilitySummary) -> bool) -> Decimal {
    facilities
        .iter()
        .filter(|f| pred(*f))
        .map(|f| f.outstanding_exposure_usd)
        .sum()
}

/// Group totals must equal the sum of their facilities' exposure, exactly.
fn check_rollup_conservation(facilities: &[FacilitySummary], rollups: &RollupOutput, report: &mut ValidationReport) {
    let mut check = |group: String, expected: Decimal, actual: Decimal| {
        if expected != actual {
            report.push(
                IssueCategory::RollupConservation,
                format!("{group}: total_exposure_usd is {actual}, facilities sum to {expected}"),
            );
        }
    };

    for d in &rollups.desks {
        let expected = exposure_where(facilities, |f| f.lob_l1 == d.lob_l1 && f.lob_l2 == d.lob_l2 && f.lob_l3 == d.lob_l3);
        check(format!("desk {} / {} / {}", d.lob_l1, d.lob_l2, d.lob_l3), expected, d.metrics.total_exposure_usd);
    }
    for g in &rollups.lob_l2 {
        let expected = exposure_where(facilities, |f| f.lob_l1 == g.lob_l1 && f.lob_l2 == g.lob_l2);
        check(format!("lob_l2 {} / {}", g.lob_l1, g.lob_l2), expected, g.metrics.total_exposure_usd);
    }
    for g in &rollups.lob_l1 {
        let expected = exposure_where(facilities, |f| f.lob_l1 == g.lob_l1);
        check(format!("lob_l1 {}", g.lob_l1), expected, g.metrics.total_exposure_usd);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::assembler::FacilitySummaryAssembler;
    use crate::core::rating::ExternalRating;
    use crate::rollup::assembler::RollupAssembler;
    use crate::simulation::fixtures::*;
    use crate::source::reference::FacilityStatus;
    use rust_decimal_macros::dec;

    const DESK: LobPath<'static> = ("Corporate Banking", "Large Corporate", "Industrials Desk");

    /// One syndicated, cross-entity, amended active facility and one matured.
    fn clean_tables() -> SourceTables {
        let as_of = date(2025, 1, 31);
        let mut tables = SourceTables::new();
        tables.legal_entities.push(legal_entity("LE-US"));
        tables.legal_entities.push(legal_entity("LE-UK"));
        tables.counterparties.push(counterparty("CP-1", 4, Some(ExternalRating::Bbb)));
        tables.counterparties.push(counterparty("CP-2", 6, None));

        tables.facilities.push(facility("FAC-1", "CP-1", DESK, dec!(1000)));
        tables.participations.push(participation("FAC-1", "CP-1", dec!(0.6), true));
        tables.participations.push(participation("FAC-1", "CP-2", dec!(0.4), false));
        tables.lender_allocations.push(lender_allocation("FAC-1", "LE-US", dec!(0.7), dec!(700)));
        tables.lender_allocations.push(lender_allocation("FAC-1", "LE-UK", dec!(0.3), dec!(300)));
        tables.amendments.push(amendment("AMD-1", "FAC-1", "Covenant Waiver", date(2025, 1, 10)));
        tables.exposure_snapshots.push(exposure("FAC-1", date(2024, 12, 31), dec!(800), dec!(400)));
        tables.exposure_snapshots.push(exposure("FAC-1", as_of, dec!(900), dec!(450)));
        tables.collateral_snapshots.push(collateral("COL-1", "FAC-1", as_of, "Real Estate", dec!(300)));

        let mut matured = facility("FAC-2", "CP-2", DESK, dec!(500));
        matured.facility_status = FacilityStatus::Matured;
        matured.maturity_date = date(2024, 6, 30);
        tables.facilities.push(matured);
        tables.exposure_snapshots.push(exposure("FAC-2", as_of, dec!(100), dec!(100)));
        tables
    }

    fn assemble(tables: &SourceTables) -> Vec<FacilitySummary> {
        FacilitySummaryAssembler::new(tables, ReportingCalendar::default()).assemble()
    }

    fn validator(tables: &SourceTables) -> Validator<'_> {
        Validator::new(tables, ReportingCalendar::default(), ValidationThresholds::default())
    }

    #[test]
    fn test_consistent_pipeline_output_is_clean() {
        let tables = clean_tables();
        let facilities = assemble(&tables);
        let rollups = RollupAssembler::new(&tables, ReportingCalendar::default()).assemble(&facilities);
        let report = validator(&tables).validate(&facilities, Some(&rollups));
        assert!(report.is_clean(), "unexpected issues: {:?}", report.messages());
    }

    #[test]
    fn test_tampered_ratio_is_reported() {
        let tables = clean_tables();
        let mut facilities = assemble(&tables);
        facilities[0].utilization_pct = dec!(0.9);
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::RatioMismatch), 1);
        assert!(report.messages()[0].contains("utilization_pct"));
    }

    #[test]
    fn test_ratio_drift_within_tolerance_passes() {
        let tables = clean_tables();
        let mut facilities = assemble(&tables);
        facilities[0].coverage_ratio_pct += dec!(0.00005);
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::RatioMismatch), 0);
    }

    #[test]
    fn test_syndication_flag_mismatch() {
        let tables = clean_tables();
        let mut facilities = assemble(&tables);
        facilities[0].is_syndicated = false;
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::FlagMismatch), 2);
    }

    #[test]
    fn test_amendment_flag_mismatch() {
        let tables = clean_tables();
        let mut facilities = assemble(&tables);
        facilities[1].has_amendment = true;
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::FlagMismatch), 1);
    }

    #[test]
    fn test_dangling_reference_is_reported() {
        let mut tables = clean_tables();
        tables.participations.push(participation("FAC-2", "CP-9", dec!(1), true));
        let facilities = assemble(&tables);
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::ReferentialIntegrity), 1);
        assert!(report.messages()[0].contains("CP-9"));
    }

    #[test]
    fn test_duplicate_primary_key_is_reported_once() {
        let mut tables = clean_tables();
        tables.legal_entities.push(legal_entity("LE-US"));
        tables.legal_entities.push(legal_entity("LE-US"));
        let facilities = assemble(&tables);
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::DuplicateKey), 1);
    }

    #[test]
    fn test_missing_required_field() {
        let tables = clean_tables();
        let mut facilities = assemble(&tables);
        facilities[1].region = "  ".to_string();
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::MissingField), 1);
    }

    #[test]
    fn test_sanity_minimums() {
        let tables = clean_tables();
        let facilities = assemble(&tables);
        let thresholds = ValidationThresholds {
            min_syndicated_facilities: 2,
            ..ValidationThresholds::default()
        };
        let report = Validator::new(&tables, ReportingCalendar::default(), thresholds).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::SanityThreshold), 1);
    }

    #[test]
    fn test_all_active_portfolio_is_flagged() {
        let mut tables = clean_tables();
        tables.facilities[1].facility_status = FacilityStatus::Active;
        tables.facilities[1].maturity_date = date(2030, 1, 1);
        let facilities = assemble(&tables);
        let report = validator(&tables).validate(&facilities, None);
        assert_eq!(report.count(IssueCategory::SanityThreshold), 1);
        assert!(report.messages()[0].contains("inactive"));
    }

    #[test]
    fn test_rollup_conservation_break() {
        let tables = clean_tables();
        let facilities = assemble(&tables);
        let mut rollups = RollupAssembler::new(&tables, ReportingCalendar::default()).assemble(&facilities);
        rollups.lob_l1[0].metrics.total_exposure_usd += dec!(1);
        let report = validator(&tables).validate(&facilities, Some(&rollups));
        assert_eq!(report.count(IssueCategory::RollupConservation), 1);
    }
}
