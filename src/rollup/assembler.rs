use crate::assembly::facility_summary::FacilitySummary;
use crate::assembly::limits::LimitReading;
use crate::config::ReportingCalendar;
use crate::core::ids::CounterpartyId;
use crate::core::numeric::safe_ratio;
use crate::rollup::grouping::{group_in_order, GroupKey};
use crate::rollup::metrics::{GroupMetrics, PriorMonthLookup};
use crate::rollup::summary::{DeskRange, DeskSummary, LobL1Summary, LobL2Summary, RollupOutput};
use crate::source::event::{LimitDefinition, LimitScope, LimitUtilizationEvent};
use crate::source::index::{select_as_of, TableIndex};
use crate::source::tables::SourceTables;
use log::debug;
use std::collections::{HashMap, HashSet};

/// Re-aggregates facility summaries into desk, L2 and L1 groups.
///
/// Groups appear in order of their first facility. Output is a pure
/// function of the facility rows and the source tables: running twice on the
/// same inputs gives identical results.
pub struct RollupAssembler<'a> {
    calendar: ReportingCalendar,
    prior: PriorMonthLookup<'a>,
    lob_limits: TableIndex<'a, String, LimitDefinition>,
    utilizations: TableIndex<'a, String, LimitUtilizationEvent>,
}

impl<'a> RollupAssembler<'a> {
    pub fn new(tables: &'a SourceTables, calendar: ReportingCalendar) -> Self {
        Self {
            calendar,
            prior: PriorMonthLookup::new(tables, calendar),
            lob_limits: TableIndex::build_filtered(&tables.limits, |l| match l.scope {
                LimitScope::LobL2 => l.lob_l2.clone(),
                LimitScope::Counterparty => None,
            }),
            utilizations: TableIndex::build(&tables.limit_utilizations, |u| u.limit_id.clone()),
        }
    }

    pub fn assemble(&self, facilities: &[FacilitySummary]) -> RollupOutput {
        let desks = self.desk_summaries(facilities);
        let lob_l2 = self.lob_l2_summaries(facilities, &desks);
        let lob_l1 = self.lob_l1_summaries(facilities, &desks);
        debug!(
            "rolled {} facilities into {} desks, {} L2 and {} L1 groups",
            facilities.len(),
            desks.len(),
            lob_l2.len(),
            lob_l1.len()
        );
        RollupOutput {
            desks,
            lob_l2,
            lob_l1,
        }
    }

    pub fn desk_summaries(&self, facilities: &[FacilitySummary]) -> Vec<DeskSummary> {
        group_in_order(facilities, GroupKey::desk)
            .into_iter()
            .map(|(_, rows)| {
                let first = rows[0];
                DeskSummary {
                    lob_l1: first.lob_l1.clone(),
                    lob_l2: first.lob_l2.clone(),
                    lob_l3: first.lob_l3.clone(),
                    metrics: GroupMetrics::compute(&rows, &self.prior),
                }
            })
            .collect()
    }

    /// The first limit on the row's L2 that is unscoped or scoped to its L1.
    fn lob_limit(&self, row: &FacilitySummary) -> Option<&'a LimitDefinition> {
        self.lob_limits
            .get(&row.lob_l2)
            .iter()
            .copied()
            .find(|def| def.lob_l1.as_deref().map_or(true, |l1| l1 == row.lob_l1))
    }

    pub fn lob_l2_summaries(&self, facilities: &[FacilitySummary], desks: &[DeskSummary]) -> Vec<LobL2Summary> {
        let interconnected = interconnected_counterparties(facilities);
        group_in_order(facilities, GroupKey::lob_l2)
            .into_iter()
            .map(|(_, rows)| {
                let first = rows[0];
                let metrics = GroupMetrics::compute(&rows, &self.prior);
                let child_desks: Vec<&DeskSummary> = desks
                    .iter()
                    .filter(|d| d.lob_l1 == first.lob_l1 && d.lob_l2 == first.lob_l2)
                    .collect();

                let mut counterparties: Vec<&CounterpartyId> =
                    rows.iter().map(|r| &r.counterparty_id).collect();
                counterparties.sort();
                counterparties.dedup();
                let interconnected_count = counterparties
                    .iter()
                    .filter(|cp| interconnected.contains(**cp))
                    .count();

                let limit = self.lob_limit(first).map(|def| {
                    let event = select_as_of(self.utilizations.get(&def.limit_id), self.calendar.as_of_date);
                    LimitReading::evaluate(def, event, metrics.total_exposure_usd)
                });

                LobL2Summary {
                    lob_l1: first.lob_l1.clone(),
                    lob_l2: first.lob_l2.clone(),
                    desk_count: child_desks.len(),
                    desk_range: DeskRange::from_desks(child_desks),
                    interconnected_counterparty_count: interconnected_count,
                    doi_pct: safe_ratio(interconnected_count.into(), counterparties.len().into()),
                    lob_limit_id: limit.as_ref().map(|l| l.limit_id.clone()),
                    lob_limit_amount_usd: limit.as_ref().map(|l| l.limit_amount_usd),
                    lob_limit_utilized_usd: limit.as_ref().map(|l| l.utilized_amount_usd),
                    lob_limit_headroom_usd: limit.as_ref().map(|l| l.headroom_usd),
                    lob_limit_utilization_pct: limit.as_ref().map(|l| l.utilization_pct),
                    lob_limit_status: limit.as_ref().map(|l| l.status),
                    metrics,
                }
            })
            .collect()
    }

    pub fn lob_l1_summaries(&self, facilities: &[FacilitySummary], desks: &[DeskSummary]) -> Vec<LobL1Summary> {
        group_in_order(facilities, GroupKey::lob_l1)
            .into_iter()
            .map(|(_, rows)| {
                let first = rows[0];
                let child_desks: Vec<&DeskSummary> =
                    desks.iter().filter(|d| d.lob_l1 == first.lob_l1).collect();
                let l2_count = child_desks
                    .iter()
                    .map(|d| d.lob_l2.as_str())
                    .collect::<HashSet<_>>()
                    .len();
                LobL1Summary {
                    lob_l1: first.lob_l1.clone(),
                    lob_l2_count: l2_count,
                    desk_count: child_desks.len(),
                    desk_range: DeskRange::from_desks(child_desks),
                    metrics: GroupMetrics::compute(&rows, &self.prior),
                }
            })
            .collect()
    }
}

/// Counterparties with facilities in more than one L2 group.
pub fn interconnected_counterparties(facilities: &[FacilitySummary]) -> HashSet<CounterpartyId> {
    let mut groups: HashMap<&CounterpartyId, HashSet<GroupKey>> = HashMap::new();
    for row in facilities {
        groups
            .entry(&row.counterparty_id)
            .or_default()
            .insert(GroupKey::lob_l2(row));
    }
    groups
        .into_iter()
        .filter(|(_, keys)| keys.len() > 1)
        .map(|(cp, _)| cp.clone())
        .collect()
}
