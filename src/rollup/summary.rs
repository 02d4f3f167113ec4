use crate::assembly::limits::LimitStatus;
use crate::rollup::metrics::GroupMetrics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One operating desk: a full (L1, L2, L3) path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskSummary {
    pub lob_l1: String,
    pub lob_l2: String,
    pub lob_l3: String,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
}

/// The desks with the highest and lowest total exposure below a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskRange {
    pub top_desk: Option<String>,
    pub top_desk_exposure_usd: Option<Decimal>,
    pub bottom_desk: Option<String>,
    pub bottom_desk_exposure_usd: Option<Decimal>,
}

impl DeskRange {
    /// Scan desks in order; on equal exposure the earlier desk is kept.
    pub fn from_desks<'d>(desks: impl IntoIterator<Item = &'d DeskSummary>) -> Self {
        let mut top: Option<&DeskSummary> = None;
        let mut bottom: Option<&DeskSummary> = None;
        for desk in desks {
            let exposure = desk.metrics.total_exposure_usd;
            if top.map_or(true, |t| exposure > t.metrics.total_exposure_usd) {
                top = Some(desk);
            }
            if bottom.map_or(true, |b| exposure < b.metrics.total_exposure_usd) {
                bottom = Some(desk);
            }
        }
        Self {
            top_desk: top.map(|d| d.lob_l3.clone()),
            top_desk_exposure_usd: top.map(|d| d.metrics.total_exposure_usd),
            bottom_desk: bottom.map(|d| d.lob_l3.clone()),
            bottom_desk_exposure_usd: bottom.map(|d| d.metrics.total_exposure_usd),
        }
    }
}

/// An L2 line of business with interconnectedness and limit monitoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobL2Summary {
    pub lob_l1: String,
    pub lob_l2: String,
    pub desk_count: usize,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
    #[serde(flatten)]
    pub desk_range: DeskRange,

    /// Counterparties of this group that also borrow in another L2 group.
    pub interconnected_counterparty_count: usize,
    pub doi_pct: Decimal,

    pub lob_limit_id: Option<String>,
    pub lob_limit_amount_usd: Option<Decimal>,
    pub lob_limit_utilized_usd: Option<Decimal>,
    pub lob_limit_headroom_usd: Option<Decimal>,
    pub lob_limit_utilization_pct: Option<Decimal>,
    pub lob_limit_status: Option<LimitStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LobL1Summary {
    pub lob_l1: String,
    pub lob_l2_count: usize,
    pub desk_count: usize,
    #[serde(flatten)]
    pub metrics: GroupMetrics,
    #[serde(flatten)]
    pub desk_range: DeskRange,
}

/// The three rollup levels of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollupOutput {
    pub desks: Vec<DeskSummary>,
    pub lob_l2: Vec<LobL2Summary>,
    pub lob_l1: Vec<LobL1Summary>,
}
