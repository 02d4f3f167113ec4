use crate::assembly::facility_summary::FacilitySummary;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// Position of a group in the line-of-business tree.
///
/// Levels nest: a desk key carries all three segments, an L2 key the first
/// two, an L1 key only the first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupKey {
    Desk { l1: String, l2: String, l3: String },
    LobL2 { l1: String, l2: String },
    LobL1 { l1: String },
}

impl GroupKey {
    pub fn desk(row: &FacilitySummary) -> Self {
        GroupKey::Desk {
            l1: row.lob_l1.clone(),
            l2: row.lob_l2.clone(),
            l3: row.lob_l3.clone(),
        }
    }

    pub fn lob_l2(row: &FacilitySummary) -> Self {
        GroupKey::LobL2 {
            l1: row.lob_l1.clone(),
            l2: row.lob_l2.clone(),
        }
    }

    pub fn lob_l1(row: &FacilitySummary) -> Self {
        GroupKey::LobL1 {
            l1: row.lob_l1.clone(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Desk { l1, l2, l3 } => write!(f, "{l1} / {l2} / {l3}"),
            GroupKey::LobL2 { l1, l2 } => write!(f, "{l1} / {l2}"),
            GroupKey::LobL1 { l1 } => write!(f, "{l1}"),
        }
    }
}

/// Partition rows by `key_fn`, keeping groups in order of first occurrence
/// and rows in input order within each group.
pub fn group_in_order<'r, K, F>(rows: &'r [FacilitySummary], key_fn: F) -> Vec<(K, Vec<&'r FacilitySummary>)>
where
    K: Eq + Hash + Clone,
    F: Fn(&FacilitySummary) -> K,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'r FacilitySummary>)> = Vec::new();
    for row in rows {
        let key = key_fn(row);
        match positions.get(&key) {
            Some(&pos) => groups[pos].1.push(row),
            None => {
                positions.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    groups
}
