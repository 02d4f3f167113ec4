use chrono::NaiveDate;
use std::collections::HashMap;
use std::hash::Hash;

/// Build-once multimap from a join key to the rows that carry it.
///
/// Built in a single pass over a source table before any lookups happen,
/// like the build side of a hash join. Rows keep their table order within
/// each key. A lookup on an unknown key yields an empty slice.
#[derive(Debug)]
pub struct TableIndex<'a, K, T> {
    rows: HashMap<K, Vec<&'a T>>,
}

impl<'a, K: Eq + Hash, T> TableIndex<'a, K, T> {
    /// Index every row under the key returned by `key_fn`.
    pub fn build(table: &'a [T], key_fn: impl Fn(&T) -> K) -> Self {
        let mut rows: HashMap<K, Vec<&'a T>> = HashMap::new();
        for row in table {
            rows.entry(key_fn(row)).or_default().push(row);
        }
        Self { rows }
    }

    /// Index only rows for which `key_fn` yields a key.
    pub fn build_filtered(table: &'a [T], key_fn: impl Fn(&T) -> Option<K>) -> Self {
        let mut rows: HashMap<K, Vec<&'a T>> = HashMap::new();
        for row in table {
            if let Some(key) = key_fn(row) {
                rows.entry(key).or_default().push(row);
            }
        }
        Self { rows }
    }

    pub fn get(&self, key: &K) -> &[&'a T] {
        self.rows.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first(&self, key: &K) -> Option<&'a T> {
        self.get(key).first().copied()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.rows.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A row that belongs to a dated series.
pub trait Dated {
    fn as_of_date(&self) -> NaiveDate;
}

/// Pick the row for `date` from a dated series.
///
/// An exact date match wins. Otherwise the most recent row dated before
/// `date` is returned. Rows dated after `date` are never picked, so the
/// result is `None` when the series starts later than `date`. If several
/// rows share the winning date, the first in table order wins.
pub fn select_as_of<'a, T: Dated>(rows: &[&'a T], date: NaiveDate) -> Option<&'a T> {
    let mut best: Option<&'a T> = None;
    for &row in rows {
        let row_date = row.as_of_date();
        if row_date > date {
            continue;
        }
        match best {
            Some(current) if current.as_of_date() >= row_date => {}
            _ => best = Some(row),
        }
    }
    best
}

/// The row dated exactly `date`, with no fallback to earlier rows. The
/// first in table order wins when several share the date.
pub fn select_on<'a, T: Dated>(rows: &[&'a T], date: NaiveDate) -> Option<&'a T> {
    rows.iter().copied().find(|row| row.as_of_date() == date)
}

/// All rows dated exactly on the date [`select_as_of`] resolves to.
pub fn select_all_as_of<'a, T: Dated>(rows: &[&'a T], date: NaiveDate) -> Vec<&'a T> {
    match select_as_of(rows, date) {
        Some(anchor) => {
            let anchor_date = anchor.as_of_date();
            rows.iter()
                .copied()
                .filter(|row| row.as_of_date() == anchor_date)
                .collect()
        }
        None => Vec::new(),
    }
}

/// The current and comparison rows of a dated series.
#[derive(Debug, Clone, Copy)]
pub struct LatestAndPrior<'a, T> {
    pub latest: Option<&'a T>,
    pub prior: Option<&'a T>,
}

/// Select the row for `as_of` and the row for `prior_date`.
///
/// When no row resolves for the prior date, the latest row stands in for it,
/// so a one-entry series shows zero month-over-month change.
pub fn latest_and_prior<'a, T: Dated>(
    rows: &[&'a T],
    as_of: NaiveDate,
    prior_date: NaiveDate,
) -> LatestAndPrior<'a, T> {
    let latest = select_as_of(rows, as_of);
    let prior = select_as_of(rows, prior_date).or(latest);
    LatestAndPrior { latest, prior }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Row {
        key: &'static str,
        date: NaiveDate,
        value: u32,
    }

    impl Dated for Row {
        fn as_of_date(&self) -> NaiveDate {
            self.date
        }
    }

    fn ymd(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        ymd(2025, m, day)
    }

    fn rows() -> Vec<Row> {
        vec![
            Row { key: "A", date: d(1, 31), value: 3 },
            Row { key: "A", date: ymd(2024, 11, 30), value: 1 },
            Row { key: "B", date: d(1, 31), value: 9 },
            Row { key: "A", date: ymd(2024, 12, 31), value: 2 },
        ]
    }

    #[test]
    fn test_index_groups_in_table_order() {
        let table = rows();
        let index = TableIndex::build(&table, |r| r.key);
        let a: Vec<u32> = index.get(&"A").iter().map(|r| r.value).collect();
        assert_eq!(a, vec![3, 1, 2]);
        assert_eq!(index.get(&"B").len(), 1);
        assert!(index.get(&"Z").is_empty());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_select_exact_match() {
        let table = rows();
        let index = TableIndex::build(&table, |r| r.key);
        let picked = select_as_of(index.get(&"A"), d(1, 31)).unwrap();
        assert_eq!(picked.value, 3);
    }

    #[test]
    fn test_select_falls_back_to_earlier() {
        let table = rows();
        let index = TableIndex::build(&table, |r| r.key);
        // Mid-January: latest row on or before is 2024-12-31
        let picked = select_as_of(index.get(&"A"), d(1, 15)).unwrap();
        assert_eq!(picked.value, 2);
    }

    #[test]
    fn test_select_never_picks_future_rows() {
        let table = rows();
        let index = TableIndex::build(&table, |r| r.key);
        assert!(select_as_of(index.get(&"B"), d(1, 30)).is_none());
    }

    #[test]
    fn test_select_on_requires_exact_date() {
        let table = rows();
        let index = TableIndex::build(&table, |r| r.key);
        assert_eq!(select_on(index.get(&"A"), d(1, 31)).map(|r| r.value), Some(3));
        assert_eq!(select_on(index.get(&"A"), ymd(2024, 12, 31)).map(|r| r.value), Some(2));
        // select_as_of would fall back to 2024-12-31 here
        assert!(select_on(index.get(&"A"), d(1, 15)).is_none());
    }

    #[test]
    fn test_latest_and_prior_single_row() {
        let table = rows();
        let index = TableIndex::build(&table, |r| r.key);
        let pick = latest_and_prior(index.get(&"B"), d(1, 31), d(1, 1));
        assert_eq!(pick.latest.map(|r| r.value), Some(9));
        assert_eq!(pick.prior.map(|r| r.value), Some(9));
    }

    #[test]
    fn test_select_all_as_of() {
        let table = vec![
            Row { key: "A", date: d(1, 31), value: 1 },
            Row { key: "A", date: d(1, 31), value: 2 },
            Row { key: "A", date: d(1, 15), value: 3 },
        ];
        let index = TableIndex::build(&table, |r| r.key);
        let picked: Vec<u32> = select_all_as_of(index.get(&"A"), d(2, 1))
            .iter()
            .map(|r| r.value)
            .collect();
        assert_eq!(picked, vec![1, 2]);
    }
}
