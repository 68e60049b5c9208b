//! Insertion-ordered frequency counting.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

/// Key → occurrence count, remembering the order keys were first seen.
///
/// Ranking is a stable sort by count, so equal counts keep first-seen order.
/// That tie order is a by-product of the aggregation pass; callers should not
/// rely on it.
#[derive(Clone, Debug, Default)]
pub struct FrequencyTable {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

/// One row of a ranked frequency table.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedCount {
    pub key: String,
    pub count: u64,
    /// Share of the owning total, 0 when the total is 0.
    pub percent: f64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        match self.index.get(key) {
            Some(&pos) => self.entries[pos].1 += 1,
            None => {
                self.index.insert(key.to_string(), self.entries.len());
                self.entries.push((key.to_string(), 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map_or(0, |&pos| self.entries[pos].1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Keys in first-seen order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// All entries sorted by count descending (stable).
    pub fn ranked(&self) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> =
            self.entries.iter().map(|(k, c)| (k.as_str(), *c)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Top `n` entries with their share of `total`.
    pub fn top(&self, n: usize, total: u64) -> Vec<RankedCount> {
        self.ranked()
            .into_iter()
            .take(n)
            .map(|(key, count)| RankedCount {
                key: key.to_string(),
                count,
                percent: share(count, total),
            })
            .collect()
    }

    /// Most frequent key; ties go to the first-seen key.
    pub fn mode(&self) -> Option<(&str, u64)> {
        self.ranked().into_iter().next()
    }
}

impl PartialEq for FrequencyTable {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = Self::new();
        for key in iter {
            table.add(key);
        }
        table
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, c)| (k, c)))
    }
}

/// `part / total * 100`, guarded to 0 when `total` is 0.
pub fn share(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_occurrences() {
        let table: FrequencyTable = ["a", "b", "a", "c", "a", "b"].into_iter().collect();
        assert_eq!(table.get("a"), 3);
        assert_eq!(table.get("b"), 2);
        assert_eq!(table.get("c"), 1);
        assert_eq!(table.get("missing"), 0);
        assert_eq!(table.len(), 3);
        assert_eq!(table.total(), 6);
    }

    #[test]
    fn ranked_is_descending_and_stable() {
        let table: FrequencyTable = ["x", "y", "z", "y", "z"].into_iter().collect();
        let ranked = table.ranked();
        assert_eq!(ranked[0].1, 2);
        assert_eq!(ranked[1].1, 2);
        assert_eq!(ranked[2], ("x", 1));
        // y was seen before z
        assert_eq!(ranked[0].0, "y");
    }

    #[test]
    fn top_limits_and_computes_share() {
        let table: FrequencyTable = ["a", "a", "a", "b"].into_iter().collect();
        let top = table.top(1, 4);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].key, "a");
        assert_eq!(top[0].percent, 75.0);
    }

    #[test]
    fn share_guards_zero_total() {
        assert_eq!(share(5, 0), 0.0);
        assert_eq!(share(1, 4), 25.0);
    }

    #[test]
    fn mode_of_empty_table() {
        assert!(FrequencyTable::new().mode().is_none());
    }
}
