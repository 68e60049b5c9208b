//! Per-period aggregate produced by [`crate::extract::extract`].

use std::collections::BTreeSet;

use serde::Serialize;

use crate::freq::FrequencyTable;

/// min / max / mean / median of one numeric column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Stats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// `None` for an empty slice. Median of an even-length sample is the mean
    /// of the two middle values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };
        Some(Self {
            min: sorted[0],
            max: sorted[n - 1],
            mean: sorted.iter().sum::<f64>() / n as f64,
            median,
        })
    }
}

/// Load-average statistics for the three kernel windows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LoadStats {
    pub m1: Stats,
    pub m5: Stats,
    pub m15: Stats,
}

/// Observation whose duration exceeded the long-query threshold.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LongQuery {
    pub duration: f64,
    pub application: String,
    pub wait_event: String,
    pub wait_event_type: String,
    pub preview: String,
}

/// Observation waiting on a heavyweight lock (`wait_event_type == "Lock"`).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LockWait {
    pub duration: f64,
    pub application: String,
    /// Lock category, e.g. `transactionid`, `tuple`, `relation`.
    pub wait_event: String,
    pub preview: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub snapshot_count: usize,
    pub load: LoadStats,
    pub active_queries: Stats,
    pub wait_events: FrequencyTable,
    pub wait_event_types: FrequencyTable,
    pub applications: FrequencyTable,
    pub users: FrequencyTable,
    /// 15-word prefixes of query previews.
    pub query_patterns: FrequencyTable,
    /// One entry per observation, in traversal order.
    pub query_durations: Vec<f64>,
    pub transaction_durations: Vec<f64>,
    pub query_signatures: BTreeSet<String>,
    pub total_queries: usize,
    pub long_queries: Vec<LongQuery>,
    pub lock_waits: Vec<LockWait>,
}

impl MetricsSummary {
    /// Statistics over every observed query duration, `None` if no queries.
    pub fn duration_stats(&self) -> Option<Stats> {
        Stats::from_values(&self.query_durations)
    }

    /// Statistics over every observed transaction age, `None` if no queries.
    pub fn transaction_duration_stats(&self) -> Option<Stats> {
        Stats::from_values(&self.transaction_durations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_odd_sample() {
        let s = Stats::from_values(&[3.0, 1.0, 2.0]).unwrap();
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.median, 2.0);
    }

    #[test]
    fn stats_even_sample_median_is_midpoint() {
        let s = Stats::from_values(&[4.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(s.median, 2.5);
        assert_eq!(s.mean, 2.5);
    }

    #[test]
    fn stats_empty() {
        assert!(Stats::from_values(&[]).is_none());
    }
}
