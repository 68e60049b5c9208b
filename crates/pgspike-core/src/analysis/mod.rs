//! Comparative analysis of a baseline period against a variant period.
//!
//! [`compare`] turns two [`MetricsSummary`] values into a [`ComparisonReport`]:
//! numeric deltas, set differences of query signatures and applications,
//! ranked frequency tables and the lock-contention breakdown.
//! [`findings::derive_findings`] then applies fixed threshold rules to it.

pub mod findings;
pub mod locks;

use std::collections::HashSet;

use serde::Serialize;

use crate::freq::{FrequencyTable, RankedCount, share};
use crate::model::{LoadStats, LongQuery, MetricsSummary, Stats};

pub use findings::{Finding, Severity, derive_findings};
pub use locks::{HEADLINE_LOCK_TYPES, LockBreakdown, LockCategory};

/// Length of every ranked frequency table in the report.
pub const TOP_N: usize = 10;

/// Wait-type share moves at or below this many percentage points are ignored.
pub const WAIT_SHIFT_MIN_PP: f64 = 1.0;

/// Number of wait-type share shifts kept.
pub const WAIT_SHIFT_LIMIT: usize = 5;

// ============================================================
// Report types
// ============================================================

/// The same quantity for both periods.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PeriodPair<T> {
    pub baseline: T,
    pub variant: T,
}

/// Absolute and relative change of one metric.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Delta {
    pub baseline: f64,
    pub variant: f64,
    pub change: f64,
    /// 0 when `baseline` is 0, whatever the variant value.
    pub percent: f64,
}

impl Delta {
    pub fn new(baseline: f64, variant: f64) -> Self {
        Self {
            baseline,
            variant,
            change: variant - baseline,
            percent: percent_change(baseline, variant),
        }
    }
}

/// `(variant - baseline) / baseline * 100`, or 0 for a zero baseline.
pub fn percent_change(baseline: f64, variant: f64) -> f64 {
    if baseline == 0.0 {
        0.0
    } else {
        (variant - baseline) / baseline * 100.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DurationComparison {
    pub baseline: Stats,
    pub variant: Stats,
    pub mean: Delta,
}

/// A count of classified observations and its share of all observations.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ClassCount {
    pub count: usize,
    pub percent: f64,
}

impl ClassCount {
    fn new(count: usize, total: usize) -> Self {
        Self {
            count,
            percent: share(count as u64, total as u64),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SignatureDiff {
    pub both: Vec<String>,
    pub only_baseline: Vec<String>,
    pub only_variant: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ApplicationDiff {
    /// Seen only in the variant; counts and shares from the variant period.
    pub appeared: Vec<RankedCount>,
    /// Seen only in the baseline; counts and shares from the baseline period.
    pub disappeared: Vec<RankedCount>,
}

/// Movement of one key's share of total queries between periods.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ShareShift {
    pub key: String,
    pub variant_count: u64,
    pub baseline_percent: f64,
    pub variant_percent: f64,
    /// Percentage points.
    pub change: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub snapshots: PeriodPair<usize>,
    pub total_queries: PeriodPair<usize>,
    pub unique_signatures: PeriodPair<usize>,
    pub load: PeriodPair<LoadStats>,
    /// Change of the mean 1-minute load average.
    pub load_change: Delta,
    pub active_queries: PeriodPair<Stats>,
    pub active_change: Delta,
    /// `None` unless both periods observed at least one query.
    pub durations: Option<DurationComparison>,
    /// Same as `durations`, over transaction ages.
    pub transaction_durations: Option<DurationComparison>,
    pub long_queries: PeriodPair<ClassCount>,
    /// Variant long queries, longest first; equal durations keep traversal order.
    pub variant_long_queries: Vec<LongQuery>,
    pub lock_waits: PeriodPair<ClassCount>,
    /// Breakdown of the variant period's lock waits.
    pub locks: LockBreakdown,
    pub signatures: SignatureDiff,
    pub applications: ApplicationDiff,
    pub top_applications: PeriodPair<Vec<RankedCount>>,
    pub top_users: PeriodPair<Vec<RankedCount>>,
    pub top_query_patterns: PeriodPair<Vec<RankedCount>>,
    pub top_wait_event_types: PeriodPair<Vec<RankedCount>>,
    pub top_wait_events: PeriodPair<Vec<RankedCount>>,
    /// Variant's top applications against their baseline share.
    pub application_shifts: Vec<ShareShift>,
    /// Wait types whose share moved by more than [`WAIT_SHIFT_MIN_PP`].
    pub wait_type_shifts: Vec<ShareShift>,
}

// ============================================================
// Comparison
// ============================================================

/// Compare a variant period against its baseline.
///
/// Trusts both summaries to come from [`crate::extract::extract`]; degenerate
/// values (zero baselines, zero totals, empty sets) produce zeros and empty
/// lists rather than errors.
pub fn compare(baseline: &MetricsSummary, variant: &MetricsSummary) -> ComparisonReport {
    let totals = PeriodPair {
        baseline: baseline.total_queries,
        variant: variant.total_queries,
    };

    let mut variant_long_queries = variant.long_queries.clone();
    variant_long_queries.sort_by(|a, b| b.duration.total_cmp(&a.duration));

    ComparisonReport {
        snapshots: PeriodPair {
            baseline: baseline.snapshot_count,
            variant: variant.snapshot_count,
        },
        total_queries: totals,
        unique_signatures: PeriodPair {
            baseline: baseline.query_signatures.len(),
            variant: variant.query_signatures.len(),
        },
        load: PeriodPair {
            baseline: baseline.load,
            variant: variant.load,
        },
        load_change: Delta::new(baseline.load.m1.mean, variant.load.m1.mean),
        active_queries: PeriodPair {
            baseline: baseline.active_queries,
            variant: variant.active_queries,
        },
        active_change: Delta::new(baseline.active_queries.mean, variant.active_queries.mean),
        durations: duration_comparison(baseline.duration_stats(), variant.duration_stats()),
        transaction_durations: duration_comparison(
            baseline.transaction_duration_stats(),
            variant.transaction_duration_stats(),
        ),
        long_queries: PeriodPair {
            baseline: ClassCount::new(baseline.long_queries.len(), totals.baseline),
            variant: ClassCount::new(variant.long_queries.len(), totals.variant),
        },
        variant_long_queries,
        lock_waits: PeriodPair {
            baseline: ClassCount::new(baseline.lock_waits.len(), totals.baseline),
            variant: ClassCount::new(variant.lock_waits.len(), totals.variant),
        },
        locks: locks::breakdown(&variant.lock_waits),
        signatures: signature_diff(baseline, variant),
        applications: application_diff(baseline, variant),
        top_applications: top_pair(baseline, variant, |m| &m.applications),
        top_users: top_pair(baseline, variant, |m| &m.users),
        top_query_patterns: top_pair(baseline, variant, |m| &m.query_patterns),
        top_wait_event_types: top_pair(baseline, variant, |m| &m.wait_event_types),
        top_wait_events: top_pair(baseline, variant, |m| &m.wait_events),
        application_shifts: application_shifts(baseline, variant),
        wait_type_shifts: wait_type_shifts(baseline, variant),
    }
}

fn duration_comparison(
    baseline: Option<Stats>,
    variant: Option<Stats>,
) -> Option<DurationComparison> {
    let (b, v) = (baseline?, variant?);
    Some(DurationComparison {
        baseline: b,
        variant: v,
        mean: Delta::new(b.mean, v.mean),
    })
}

fn top_pair(
    baseline: &MetricsSummary,
    variant: &MetricsSummary,
    pick: fn(&MetricsSummary) -> &FrequencyTable,
) -> PeriodPair<Vec<RankedCount>> {
    PeriodPair {
        baseline: pick(baseline).top(TOP_N, baseline.total_queries as u64),
        variant: pick(variant).top(TOP_N, variant.total_queries as u64),
    }
}

fn signature_diff(baseline: &MetricsSummary, variant: &MetricsSummary) -> SignatureDiff {
    let b = &baseline.query_signatures;
    let v = &variant.query_signatures;
    SignatureDiff {
        both: b.intersection(v).cloned().collect(),
        only_baseline: b.difference(v).cloned().collect(),
        only_variant: v.difference(b).cloned().collect(),
    }
}

/// Keys of `owner` missing from `other`, ordered by descending count in `owner`.
fn missing_from(owner: &MetricsSummary, other: &MetricsSummary) -> Vec<RankedCount> {
    let total = owner.total_queries as u64;
    owner
        .applications
        .ranked()
        .into_iter()
        .filter(|(app, _)| !other.applications.contains(app))
        .map(|(app, count)| RankedCount {
            key: app.to_string(),
            count,
            percent: share(count, total),
        })
        .collect()
}

fn application_diff(baseline: &MetricsSummary, variant: &MetricsSummary) -> ApplicationDiff {
    ApplicationDiff {
        appeared: missing_from(variant, baseline),
        disappeared: missing_from(baseline, variant),
    }
}

fn application_shifts(baseline: &MetricsSummary, variant: &MetricsSummary) -> Vec<ShareShift> {
    let b_total = baseline.total_queries as u64;
    variant
        .applications
        .top(TOP_N, variant.total_queries as u64)
        .into_iter()
        .map(|row| {
            let baseline_percent = share(baseline.applications.get(&row.key), b_total);
            ShareShift {
                change: row.percent - baseline_percent,
                key: row.key,
                variant_count: row.count,
                baseline_percent,
                variant_percent: row.percent,
            }
        })
        .collect()
}

fn wait_type_shifts(baseline: &MetricsSummary, variant: &MetricsSummary) -> Vec<ShareShift> {
    let b_total = baseline.total_queries as u64;
    let v_total = variant.total_queries as u64;

    let mut seen = HashSet::new();
    let keys = baseline
        .wait_event_types
        .keys()
        .chain(variant.wait_event_types.keys())
        .filter(|k| seen.insert(*k));

    let mut shifts: Vec<ShareShift> = keys
        .map(|key| {
            let variant_count = variant.wait_event_types.get(key);
            let baseline_percent = share(baseline.wait_event_types.get(key), b_total);
            let variant_percent = share(variant_count, v_total);
            ShareShift {
                key: key.to_string(),
                variant_count,
                baseline_percent,
                variant_percent,
                change: variant_percent - baseline_percent,
            }
        })
        .filter(|s| s.change.abs() > WAIT_SHIFT_MIN_PP)
        .collect();
    shifts.sort_by(|a, b| b.change.abs().total_cmp(&a.change.abs()));
    shifts.truncate(WAIT_SHIFT_LIMIT);
    shifts
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::model::{QueryObservation, Snapshot};

    pub(crate) fn make_query(
        duration: f64,
        app: &str,
        wait_type: &str,
        wait: &str,
        preview: &str,
    ) -> QueryObservation {
        QueryObservation {
            wait_event: wait.to_string(),
            wait_event_type: wait_type.to_string(),
            query_duration_sec: duration,
            application_name: app.to_string(),
            query_preview: preview.to_string(),
            ..QueryObservation::default()
        }
    }

    pub(crate) fn make_snapshot(load: f64, queries: Vec<QueryObservation>) -> Snapshot {
        Snapshot {
            load_avg_1m: load,
            load_avg_5m: load,
            load_avg_15m: load,
            active_query_count: queries.len() as u64,
            queries,
        }
    }

    pub(crate) fn summarize(snapshots: Vec<Snapshot>) -> MetricsSummary {
        extract(&snapshots).unwrap()
    }

    #[test]
    fn percent_change_guards_zero_baseline() {
        assert_eq!(percent_change(0.0, 42.0), 0.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(2.0, 3.0), 50.0);
        assert_eq!(percent_change(4.0, 1.0), -75.0);
    }

    #[test]
    fn delta_fields() {
        let d = Delta::new(2.0, 5.0);
        assert_eq!(d.change, 3.0);
        assert_eq!(d.percent, 150.0);
    }

    #[test]
    fn load_delta_uses_one_minute_mean() {
        let b = summarize(vec![make_snapshot(2.0, vec![]), make_snapshot(4.0, vec![])]);
        let v = summarize(vec![make_snapshot(6.0, vec![])]);
        let r = compare(&b, &v);
        assert_eq!(r.load_change.baseline, 3.0);
        assert_eq!(r.load_change.variant, 6.0);
        assert_eq!(r.load_change.percent, 100.0);
    }

    #[test]
    fn zero_baseline_load_gives_zero_percent() {
        let b = summarize(vec![make_snapshot(0.0, vec![])]);
        let v = summarize(vec![make_snapshot(9.0, vec![])]);
        let r = compare(&b, &v);
        assert_eq!(r.load_change.change, 9.0);
        assert_eq!(r.load_change.percent, 0.0);
        assert_eq!(r.active_change.percent, 0.0);
    }

    #[test]
    fn signature_set_algebra() {
        let b = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "a", "IO", "x", "SELECT 1"),
                make_query(1.0, "a", "IO", "x", "SELECT 2"),
                make_query(1.0, "a", "IO", "x", "SELECT 3"),
            ],
        )]);
        let v = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "a", "IO", "x", "SELECT 3"),
                make_query(1.0, "a", "IO", "x", "SELECT  4"),
            ],
        )]);
        let r = compare(&b, &v);
        let union: std::collections::BTreeSet<_> =
            b.query_signatures.union(&v.query_signatures).collect();
        assert_eq!(
            r.signatures.both.len()
                + r.signatures.only_baseline.len()
                + r.signatures.only_variant.len(),
            union.len()
        );
        assert_eq!(r.signatures.both, vec!["SELECT 3".to_string()]);
        assert_eq!(r.signatures.only_variant, vec!["SELECT 4".to_string()]);
        assert_eq!(r.signatures.only_baseline.len(), 2);
    }

    #[test]
    fn application_diff_uses_owning_counts() {
        let b = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "shared", "IO", "x", "q"),
                make_query(1.0, "gone", "IO", "x", "q"),
                make_query(1.0, "gone", "IO", "x", "q"),
            ],
        )]);
        let v = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "shared", "IO", "x", "q"),
                make_query(1.0, "rare", "IO", "x", "q"),
                make_query(1.0, "new", "IO", "x", "q"),
                make_query(1.0, "new", "IO", "x", "q"),
                make_query(1.0, "new", "IO", "x", "q"),
            ],
        )]);
        let r = compare(&b, &v);
        assert_eq!(r.applications.appeared.len(), 2);
        assert_eq!(r.applications.appeared[0].key, "new");
        assert_eq!(r.applications.appeared[0].count, 3);
        assert_eq!(r.applications.appeared[0].percent, 60.0);
        assert_eq!(r.applications.appeared[1].key, "rare");
        assert_eq!(r.applications.disappeared.len(), 1);
        assert_eq!(r.applications.disappeared[0].key, "gone");
        assert_eq!(r.applications.disappeared[0].count, 2);
    }

    #[test]
    fn long_queries_sorted_descending_and_stable() {
        let v = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(20.0, "first", "IO", "x", "q"),
                make_query(50.0, "longest", "IO", "x", "q"),
                make_query(20.0, "second", "IO", "x", "q"),
                make_query(11.0, "short", "IO", "x", "q"),
            ],
        )]);
        let b = summarize(vec![make_snapshot(1.0, vec![])]);
        let r = compare(&b, &v);
        let apps: Vec<&str> = r
            .variant_long_queries
            .iter()
            .map(|q| q.application.as_str())
            .collect();
        assert_eq!(apps, vec!["longest", "first", "second", "short"]);
        assert_eq!(r.long_queries.variant.count, 4);
        assert_eq!(r.long_queries.baseline.count, 0);
    }

    #[test]
    fn durations_omitted_without_queries() {
        let b = summarize(vec![make_snapshot(1.0, vec![])]);
        let v = summarize(vec![make_snapshot(1.0, vec![make_query(3.0, "a", "IO", "x", "q")])]);
        let r = compare(&b, &v);
        assert!(r.durations.is_none());
        assert_eq!(r.long_queries.baseline.percent, 0.0);
        assert_eq!(r.top_applications.baseline, vec![]);
    }

    #[test]
    fn durations_compared_on_mean() {
        let b = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "a", "IO", "x", "q"),
                make_query(3.0, "a", "IO", "x", "q"),
            ],
        )]);
        let v = summarize(vec![make_snapshot(1.0, vec![make_query(6.0, "a", "IO", "x", "q")])]);
        let d = compare(&b, &v).durations.unwrap();
        assert_eq!(d.baseline.mean, 2.0);
        assert_eq!(d.variant.max, 6.0);
        assert_eq!(d.mean.change, 4.0);
        assert_eq!(d.mean.percent, 200.0);
    }

    #[test]
    fn transaction_durations_compared_separately() {
        let in_tx = |tx: f64| QueryObservation {
            transaction_duration_sec: tx,
            ..make_query(1.0, "a", "IO", "x", "q")
        };
        let b = summarize(vec![make_snapshot(1.0, vec![in_tx(4.0), in_tx(8.0)])]);
        let v = summarize(vec![make_snapshot(1.0, vec![in_tx(30.0)])]);
        let r = compare(&b, &v);

        let tx = r.transaction_durations.unwrap();
        assert_eq!(tx.baseline.mean, 6.0);
        assert_eq!(tx.variant.median, 30.0);
        assert_eq!(tx.mean.change, 24.0);
        assert_eq!(tx.mean.percent, 400.0);
        // query durations are untouched by transaction ages
        assert_eq!(r.durations.unwrap().mean.change, 0.0);
    }

    #[test]
    fn empty_variant_shares_are_zero() {
        let b = summarize(vec![make_snapshot(
            2.0,
            vec![
                make_query(30.0, "api", "Lock", "tuple", "UPDATE t SET x = 1"),
                make_query(1.0, "api", "IO", "DataFileRead", "SELECT 1"),
            ],
        )]);
        let v = summarize(vec![make_snapshot(2.0, vec![])]);
        let r = compare(&b, &v);

        assert_eq!(r.total_queries.variant, 0);
        assert_eq!(r.long_queries.variant.count, 0);
        assert_eq!(r.long_queries.variant.percent, 0.0);
        assert_eq!(r.lock_waits.variant.percent, 0.0);
        assert_eq!(r.long_queries.baseline.percent, 50.0);
        assert!(r.durations.is_none());
        assert!(r.transaction_durations.is_none());

        for pair in [
            &r.top_applications,
            &r.top_users,
            &r.top_query_patterns,
            &r.top_wait_event_types,
            &r.top_wait_events,
        ] {
            assert!(pair.variant.is_empty());
            assert!(!pair.baseline.is_empty());
        }
        assert!(r.application_shifts.is_empty());
        assert_eq!(r.applications.disappeared[0].key, "api");

        // both baseline wait types lose their full 50% share
        assert_eq!(r.wait_type_shifts.len(), 2);
        for shift in &r.wait_type_shifts {
            assert_eq!(shift.variant_count, 0);
            assert_eq!(shift.variant_percent, 0.0);
            assert!(!shift.change.is_nan());
            assert_eq!(shift.change, -50.0);
        }
    }

    #[test]
    fn wait_type_shifts_filter_small_moves() {
        let b = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "a", "IO", "x", "q"),
                make_query(1.0, "a", "IO", "x", "q"),
                make_query(1.0, "a", "Client", "x", "q"),
                make_query(1.0, "a", "Client", "x", "q"),
            ],
        )]);
        let v = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "a", "IO", "x", "q"),
                make_query(1.0, "a", "Lock", "tuple", "q"),
                make_query(1.0, "a", "Client", "x", "q"),
                make_query(1.0, "a", "Client", "x", "q"),
            ],
        )]);
        let r = compare(&b, &v);
        let keys: Vec<&str> = r.wait_type_shifts.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["IO", "Lock"]);
        assert_eq!(r.wait_type_shifts[0].change, -25.0);
        assert_eq!(r.wait_type_shifts[1].baseline_percent, 0.0);
        assert_eq!(r.wait_type_shifts[1].variant_percent, 25.0);
    }

    #[test]
    fn application_shifts_report_baseline_share() {
        let b = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "api", "IO", "x", "q"),
                make_query(1.0, "cron", "IO", "x", "q"),
            ],
        )]);
        let v = summarize(vec![make_snapshot(
            1.0,
            vec![
                make_query(1.0, "api", "IO", "x", "q"),
                make_query(1.0, "api", "IO", "x", "q"),
                make_query(1.0, "api", "IO", "x", "q"),
                make_query(1.0, "etl", "IO", "x", "q"),
            ],
        )]);
        let r = compare(&b, &v);
        assert_eq!(r.application_shifts[0].key, "api");
        assert_eq!(r.application_shifts[0].variant_percent, 75.0);
        assert_eq!(r.application_shifts[0].baseline_percent, 50.0);
        assert_eq!(r.application_shifts[0].change, 25.0);
        assert_eq!(r.application_shifts[1].key, "etl");
        assert_eq!(r.application_shifts[1].baseline_percent, 0.0);
    }

    #[test]
    fn top_tables_limited_to_ten() {
        let queries: Vec<QueryObservation> = (0..15)
            .map(|i| make_query(1.0, &format!("app-{i}"), "IO", "x", "q"))
            .collect();
        let s = summarize(vec![make_snapshot(1.0, queries)]);
        let r = compare(&s, &s);
        assert_eq!(r.top_applications.baseline.len(), TOP_N);
        assert_eq!(r.top_wait_event_types.variant.len(), 1);
        assert_eq!(r.top_wait_event_types.variant[0].percent, 100.0);
        assert!(r.applications.appeared.is_empty());
        assert!(r.signatures.only_variant.is_empty());
    }
}
