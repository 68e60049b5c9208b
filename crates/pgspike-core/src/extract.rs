//! Metrics extraction: one pass over a period's snapshots.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::ExtractError;
use crate::freq::FrequencyTable;
use crate::model::{LoadStats, LockWait, LongQuery, MetricsSummary, Snapshot, Stats};

/// A query running strictly longer than this is a long query.
pub const LONG_QUERY_THRESHOLD_SECS: f64 = 10.0;

/// `wait_event_type` marking a heavyweight lock wait. Compared case-sensitively.
pub const LOCK_WAIT_TYPE: &str = "Lock";

/// Aggregate a period's snapshots into a [`MetricsSummary`].
///
/// Load and active-query statistics are per snapshot; everything else is per
/// query observation. Fails on an empty period or an invalid load value.
pub fn extract(snapshots: &[Snapshot]) -> Result<MetricsSummary, ExtractError> {
    if snapshots.is_empty() {
        return Err(ExtractError::EmptyPeriod);
    }

    let mut load_1m = Vec::with_capacity(snapshots.len());
    let mut load_5m = Vec::with_capacity(snapshots.len());
    let mut load_15m = Vec::with_capacity(snapshots.len());
    let mut active_counts = Vec::with_capacity(snapshots.len());

    let mut wait_events = FrequencyTable::new();
    let mut wait_event_types = FrequencyTable::new();
    let mut applications = FrequencyTable::new();
    let mut users = FrequencyTable::new();
    let mut query_patterns = FrequencyTable::new();
    let mut query_durations = Vec::new();
    let mut transaction_durations = Vec::new();
    let mut query_signatures = BTreeSet::new();
    let mut long_queries = Vec::new();
    let mut lock_waits = Vec::new();

    for (index, snapshot) in snapshots.iter().enumerate() {
        load_1m.push(check_load(index, "load_avg_1m", snapshot.load_avg_1m)?);
        load_5m.push(check_load(index, "load_avg_5m", snapshot.load_avg_5m)?);
        load_15m.push(check_load(index, "load_avg_15m", snapshot.load_avg_15m)?);
        active_counts.push(snapshot.active_query_count as f64);

        for query in &snapshot.queries {
            wait_events.add(&query.wait_event);
            wait_event_types.add(&query.wait_event_type);
            applications.add(&query.application_name);
            users.add(&query.username);
            query_durations.push(query.query_duration_sec);
            transaction_durations.push(query.transaction_duration_sec);

            if let Some(pattern) = query.pattern() {
                query_patterns.add(&pattern);
            }
            if let Some(sig) = query.signature() {
                query_signatures.insert(sig);
            }

            if query.query_duration_sec > LONG_QUERY_THRESHOLD_SECS {
                long_queries.push(LongQuery {
                    duration: query.query_duration_sec,
                    application: query.application_name.clone(),
                    wait_event: query.wait_event.clone(),
                    wait_event_type: query.wait_event_type.clone(),
                    preview: query.excerpt(),
                });
            }

            if query.wait_event_type == LOCK_WAIT_TYPE {
                lock_waits.push(LockWait {
                    duration: query.query_duration_sec,
                    application: query.application_name.clone(),
                    wait_event: query.wait_event.clone(),
                    preview: query.excerpt(),
                });
            }
        }
    }

    let total_queries = query_durations.len();
    debug!(
        snapshots = snapshots.len(),
        queries = total_queries,
        signatures = query_signatures.len(),
        long_queries = long_queries.len(),
        lock_waits = lock_waits.len(),
        "extracted period metrics"
    );

    Ok(MetricsSummary {
        snapshot_count: snapshots.len(),
        load: LoadStats {
            m1: column_stats(&load_1m),
            m5: column_stats(&load_5m),
            m15: column_stats(&load_15m),
        },
        active_queries: column_stats(&active_counts),
        wait_events,
        wait_event_types,
        applications,
        users,
        query_patterns,
        query_durations,
        transaction_durations,
        query_signatures,
        total_queries,
        long_queries,
        lock_waits,
    })
}

fn check_load(index: usize, field: &'static str, value: f64) -> Result<f64, ExtractError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ExtractError::InvalidLoad {
            index,
            field,
            value,
        })
    }
}

// Columns hold one value per snapshot and the period is non-empty.
fn column_stats(values: &[f64]) -> Stats {
    Stats::from_values(values).unwrap_or(Stats {
        min: 0.0,
        max: 0.0,
        mean: 0.0,
        median: 0.0,
    })
}
