use serde::Serialize;
use tracing::debug;

use crate::freq::{FrequencyTable, RankedCount, share};
use crate::model::LockWait;

/// Lock categories reported first and always in this order.
pub const HEADLINE_LOCK_TYPES: [&str; 3] = ["transactionid", "tuple", "relation"];

/// Lock waits of one `wait_event` value, split by application.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LockCategory {
    pub lock_type: String,
    pub count: u64,
    /// Applications waiting on this lock type; `percent` is the share of `count`.
    pub applications: Vec<RankedCount>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LockBreakdown {
    /// Present headline categories, in [`HEADLINE_LOCK_TYPES`] order.
    pub headline: Vec<LockCategory>,
    /// Every other observed category, most frequent first.
    pub other: Vec<LockCategory>,
    /// Distribution of all lock types over all lock waits, most frequent first.
    pub by_type: Vec<RankedCount>,
}

impl LockBreakdown {
    pub fn category(&self, lock_type: &str) -> Option<&LockCategory> {
        self.headline
            .iter()
            .chain(&self.other)
            .find(|c| c.lock_type == lock_type)
    }
}

pub fn breakdown(lock_waits: &[LockWait]) -> LockBreakdown {
    let by_event: FrequencyTable = lock_waits.iter().map(|l| l.wait_event.as_str()).collect();
    let total = lock_waits.len() as u64;

    let category = |lock_type: &str, count: u64| {
        let apps: FrequencyTable = lock_waits
            .iter()
            .filter(|l| l.wait_event == lock_type)
            .map(|l| l.application.as_str())
            .collect();
        LockCategory {
            lock_type: lock_type.to_string(),
            count,
            applications: apps.top(apps.len(), count),
        }
    };

    let headline = HEADLINE_LOCK_TYPES
        .iter()
        .filter(|t| by_event.contains(t))
        .map(|t| category(t, by_event.get(t)))
        .collect();

    let other: Vec<LockCategory> = by_event
        .ranked()
        .into_iter()
        .filter(|(t, _)| !HEADLINE_LOCK_TYPES.contains(t))
        .map(|(t, count)| category(t, count))
        .collect();
    if !other.is_empty() {
        debug!(
            categories = other.len(),
            "lock waits outside headline categories"
        );
    }

    LockBreakdown {
        headline,
        other,
        by_type: by_event
            .ranked()
            .into_iter()
            .map(|(key, count)| RankedCount {
                key: key.to_string(),
                count,
                percent: share(count, total),
            })
            .collect(),
    }
}
