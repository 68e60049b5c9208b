mod snapshot;
mod summary;

pub use snapshot::{
    EXCERPT_CHARS, PATTERN_WORDS, QueryObservation, SIGNATURE_CHARS, Snapshot, UNKNOWN,
};
pub use summary::{LoadStats, LockWait, LongQuery, MetricsSummary, Stats};
