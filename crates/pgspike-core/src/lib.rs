//! pgspike-core - comparative analysis of PostgreSQL activity snapshots.
//!
//! Provides:
//! - `model`: captured snapshots and per-period metric summaries
//! - `loader`: reading snapshot files (JSON, optionally zstd-compressed)
//! - `extract`: aggregation of one period into a `MetricsSummary`
//! - `analysis`: baseline vs variant comparison and threshold findings
//! - `fleet`: leader vs replica comparison
//! - `report`: Markdown rendering
//! - `fmt`: shared formatting helpers (durations, percentages, truncation)
//! - `freq`: insertion-ordered frequency tables

pub mod analysis;
pub mod error;
pub mod extract;
pub mod fleet;
pub mod fmt;
pub mod freq;
pub mod loader;
pub mod model;
pub mod report;

pub use analysis::{ComparisonReport, Finding, Severity, compare, derive_findings};
pub use error::{ExtractError, LoadError};
pub use extract::extract;
pub use model::{MetricsSummary, QueryObservation, Snapshot};
