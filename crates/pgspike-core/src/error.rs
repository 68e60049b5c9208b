//! Error types for ingestion and aggregation.
//!
//! Both are fatal: a malformed period aborts the whole run. Degenerate
//! numeric input (zero baselines, empty duration lists) is never an error
//! and is handled by guarded arithmetic in [`crate::analysis`].

use std::path::PathBuf;

use thiserror::Error;

/// Failure while reading a period's snapshot file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to decompress {path}: {source}")]
    Decompress {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{path}: compressed input requires the `zstd` feature")]
    CompressionUnsupported { path: PathBuf },
    #[error("{path}: invalid JSON: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{path}: top-level value must be an array of snapshots, got {found}")]
    NotAnArray { path: PathBuf, found: &'static str },
    #[error("{path}: snapshot #{index}: {source}")]
    Record {
        path: PathBuf,
        index: usize,
        source: serde_json::Error,
    },
}

/// Failure while aggregating a period into a [`crate::model::MetricsSummary`].
#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("period contains no snapshots")]
    EmptyPeriod,
    #[error("snapshot #{index}: {field} must be a finite non-negative number, got {value}")]
    InvalidLoad {
        index: usize,
        field: &'static str,
        value: f64,
    },
}
