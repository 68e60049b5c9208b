//! Reading snapshot files.
//!
//! A period file is a JSON array of snapshot records, optionally compressed
//! with zstd (`.zst` extension). The whole file must parse: a non-array
//! top-level value or any record missing a required field fails the load.

use std::ffi::OsStr;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::LoadError;
use crate::model::Snapshot;

pub fn load_snapshots(path: &Path) -> Result<Vec<Snapshot>, LoadError> {
    let raw = fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = if path.extension().and_then(OsStr::to_str) == Some("zst") {
        decompress(path, &raw)?
    } else {
        raw
    };
    let snapshots = parse_snapshots(path, &bytes)?;
    debug!(path = %path.display(), snapshots = snapshots.len(), "loaded snapshots");
    Ok(snapshots)
}

/// Parse an in-memory JSON document. `path` is only used in error messages.
pub fn parse_snapshots(path: &Path, bytes: &[u8]) -> Result<Vec<Snapshot>, LoadError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let records = match value {
        Value::Array(records) => records,
        other => {
            return Err(LoadError::NotAnArray {
                path: path.to_path_buf(),
                found: json_type(&other),
            });
        }
    };
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            serde_json::from_value(record).map_err(|source| LoadError::Record {
                path: path.to_path_buf(),
                index,
                source,
            })
        })
        .collect()
}

#[cfg(feature = "zstd")]
fn decompress(path: &Path, raw: &[u8]) -> Result<Vec<u8>, LoadError> {
    zstd::stream::decode_all(raw).map_err(|source| LoadError::Decompress {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(not(feature = "zstd"))]
fn decompress(path: &Path, _raw: &[u8]) -> Result<Vec<u8>, LoadError> {
    Err(LoadError::CompressionUnsupported {
        path: path.to_path_buf(),
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
