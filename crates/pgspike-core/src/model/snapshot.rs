//! Captured pg_activity snapshots.
//!
//! A snapshot file is a JSON array of [`Snapshot`] records. Each record holds
//! host load averages and the list of in-flight backends observed at that
//! instant. Optional backend attributes default to `"unknown"` / `0` when the
//! field is missing or `null`; the load and active-count columns are required.

use serde::{Deserialize, Deserializer, Serialize};

/// Signature length: characters of `query_preview` kept before whitespace
/// normalization.
pub const SIGNATURE_CHARS: usize = 200;

/// Number of whitespace-delimited tokens forming a query pattern.
pub const PATTERN_WORDS: usize = 15;

/// Characters of `query_preview` retained on long-query and lock-wait records.
pub const EXCERPT_CHARS: usize = 150;

/// Value used for any absent string attribute.
pub const UNKNOWN: &str = "unknown";

/// One sampled instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub load_avg_1m: f64,
    pub load_avg_5m: f64,
    pub load_avg_15m: f64,
    pub active_query_count: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub queries: Vec<QueryObservation>,
}

/// One in-flight query captured within a snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawQueryObservation")]
pub struct QueryObservation {
    pub wait_event: String,
    pub wait_event_type: String,
    pub query_duration_sec: f64,
    pub transaction_duration_sec: f64,
    pub application_name: String,
    pub username: String,
    pub query_preview: String,
}

/// Wire form of a query record: every attribute optional, `null` same as absent.
///
/// pg_stat_activity names the user column `usename`. Captures may carry that
/// spelling, `username`, or both; `username` wins when both are present.
#[derive(Deserialize)]
struct RawQueryObservation {
    #[serde(default)]
    wait_event: Option<String>,
    #[serde(default)]
    wait_event_type: Option<String>,
    #[serde(default)]
    query_duration_sec: Option<f64>,
    #[serde(default)]
    transaction_duration_sec: Option<f64>,
    #[serde(default)]
    application_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    usename: Option<String>,
    #[serde(default)]
    query_preview: Option<String>,
}

impl From<RawQueryObservation> for QueryObservation {
    fn from(raw: RawQueryObservation) -> Self {
        Self {
            wait_event: raw.wait_event.unwrap_or_else(unknown),
            wait_event_type: raw.wait_event_type.unwrap_or_else(unknown),
            query_duration_sec: raw.query_duration_sec.unwrap_or_default(),
            transaction_duration_sec: raw.transaction_duration_sec.unwrap_or_default(),
            application_name: raw.application_name.unwrap_or_else(unknown),
            username: raw.username.or(raw.usename).unwrap_or_else(unknown),
            query_preview: raw.query_preview.unwrap_or_default(),
        }
    }
}

impl Default for QueryObservation {
    fn default() -> Self {
        Self {
            wait_event: unknown(),
            wait_event_type: unknown(),
            query_duration_sec: 0.0,
            transaction_duration_sec: 0.0,
            application_name: unknown(),
            username: unknown(),
            query_preview: String::new(),
        }
    }
}

impl QueryObservation {
    /// Identity key used for cross-period novelty detection.
    ///
    /// First [`SIGNATURE_CHARS`] characters of the preview with every run of
    /// whitespace collapsed to one space. `None` when the preview is empty or
    /// contains only whitespace.
    pub fn signature(&self) -> Option<String> {
        if self.query_preview.is_empty() {
            return None;
        }
        let head: String = self.query_preview.chars().take(SIGNATURE_CHARS).collect();
        let sig = collapse_whitespace(head.split_whitespace());
        (!sig.is_empty()).then_some(sig)
    }

    /// First [`PATTERN_WORDS`] tokens of the preview, single-space joined.
    ///
    /// `None` for an empty or whitespace-only preview, so such queries are not
    /// counted under an empty-string pattern.
    pub fn pattern(&self) -> Option<String> {
        let tokens = self.query_preview.split_whitespace().take(PATTERN_WORDS);
        let pattern = collapse_whitespace(tokens);
        (!pattern.is_empty()).then_some(pattern)
    }

    /// Preview truncated to [`EXCERPT_CHARS`] characters.
    pub fn excerpt(&self) -> String {
        self.query_preview.chars().take(EXCERPT_CHARS).collect()
    }
}

fn collapse_whitespace<'a>(tokens: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for token in tokens {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_preview(preview: &str) -> QueryObservation {
        QueryObservation {
            query_preview: preview.to_string(),
            ..QueryObservation::default()
        }
    }

    #[test]
    fn signature_collapses_whitespace() {
        let q = with_preview("SELECT  *\n\tFROM   users   WHERE id = $1");
        assert_eq!(
            q.signature().as_deref(),
            Some("SELECT * FROM users WHERE id = $1")
        );
    }

    #[test]
    fn signature_truncates_before_normalizing() {
        // 199 chars of 'a', then 5 spaces, then 'b': the cut lands inside the
        // whitespace run, so 'b' never makes it into the signature.
        let preview = format!("{}     b", "a".repeat(199));
        let sig = with_preview(&preview).signature().unwrap();
        assert_eq!(sig, "a".repeat(199));
    }

    #[test]
    fn signature_absent_for_empty_preview() {
        assert_eq!(with_preview("").signature(), None);
        assert_eq!(with_preview("   \n ").signature(), None);
    }

    #[test]
    fn signature_counts_chars_not_bytes() {
        let preview = "é".repeat(250);
        let sig = with_preview(&preview).signature().unwrap();
        assert_eq!(sig.chars().count(), SIGNATURE_CHARS);
    }

    #[test]
    fn pattern_keeps_first_fifteen_words() {
        let words: Vec<String> = (0..20).map(|i| format!("w{i}")).collect();
        let q = with_preview(&words.join("  "));
        let pattern = q.pattern().unwrap();
        assert_eq!(pattern.split(' ').count(), PATTERN_WORDS);
        assert!(pattern.ends_with("w14"));
    }

    #[test]
    fn excerpt_is_150_chars() {
        let q = with_preview(&"x".repeat(400));
        assert_eq!(q.excerpt().len(), EXCERPT_CHARS);
        assert_eq!(with_preview("short").excerpt(), "short");
    }

    #[test]
    fn missing_fields_take_defaults() {
        let q: QueryObservation = serde_json::from_str("{}").unwrap();
        assert_eq!(q, QueryObservation::default());
        assert_eq!(q.wait_event, "unknown");
        assert_eq!(q.username, "unknown");
    }

    #[test]
    fn null_fields_take_defaults() {
        let q: QueryObservation = serde_json::from_str(
            r#"{"wait_event": null, "wait_event_type": null, "query_duration_sec": null,
                "application_name": null, "query_preview": null}"#,
        )
        .unwrap();
        assert_eq!(q.wait_event, "unknown");
        assert_eq!(q.wait_event_type, "unknown");
        assert_eq!(q.application_name, "unknown");
        assert_eq!(q.query_duration_sec, 0.0);
        assert_eq!(q.query_preview, "");
    }

    #[test]
    fn usename_spelling_accepted() {
        let q: QueryObservation = serde_json::from_str(r#"{"usename": "postgres"}"#).unwrap();
        assert_eq!(q.username, "postgres");
    }

    #[test]
    fn both_user_spellings_prefer_username() {
        let q: QueryObservation =
            serde_json::from_str(r#"{"username": "app", "usename": "postgres"}"#).unwrap();
        assert_eq!(q.username, "app");

        let q: QueryObservation =
            serde_json::from_str(r#"{"username": null, "usename": "postgres"}"#).unwrap();
        assert_eq!(q.username, "postgres");
    }

    #[test]
    fn whitespace_preview_has_no_pattern() {
        assert_eq!(with_preview(" \t\n ").pattern(), None);
        assert_eq!(with_preview("").pattern(), None);
    }

    #[test]
    fn snapshot_requires_load_fields() {
        let err = serde_json::from_str::<Snapshot>(
            r#"{"load_avg_1m": 1.0, "load_avg_5m": 1.0, "active_query_count": 3}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("load_avg_15m"));
    }

    #[test]
    fn snapshot_queries_optional() {
        let s: Snapshot = serde_json::from_str(
            r#"{"load_avg_1m": 1.0, "load_avg_5m": 2.0, "load_avg_15m": 3.0,
                "active_query_count": 0, "timestamp": "2024-01-01T00:00:00"}"#,
        )
        .unwrap();
        assert!(s.queries.is_empty());
    }
}
