//! Shared formatting helpers for rendered reports.
//!
//! Pure value-to-text functions; section layout lives in [`crate::report`].

// ---------------------------------------------------------------------------
// Durations
// ---------------------------------------------------------------------------

/// Format a query duration given in seconds.
///
/// `"350ms"` below one second, `"12.5s"` below a minute, `"3.2m"` below an
/// hour, `"1.5h"` beyond.
pub fn format_duration(secs: f64) -> String {
    if secs < 1.0 {
        format!("{:.0}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Signed change with `precision` decimals and its percentage: `"+1.25 (+12.5%)"`.
pub fn format_change(change: f64, percent: f64, precision: usize) -> String {
    format!("{change:+.precision$} ({percent:+.1}%)")
}

/// Share with one decimal: `"12.5%"`.
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.1}%")
}

/// Signed percentage points: `"+3.0pp"`.
pub fn format_pp(points: f64) -> String {
    format!("{points:+.1}pp")
}

// ---------------------------------------------------------------------------
// Text normalization
// ---------------------------------------------------------------------------

/// First `max_chars` characters of `s`.
pub fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Collapse newlines, tabs and repeated spaces so text fits on one line.
pub fn normalize_for_display(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space {
                result.push(' ');
            }
            prev_space = true;
        } else {
            result.push(ch);
            prev_space = false;
        }
    }
    result
}

/// Placeholder for empty keys, e.g. a blank `application_name`.
pub fn display_key(key: &str) -> &str {
    if key.is_empty() { "(empty)" } else { key }
}
