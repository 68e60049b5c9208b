use crate::analysis::{ComparisonReport, DurationComparison, Finding, PeriodPair, Severity};
use crate::extract::LONG_QUERY_THRESHOLD_SECS;
use crate::fmt::{
    display_key, format_change, format_duration, format_percent, format_pp,
    normalize_for_display, truncate,
};
use crate::freq::RankedCount;
use crate::model::Stats;

use super::{
    APP_NAME_CHARS, Document, GONE_APP_LIMIT, LOCK_APP_LIMIT, LONG_QUERY_LIMIT, NEW_APP_LIMIT,
    NEW_SIGNATURE_LIMIT, SIGNATURE_EXCERPT_CHARS,
};

/// Every section of a normal-vs-spike comparison, in document order.
pub(crate) fn comparison(doc: &mut Document, report: &ComparisonReport, findings: &[Finding]) {
    executive_summary(doc, report);
    load(doc, report);
    active_queries(doc, report);
    durations(doc, report);
    long_queries(doc, report);
    locks(doc, report);
    unique_queries(doc, report);
    applications(doc, report);
    wait_events(doc, report);
    users_and_patterns(doc, report);
    key_findings(doc, findings);
    doc.blank();
}

fn executive_summary(doc: &mut Document, r: &ComparisonReport) {
    doc.line("## Executive Summary");
    doc.blank();
    doc.line(format!(
        "- **Normal period**: {} snapshots, {} queries observed",
        r.snapshots.baseline, r.total_queries.baseline
    ));
    doc.line(format!(
        "- **Spike period**: {} snapshots, {} queries observed",
        r.snapshots.variant, r.total_queries.variant
    ));
    doc.line(format!(
        "- **Unique query patterns**: Normal={}, Spike={}",
        r.unique_signatures.baseline, r.unique_signatures.variant
    ));
    doc.line(format!(
        "- **Long queries (>{LONG_QUERY_THRESHOLD_SECS}s)**: Normal={}, Spike={}",
        r.long_queries.baseline.count, r.long_queries.variant.count
    ));
    doc.line(format!(
        "- **Lock waits**: Normal={}, Spike={}",
        r.lock_waits.baseline.count, r.lock_waits.variant.count
    ));
    doc.blank();
}

fn stats_line(label: &str, s: &Stats, precision: usize) -> String {
    format!(
        "- {label} min={:.precision$}, max={:.precision$}, avg={:.precision$}, median={:.precision$}",
        s.min, s.max, s.mean, s.median
    )
}

fn load(doc: &mut Document, r: &ComparisonReport) {
    doc.line("## System Load Analysis");
    doc.blank();
    doc.line("### Load Average (1 minute)");
    doc.line(stats_line("Normal:", &r.load.baseline.m1, 2));
    doc.line(stats_line("Spike: ", &r.load.variant.m1, 2));
    doc.line(format!(
        "- **Change**: {}",
        format_change(r.load_change.change, r.load_change.percent, 2)
    ));
    doc.line(format!(
        "- 5m / 15m averages: Normal={:.2} / {:.2}, Spike={:.2} / {:.2}",
        r.load.baseline.m5.mean,
        r.load.baseline.m15.mean,
        r.load.variant.m5.mean,
        r.load.variant.m15.mean
    ));
    doc.blank();
}

fn active_queries(doc: &mut Document, r: &ComparisonReport) {
    doc.line("## Active Query Count");
    doc.blank();
    for (label, s) in [
        ("Normal:", &r.active_queries.baseline),
        ("Spike: ", &r.active_queries.variant),
    ] {
        doc.line(format!(
            "- {label} min={:.0}, max={:.0}, avg={:.1}, median={:.1}",
            s.min, s.max, s.mean, s.median
        ));
    }
    doc.line(format!(
        "- **Change**: {}",
        format_change(r.active_change.change, r.active_change.percent, 1)
    ));
    doc.blank();
}

fn durations(doc: &mut Document, r: &ComparisonReport) {
    doc.line("## Query Duration Analysis");
    doc.blank();
    match &r.durations {
        Some(d) => duration_lines(doc, d),
        None => doc.line("- No query observations in at least one period"),
    }
    if let Some(tx) = &r.transaction_durations {
        doc.blank();
        doc.line("### Transaction Duration");
        duration_lines(doc, tx);
    }
    doc.blank();
}

fn duration_lines(doc: &mut Document, d: &DurationComparison) {
    for (label, s) in [("Normal:", &d.baseline), ("Spike: ", &d.variant)] {
        doc.line(format!(
            "- {label} avg={}, median={}, max={}",
            format_duration(s.mean),
            format_duration(s.median),
            format_duration(s.max)
        ));
    }
    let sign = if d.mean.change < 0.0 { "-" } else { "+" };
    doc.line(format!(
        "- **Change**: {sign}{} ({:+.1}%)",
        format_duration(d.mean.change.abs()),
        d.mean.percent
    ));
}

fn long_queries(doc: &mut Document, r: &ComparisonReport) {
    doc.line(format!("## Long-Running Queries (>{LONG_QUERY_THRESHOLD_SECS}s)"));
    doc.blank();
    let counts = &r.long_queries;
    doc.line(format!(
        "- Normal: {} ({} of queries)",
        counts.baseline.count,
        format_percent(counts.baseline.percent)
    ));
    doc.line(format!(
        "- Spike: {} ({} of queries)",
        counts.variant.count,
        format_percent(counts.variant.percent)
    ));
    if !r.variant_long_queries.is_empty() {
        doc.blank();
        doc.line(format!("**Top {LONG_QUERY_LIMIT} longest queries:**"));
        for (i, q) in r.variant_long_queries.iter().take(LONG_QUERY_LIMIT).enumerate() {
            doc.blank();
            doc.line(format!(
                "{}. **{}** | Wait: {}/{}",
                i + 1,
                format_duration(q.duration),
                q.wait_event_type,
                q.wait_event
            ));
            doc.line(format!("   App: {}", truncate(&q.application, APP_NAME_CHARS)));
            doc.line(format!("   Query: {}...", normalize_for_display(&q.preview)));
        }
    }
    doc.blank();
}

fn locks(doc: &mut Document, r: &ComparisonReport) {
    doc.line("## Lock Contention Analysis");
    doc.blank();
    doc.line(format!(
        "- Normal period: {} lock waits ({} of queries)",
        r.lock_waits.baseline.count,
        format_percent(r.lock_waits.baseline.percent)
    ));
    doc.line(format!(
        "- Spike period: {} lock waits ({} of queries)",
        r.lock_waits.variant.count,
        format_percent(r.lock_waits.variant.percent)
    ));

    if !r.locks.by_type.is_empty() {
        doc.blank();
        doc.line("### Lock Types During Spike:");
        for row in &r.locks.by_type {
            doc.line(format!(
                "- {}: {} ({})",
                row.key,
                row.count,
                format_percent(row.percent)
            ));
        }
    }

    let categories = r.locks.headline.iter().chain(&r.locks.other);
    for category in categories {
        doc.blank();
        doc.line(format!(
            "**{} locks: {} occurrences**",
            category.lock_type, category.count
        ));
        doc.line("Top apps waiting:");
        for app in category.applications.iter().take(LOCK_APP_LIMIT) {
            doc.line(format!(
                "  - {}: {} ({})",
                truncate(&app.key, APP_NAME_CHARS),
                app.count,
                format_percent(app.percent)
            ));
        }
    }
    doc.blank();
}

fn unique_queries(doc: &mut Document, r: &ComparisonReport) {
    let sigs = &r.signatures;
    doc.line("## Unique Query Analysis");
    doc.blank();
    doc.line(format!("- Queries in BOTH periods: {}", sigs.both.len()));
    doc.line(format!("- Queries ONLY in normal: {}", sigs.only_baseline.len()));
    doc.line(format!("- Queries ONLY in spike: {}", sigs.only_variant.len()));
    if !sigs.only_variant.is_empty() {
        doc.blank();
        doc.line(format!(
            "### New queries appearing during spike (first {NEW_SIGNATURE_LIMIT}):"
        ));
        for (i, sig) in sigs.only_variant.iter().take(NEW_SIGNATURE_LIMIT).enumerate() {
            doc.line(format!("{}. {}...", i + 1, truncate(sig, SIGNATURE_EXCERPT_CHARS)));
        }
    }
    doc.blank();
}

fn ranked_lines(doc: &mut Document, rows: &[RankedCount]) {
    if rows.is_empty() {
        doc.line("- (no data)");
    }
    for row in rows {
        doc.line(format!(
            "- {}: {} ({})",
            display_key(&row.key),
            row.count,
            format_percent(row.percent)
        ));
    }
}

fn ranked_pair(doc: &mut Document, pair: &PeriodPair<Vec<RankedCount>>) {
    doc.line("**Normal Period:**");
    ranked_lines(doc, &pair.baseline);
    doc.blank();
    doc.line("**Spike Period:**");
    ranked_lines(doc, &pair.variant);
}

fn applications(doc: &mut Document, r: &ComparisonReport) {
    let diff = &r.applications;
    doc.line("## Application Analysis");
    doc.blank();
    if !diff.appeared.is_empty() {
        doc.line(format!(
            "### Applications appearing ONLY during spike ({} apps):",
            diff.appeared.len()
        ));
        for app in diff.appeared.iter().take(NEW_APP_LIMIT) {
            doc.line(format!("- **{}**: {} queries", display_key(&app.key), app.count));
        }
        doc.blank();
    }
    if !diff.disappeared.is_empty() {
        doc.line(format!(
            "### Applications disappearing during spike ({} apps, top {GONE_APP_LIMIT}):",
            diff.disappeared.len()
        ));
        for app in diff.disappeared.iter().take(GONE_APP_LIMIT) {
            doc.line(format!(
                "- **{}**: {} queries in normal period",
                display_key(&app.key),
                app.count
            ));
        }
        doc.blank();
    }

    doc.line("### Top Applications Overall");
    ranked_pair(doc, &r.top_applications);

    if !r.application_shifts.is_empty() {
        doc.blank();
        doc.line("### Share Change of Top Spike Applications");
        for shift in &r.application_shifts {
            doc.line(format!(
                "- {}: {} ({}, was {}, {})",
                display_key(&shift.key),
                shift.variant_count,
                format_percent(shift.variant_percent),
                format_percent(shift.baseline_percent),
                format_pp(shift.change)
            ));
        }
    }
    doc.blank();
}

fn wait_events(doc: &mut Document, r: &ComparisonReport) {
    doc.line("## Wait Events Analysis");
    doc.blank();
    doc.line("### Top Wait Event Types");
    doc.blank();
    ranked_pair(doc, &r.top_wait_event_types);
    doc.blank();
    doc.line("### Top Specific Wait Events");
    doc.blank();
    ranked_pair(doc, &r.top_wait_events);

    if !r.wait_type_shifts.is_empty() {
        doc.blank();
        doc.line("### Wait Event Type Shifts");
        for shift in &r.wait_type_shifts {
            doc.line(format!(
                "- **{}**: {} → {} ({})",
                shift.key,
                format_percent(shift.baseline_percent),
                format_percent(shift.variant_percent),
                format_pp(shift.change)
            ));
        }
    }
    doc.blank();
}

fn users_and_patterns(doc: &mut Document, r: &ComparisonReport) {
    doc.line("## Users and Query Patterns");
    doc.blank();
    doc.line("### Top Users");
    ranked_pair(doc, &r.top_users);
    doc.blank();
    doc.line("### Top Query Patterns (first 15 words)");
    ranked_pair(doc, &r.top_query_patterns);
    doc.blank();
}

pub(crate) fn finding_line(finding: &Finding) -> String {
    match finding.severity {
        Severity::Info => format!("- {}", finding.message),
        severity => format!("- **{}**: {}", severity.label(), finding.message),
    }
}

fn key_findings(doc: &mut Document, findings: &[Finding]) {
    doc.line("## Key Findings & Recommendations");
    doc.blank();
    for finding in findings {
        doc.line(finding_line(finding));
    }
}
