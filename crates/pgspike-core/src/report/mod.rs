//! Markdown rendering of comparison results.
//!
//! Rendering makes no decisions: every number comes from the
//! [`ComparisonReport`]. Only list lengths and text truncation are applied here.

mod fleet;
mod sections;

pub use fleet::render_fleet_report;

use crate::analysis::{ComparisonReport, Finding};

/// Long queries listed individually.
pub const LONG_QUERY_LIMIT: usize = 10;
/// Applications listed per lock category.
pub const LOCK_APP_LIMIT: usize = 5;
/// Variant-only applications listed.
pub const NEW_APP_LIMIT: usize = 15;
/// Baseline-only applications listed.
pub const GONE_APP_LIMIT: usize = 10;
/// Variant-only query signatures listed.
pub const NEW_SIGNATURE_LIMIT: usize = 5;
/// Characters of a signature shown in the new-query list.
pub const SIGNATURE_EXCERPT_CHARS: usize = 120;
/// Characters of an application name shown in listings.
pub const APP_NAME_CHARS: usize = 60;

const RULE: &str = "================================================================================";

/// Line-oriented Markdown builder.
#[derive(Default)]
pub(crate) struct Document {
    out: String,
}

impl Document {
    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        self.out.push('\n');
    }

    pub(crate) fn rule(&mut self) {
        self.line(RULE);
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// Full single-server report: normal period against spike period.
pub fn render_spike_report(report: &ComparisonReport, findings: &[Finding]) -> String {
    let mut doc = Document::default();
    doc.line("# PostgreSQL Spike Analysis Report - DETAILED");
    doc.blank();
    doc.rule();
    doc.blank();
    sections::comparison(&mut doc, report, findings);
    doc.rule();
    doc.finish()
}
