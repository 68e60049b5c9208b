//! Threshold rules turning a [`ComparisonReport`] into findings.
//!
//! Every rule is evaluated and all matches are kept, in declaration order.
//! Thresholds are fixed; callers wanting other sensitivities work on the
//! report directly.

mod contention;
mod load;
mod queries;
mod workload;

use serde::Serialize;

use super::ComparisonReport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    High,
    Critical,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Finding {
    pub rule_id: &'static str,
    pub severity: Severity,
    pub message: String,
}

pub trait FindingRule: Send + Sync {
    fn id(&self) -> &'static str;
    fn evaluate(&self, report: &ComparisonReport) -> Vec<Finding>;
}

pub fn all_rules() -> Vec<Box<dyn FindingRule>> {
    vec![
        Box::new(queries::LongQueryGrowthRule),
        Box::new(contention::LockWaitGrowthRule),
        Box::new(load::LoadShiftRule),
        Box::new(workload::NewApplicationsRule),
        Box::new(queries::TopOffenderRule),
    ]
}

/// Rule id of the finding emitted when no rule matches.
pub const NO_DIFFERENCE_ID: &str = "no_significant_difference";

pub fn derive_findings(report: &ComparisonReport) -> Vec<Finding> {
    let mut findings: Vec<Finding> = all_rules()
        .iter()
        .flat_map(|rule| rule.evaluate(report))
        .collect();
    if findings.is_empty() {
        findings.push(Finding {
            rule_id: NO_DIFFERENCE_ID,
            severity: Severity::Info,
            message: "No significant differences detected between normal and spike periods"
                .to_string(),
        });
    }
    findings
}

// ============================================================
// Tests
// ============================================================
