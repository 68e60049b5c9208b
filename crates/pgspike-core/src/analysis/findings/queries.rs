use crate::analysis::ComparisonReport;
use crate::analysis::findings::{Finding, FindingRule, Severity};
use crate::freq::FrequencyTable;

/// Variant long-query count must exceed baseline count times this factor.
pub const LONG_QUERY_GROWTH_FACTOR: f64 = 1.5;

// ============================================================
// LongQueryGrowthRule
// ============================================================

pub struct LongQueryGrowthRule;

impl FindingRule for LongQueryGrowthRule {
    fn id(&self) -> &'static str {
        "long_query_growth"
    }

    fn evaluate(&self, report: &ComparisonReport) -> Vec<Finding> {
        let before = report.long_queries.baseline.count;
        let after = report.long_queries.variant.count;
        if after as f64 <= before as f64 * LONG_QUERY_GROWTH_FACTOR {
            return Vec::new();
        }
        vec![Finding {
            rule_id: self.id(),
            severity: Severity::Critical,
            message: format!("Long-running queries increased significantly ({before} → {after})"),
        }]
    }
}

// ============================================================
// TopOffenderRule: application owning most variant long queries
// ============================================================

pub struct TopOffenderRule;

impl FindingRule for TopOffenderRule {
    fn id(&self) -> &'static str {
        "top_offender"
    }

    fn evaluate(&self, report: &ComparisonReport) -> Vec<Finding> {
        // Counted over the duration-sorted list: on a tie the app with the
        // longest query wins.
        let apps: FrequencyTable = report
            .variant_long_queries
            .iter()
            .map(|q| q.application.as_str())
            .collect();
        let Some((app, count)) = apps.mode() else {
            return Vec::new();
        };
        vec![Finding {
            rule_id: self.id(),
            severity: Severity::Info,
            message: format!("Main culprit: '{app}' responsible for {count} long queries"),
        }]
    }
}
