use crate::analysis::ComparisonReport;
use crate::analysis::findings::{Finding, FindingRule, Severity};

/// Variant lock-wait count must exceed baseline count times this factor.
pub const LOCK_WAIT_GROWTH_FACTOR: f64 = 1.2;

// ============================================================
// LockWaitGrowthRule
// ============================================================

pub struct LockWaitGrowthRule;

impl FindingRule for LockWaitGrowthRule {
    fn id(&self) -> &'static str {
        "lock_wait_growth"
    }

    fn evaluate(&self, report: &ComparisonReport) -> Vec<Finding> {
        let before = report.lock_waits.baseline.count;
        let after = report.lock_waits.variant.count;
        if after as f64 <= before as f64 * LOCK_WAIT_GROWTH_FACTOR {
            return Vec::new();
        }
        vec![Finding {
            rule_id: self.id(),
            severity: Severity::High,
            message: format!("Lock contention increased ({before} → {after})"),
        }]
    }
}
