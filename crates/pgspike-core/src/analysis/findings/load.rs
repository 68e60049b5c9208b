use crate::analysis::ComparisonReport;
use crate::analysis::findings::{Finding, FindingRule, Severity};

/// Load-average change, in percent, above which a shift is reported.
pub const LOAD_SHIFT_PERCENT: f64 = 10.0;

// ============================================================
// LoadShiftRule: 1-minute load average moved by more than 10%
// ============================================================

pub struct LoadShiftRule;

impl FindingRule for LoadShiftRule {
    fn id(&self) -> &'static str {
        "load_shift"
    }

    fn evaluate(&self, report: &ComparisonReport) -> Vec<Finding> {
        let pct = report.load_change.percent;
        if pct.abs() <= LOAD_SHIFT_PERCENT {
            return Vec::new();
        }
        let direction = if pct > 0.0 { "increased" } else { "decreased" };
        vec![Finding {
            rule_id: self.id(),
            severity: Severity::Info,
            message: format!("System load {direction} by {:.1}% during spike", pct.abs()),
        }]
    }
}
