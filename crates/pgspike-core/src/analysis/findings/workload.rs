use crate::analysis::ComparisonReport;
use crate::analysis::findings::{Finding, FindingRule, Severity};

// ============================================================
// NewApplicationsRule: applications seen only in the variant
// ============================================================

pub struct NewApplicationsRule;

impl FindingRule for NewApplicationsRule {
    fn id(&self) -> &'static str {
        "new_applications"
    }

    fn evaluate(&self, report: &ComparisonReport) -> Vec<Finding> {
        let count = report.applications.appeared.len();
        if count == 0 {
            return Vec::new();
        }
        vec![Finding {
            rule_id: self.id(),
            severity: Severity::Info,
            message: format!(
                "{count} new applications appeared during spike (check for scheduled jobs, manual queries)"
            ),
        }]
    }
}
