//! Leader vs replica comparison.
//!
//! Each server's baseline and variant periods are compared independently with
//! [`compare`]; the cross-server findings then contrast how the two servers
//! reacted to the same spike.

use serde::Serialize;

use crate::analysis::{ComparisonReport, Finding, Severity, compare, derive_findings};
use crate::model::MetricsSummary;

/// A server's load change must exceed the other's by this factor to count as
/// more impacted.
pub const IMPACT_FACTOR: f64 = 1.2;

/// Leader long queries beyond this multiple of the replica's indicate blocked writes.
pub const LONG_QUERY_SKEW_FACTOR: f64 = 5.0;

/// Both periods of one server.
pub struct ServerPeriods<'a> {
    pub name: &'a str,
    pub baseline: &'a MetricsSummary,
    pub variant: &'a MetricsSummary,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ServerComparison {
    pub name: String,
    pub report: ComparisonReport,
    pub findings: Vec<Finding>,
}

impl ServerComparison {
    pub fn new(periods: &ServerPeriods<'_>) -> Self {
        let report = compare(periods.baseline, periods.variant);
        let findings = derive_findings(&report);
        Self {
            name: periods.name.to_string(),
            report,
            findings,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FleetComparison {
    pub leader: ServerComparison,
    pub replica: ServerComparison,
    pub findings: Vec<Finding>,
}

pub fn compare_fleet(leader: &ServerPeriods<'_>, replica: &ServerPeriods<'_>) -> FleetComparison {
    let leader = ServerComparison::new(leader);
    let replica = ServerComparison::new(replica);
    let findings = fleet_findings(&leader, &replica);
    FleetComparison {
        leader,
        replica,
        findings,
    }
}

fn fleet_findings(leader: &ServerComparison, replica: &ServerComparison) -> Vec<Finding> {
    let mut findings = Vec::new();
    let l = &leader.report;
    let r = &replica.report;

    let l_pct = l.load_change.percent;
    let r_pct = r.load_change.percent;
    findings.push(if l_pct.abs() > r_pct.abs() * IMPACT_FACTOR {
        Finding {
            rule_id: "leader_more_impacted",
            severity: Severity::High,
            message: format!(
                "Leader ({}) is MORE impacted: load changed by {l_pct:+.1}% vs {r_pct:+.1}% on replica",
                leader.name
            ),
        }
    } else if r_pct.abs() > l_pct.abs() * IMPACT_FACTOR {
        Finding {
            rule_id: "replica_more_impacted",
            severity: Severity::High,
            message: format!(
                "Replica ({}) is MORE impacted: load changed by {r_pct:+.1}% vs {l_pct:+.1}% on leader",
                replica.name
            ),
        }
    } else {
        Finding {
            rule_id: "similar_impact",
            severity: Severity::Info,
            message: format!(
                "Both similarly impacted: load changed by {l_pct:+.1}% (leader) and {r_pct:+.1}% (replica)"
            ),
        }
    });

    let l_locks = l.lock_waits.variant.count;
    let r_locks = r.lock_waits.variant.count;
    if l_locks > 0 && r_locks == 0 {
        findings.push(Finding {
            rule_id: "leader_only_locks",
            severity: Severity::Info,
            message: format!(
                "Leader has lock contention ({l_locks} waits), replica has none; expected, writes run on the leader only"
            ),
        });
    }

    let l_long = l.long_queries.variant.count;
    let r_long = r.long_queries.variant.count;
    if l_long as f64 > r_long as f64 * LONG_QUERY_SKEW_FACTOR {
        findings.push(Finding {
            rule_id: "leader_long_queries",
            severity: Severity::High,
            message: format!(
                "Leader has significantly more long queries ({l_long} vs {r_long}); write operations are blocking"
            ),
        });
    } else if r_long > l_long {
        findings.push(Finding {
            rule_id: "replica_long_queries",
            severity: Severity::High,
            message: format!(
                "Replica has more long queries ({r_long} vs {l_long}); read queries are slow"
            ),
        });
    }

    findings
}
