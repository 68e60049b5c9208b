use crate::analysis::ComparisonReport;
use crate::fleet::{FleetComparison, ServerComparison};

use super::Document;
use super::sections::{comparison, finding_line};

/// Leader/replica document: side-by-side table, cross-server findings, then
/// each server's full comparison.
pub fn render_fleet_report(fleet: &FleetComparison) -> String {
    let mut doc = Document::default();
    doc.line("# PostgreSQL Spike Analysis - Leader vs Replica");
    doc.blank();
    doc.rule();
    doc.blank();

    quick_table(&mut doc, &fleet.leader, &fleet.replica);

    doc.line("## Key Findings");
    doc.blank();
    for finding in &fleet.findings {
        doc.line(finding_line(finding));
    }
    doc.blank();
    doc.rule();
    doc.blank();

    for server in [&fleet.leader, &fleet.replica] {
        doc.line(format!("# {} Analysis: Normal → Spike Changes", server.name));
        doc.blank();
        doc.rule();
        doc.blank();
        comparison(&mut doc, &server.report, &server.findings);
        doc.rule();
        doc.blank();
    }
    doc.finish()
}

fn quick_table(doc: &mut Document, leader: &ServerComparison, replica: &ServerComparison) {
    let (l, r) = (&leader.report, &replica.report);
    doc.line("## Quick Comparison Table");
    doc.blank();
    doc.line("```");
    doc.line(format!(
        "{:<16} | {:>12} | {:>12} | {:>18} | {:>12} | {:>12} | {:>18}",
        "Metric",
        format!("{} Normal", leader.name),
        format!("{} Spike", leader.name),
        format!("{} Change", leader.name),
        format!("{} Normal", replica.name),
        format!("{} Spike", replica.name),
        format!("{} Change", replica.name),
    ));
    doc.line(format!(
        "{:-<16}-|-{:-<12}-|-{:-<12}-|-{:-<18}-|-{:-<12}-|-{:-<12}-|-{:-<18}",
        "", "", "", "", "", "", ""
    ));

    let load = |c: &ComparisonReport| {
        [
            format!("{:.2}", c.load_change.baseline),
            format!("{:.2}", c.load_change.variant),
            format!(
                "{:+.2} ({:+.1}%)",
                c.load_change.change, c.load_change.percent
            ),
        ]
    };
    let active = |c: &ComparisonReport| {
        [
            format!("{:.1}", c.active_change.baseline),
            format!("{:.1}", c.active_change.variant),
            format!("{:+.1}", c.active_change.change),
        ]
    };
    let counts = |before: usize, after: usize| {
        [
            before.to_string(),
            after.to_string(),
            format!("{:+}", after as i64 - before as i64),
        ]
    };

    row(doc, "Load Avg", load(l), load(r));
    row(doc, "Active Queries", active(l), active(r));
    row(
        doc,
        "Long Queries",
        counts(l.long_queries.baseline.count, l.long_queries.variant.count),
        counts(r.long_queries.baseline.count, r.long_queries.variant.count),
    );
    row(
        doc,
        "Lock Waits",
        counts(l.lock_waits.baseline.count, l.lock_waits.variant.count),
        counts(r.lock_waits.baseline.count, r.lock_waits.variant.count),
    );
    doc.line("```");
    doc.blank();
}

fn row(doc: &mut Document, metric: &str, leader: [String; 3], replica: [String; 3]) {
    let [ln, ls, lc] = leader;
    let [rn, rs, rc] = replica;
    doc.line(format!(
        "{metric:<16} | {ln:>12} | {ls:>12} | {lc:>18} | {rn:>12} | {rs:>12} | {rc:>18}"
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::tests::{make_query, make_snapshot, summarize};
    use crate::fleet::{ServerPeriods, compare_fleet};

    #[test]
    fn fleet_report_layout() {
        let l_base = summarize(vec![make_snapshot(2.0, vec![])]);
        let l_spike = summarize(vec![make_snapshot(
            4.0,
            vec![make_query(25.0, "writer", "Lock", "transactionid", "UPDATE a"); 2],
        )]);
        let r_base = summarize(vec![make_snapshot(1.0, vec![])]);
        let r_spike = summarize(vec![make_snapshot(1.0, vec![])]);
        let fleet = compare_fleet(
            &ServerPeriods {
                name: "pg00",
                baseline: &l_base,
                variant: &l_spike,
            },
            &ServerPeriods {
                name: "pg01",
                baseline: &r_base,
                variant: &r_spike,
            },
        );
        let text = render_fleet_report(&fleet);

        assert!(text.starts_with("# PostgreSQL Spike Analysis - Leader vs Replica"));
        assert!(text.contains("## Quick Comparison Table"));
        assert!(text.contains("# pg00 Analysis: Normal → Spike Changes"));
        assert!(text.contains("# pg01 Analysis: Normal → Spike Changes"));
        assert!(text.contains("- **HIGH**: Leader (pg00) is MORE impacted"));

        let lock_row = text.lines().find(|l| l.starts_with("Lock Waits")).unwrap();
        let cells: Vec<&str> = lock_row.split('|').map(str::trim).collect();
        assert_eq!(cells, vec!["Lock Waits", "0", "2", "+2", "0", "0", "+0"]);

        let load_row = text.lines().find(|l| l.starts_with("Load Avg")).unwrap();
        assert!(load_row.contains("+2.00 (+100.0%)"));
    }
}
