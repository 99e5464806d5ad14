use std::collections::BTreeMap;

use lzplan_compiler::Plan;
use lzplan_executor::{ExecutionReport, Outcome, RunStatus};

/// Render a run report as human-readable text.
pub fn render_report(report: &ExecutionReport) -> String {
    let mut out = format!(
        "{} via {}: {} operation(s)\n",
        report.mode,
        report.provisioner,
        report.steps.len()
    );
    if report.steps.is_empty() {
        out.push_str("No operations.\n");
    }

    for step in &report.steps {
        let head = format!("{:>3}. {} {}", step.index, step.kind, step.target);
        let line = match &step.outcome {
            Outcome::Planned { line } => format!("  {head}\n       {line}"),
            Outcome::Succeeded => format!("  ok   {head}"),
            Outcome::Failed { reason } => format!("  FAIL {head}\n       {reason}"),
            Outcome::NotAttempted => format!("  skip {head}"),
        };
        out.push_str(&line);
        out.push('\n');
    }

    match report.status {
        RunStatus::Success => out.push_str("Status: success\n"),
        RunStatus::Aborted { at } => out.push_str(&format!("Status: aborted at operation {at}\n")),
    }
    out
}

/// Summary printed by `validate`: operation counts per kind in first-seen order.
pub fn render_validation(plan: &Plan) -> String {
    let mut order = Vec::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for op in &plan.operations {
        let kind = op.kind().to_string();
        let n = counts.entry(kind.clone()).or_insert(0);
        if *n == 0 {
            order.push(kind);
        }
        *n += 1;
    }

    let mut out = format!(
        "Configuration is valid: {} operation(s), {} warning(s)\n",
        plan.operations.len(),
        plan.warnings.len()
    );
    for kind in order {
        out.push_str(&format!("  {:<26} {}\n", kind, counts[&kind]));
    }
    out
}

/// Compile warnings, one per line, for stderr.
pub fn render_warnings(warnings: &[String]) -> String {
    warnings.iter().map(|w| format!("warning: {w}\n")).collect()
}
