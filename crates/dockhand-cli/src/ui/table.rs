//! Static tables: the plan, the host profile and the end-of-run summary.

use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use dockhand_schema::{AbortReason, HostProfile, RunOutcome, RunReport, StepId, StepStatus};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Steps that would run, in order.
pub fn plan_table(steps: &[StepId]) -> Table {
    let mut table = base_table();
    table.set_header(vec!["#", "Step", "Key"]);
    for (i, step) in steps.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(step.label()).fg(Color::Cyan),
            Cell::new(step.as_str()).fg(Color::DarkGrey),
        ]);
    }
    table
}

/// The detected host.
pub fn host_table(host: &HostProfile) -> Table {
    let dist = &host.distribution;
    let mut table = base_table();
    table.set_header(vec!["Property", "Value"]);
    table.add_row(vec!["Architecture", host.architecture.as_str()]);
    table.add_row(vec!["Machine", host.machine.as_str()]);
    table.add_row(vec!["Distribution", dist.id.as_str()]);
    table.add_row(vec!["Name", dist.name.as_str()]);
    table.add_row(vec!["Version", dist.version.as_str()]);
    table.add_row(vec!["Codename", dist.codename.as_deref().unwrap_or("-")]);
    table.add_row(vec!["Repository", host.package_repo_url.as_str()]);
    table
}

/// One row per executed step plus any that never ran.
pub fn summary_table(report: &RunReport) -> Table {
    let mut table = base_table();
    table.set_header(vec!["Step", "Status", "Time", "Detail"]);
    for result in &report.results {
        let color = match result.status {
            StepStatus::Success => Color::Green,
            StepStatus::Skipped => Color::DarkGrey,
            StepStatus::Failed => Color::Red,
        };
        table.add_row(vec![
            Cell::new(result.id.label()),
            Cell::new(result.status).fg(color),
            Cell::new(format_millis(result.duration_ms)),
            Cell::new(&result.detail),
        ]);
    }
    for step in &report.not_attempted {
        table.add_row(vec![
            Cell::new(step.label()),
            Cell::new("not attempted").fg(Color::DarkGrey),
            Cell::new("-"),
            Cell::new(""),
        ]);
    }
    table
}

/// The command that picks up where a failed or interrupted run stopped.
///
/// Returns `None` when there is nothing to resume, or when the host itself
/// was unsupported and rerunning cannot help.
pub fn resume_hint(report: &RunReport) -> Option<String> {
    if matches!(
        report.outcome,
        RunOutcome::Aborted(AbortReason::UnsupportedHost(_))
    ) {
        return None;
    }
    let steps = report.resume_steps();
    if steps.is_empty() {
        return None;
    }
    let names: Vec<&str> = steps.iter().map(StepId::as_str).collect();
    Some(format!("dockhand --steps {}", names.join(" ")))
}

fn format_millis(ms: u64) -> String {
    if ms < 1000 {
        format!("{ms}ms")
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
