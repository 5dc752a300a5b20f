//! Report rendering helpers for the CLI surface.
//!
//! Keeps scan output bounded and readable while preserving signal.

use crate::core::violation::{ScanReport, Severity};
use colored::Colorize;

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

fn severity_tag(severity: Severity) -> String {
    match severity {
        Severity::Minor => "MINOR".yellow().to_string(),
        Severity::Major => "MAJOR".red().to_string(),
        Severity::Severe => "SEVERE".red().bold().to_string(),
    }
}

/// Render a scan report for the terminal.
pub fn render_report(report: &ScanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("scan {}\n", report.run_id));
    for package in &report.packages {
        out.push_str(&format!("  package {} ({})\n", package.id, &package.digest[..12.min(package.digest.len())]));
    }
    for check_report in &report.reports {
        if check_report.violations.is_empty() {
            continue;
        }
        out.push_str(&format!("{}\n", check_report.check_name.bold()));
        for violation in &check_report.violations {
            let packages = violation
                .packages
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            out.push_str(&format!(
                "  [{}] {} ({})\n",
                severity_tag(violation.severity),
                compact_line(&violation.render(), 160),
                packages
            ));
        }
    }
    match report.worst_severity() {
        Some(worst) => out.push_str(&format!(
            "{} violations, worst severity: {}\n",
            report.violations().len(),
            worst
        )),
        None => out.push_str("no violations\n"),
    }
    out
}
