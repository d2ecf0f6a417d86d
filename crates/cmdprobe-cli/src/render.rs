//! Report rendering for the terminal and for machines

use cmdprobe_ast::CheckFile;
use cmdprobe_runner::{CheckStatus, Report, Summary};
use std::fmt::Write;

/// Plain-text report; `quiet` keeps only the summary line
#[must_use]
pub fn text(reports: &[Report], quiet: bool) -> String {
    let mut out = String::new();
    let mut summary = Summary::default();

    for report in reports {
        summary += report.summary();
        if quiet {
            continue;
        }
        for check in &report.checks {
            let _ = writeln!(out, "{} {}", check.status.label(), check.command);
            if check.status == CheckStatus::Error {
                if let Some(error) = &check.error {
                    let _ = writeln!(out, "  {error}");
                }
                continue;
            }
            for failure in check.failures() {
                let _ = writeln!(out, "  - {}", failure.description);
                let _ = writeln!(out, "    {}:", failure.stream);
                if failure.actual.is_empty() {
                    let _ = writeln!(out, "      (empty)");
                }
                for line in failure.actual.lines() {
                    let _ = writeln!(out, "      | {line}");
                }
            }
        }
    }

    let _ = writeln!(
        out,
        "{} checks, {} passed, {} failed, {} errors",
        summary.total, summary.passed, summary.failed, summary.errors
    );
    out
}

/// JSON document with every report and the overall summary
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn json(reports: &[Report]) -> Result<String, serde_json::Error> {
    let mut summary = Summary::default();
    for report in reports {
        summary += report.summary();
    }
    serde_json::to_string_pretty(&serde_json::json!({
        "reports": reports,
        "summary": summary,
    }))
}

/// Parsed checks without running them
#[must_use]
pub fn listing(files: &[(String, CheckFile)]) -> String {
    let mut out = String::new();
    for (source, file) in files {
        for check in &file.checks {
            let _ = writeln!(out, "{source}: {}", check.node.command);
            for assertion in &check.node.assertions {
                let _ = writeln!(out, "  {}", assertion.node);
            }
        }
    }
    out
}
