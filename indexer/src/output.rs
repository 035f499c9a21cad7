//! Output formatting for the index builder CLI.
//!
//! Human-facing summaries are rendered to strings here so the binary only
//! decides where they go.

use crate::pipeline::{BuildReport, PlannedPackage};
use camino::Utf8Path;
use std::io::Write;

/// Write `message` followed by a newline, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a success message after the index has been written.
#[must_use]
pub fn success_message(report: &BuildReport, output_dir: &Utf8Path) -> String {
    let packages = report.packages.len();
    let package_noun = if packages == 1 { "package" } else { "packages" };
    let artifact_noun = if report.artifacts == 1 { "file" } else { "files" };
    let mut message = format!(
        "Indexed {packages} {package_noun} ({} {artifact_noun}) in {output_dir}",
        report.artifacts
    );
    if report.yanked > 0 {
        message.push_str(&format!(", {} yanked", report.yanked));
    }
    if !report.skipped.is_empty() {
        let names: Vec<&str> = report.skipped.iter().map(|s| s.key.as_str()).collect();
        message.push_str(&format!("; skipped {}", names.join(", ")));
    }
    message
}

/// Format a dry-run listing of what would be published.
#[must_use]
pub fn format_plan(planned: &[PlannedPackage]) -> String {
    let mut lines = vec!["Dry run - no files will be downloaded or written".to_owned()];
    if planned.is_empty() {
        lines.push(String::new());
        lines.push("No wheels or source distributions found.".to_owned());
    }
    for package in planned {
        lines.push(String::new());
        lines.push(format!("{}/", package.key));
        for (filename, version, yanked) in &package.artifacts {
            let marker = if *yanked { " (yanked)" } else { "" };
            let version = if version.is_empty() { "?" } else { version };
            lines.push(format!("  {filename}  [{version}]{marker}"));
        }
    }
    lines.join("\n")
}
