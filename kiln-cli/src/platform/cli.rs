//! CLI error output
//!
//! Prints errors with the offending source line when the script the program
//! was compiled from can be read.

use kiln_api::{ErrorDetails, KilnError};
use std::path::Path;

/// Print `e`, followed by source context if its file is readable
///
/// Fault locations name the script file relative to the project directory.
pub fn print_error_with_source(e: &KilnError, project_dir: &Path) {
    let report = e.to_report();
    eprintln!("error: {report}");

    let Some(ErrorDetails::Location { file, ip }) = &report.details else {
        return;
    };
    eprintln!("  at {file} (ip {ip:04})");

    let (Some(line), Some(column)) = (report.line, report.column) else {
        return;
    };
    if let Ok(source) = std::fs::read_to_string(project_dir.join(file)) {
        print_source_context(&source, line, column);
    }
}

/// Print the lines around `error_line` with a marker under `error_col`
fn print_source_context(source: &str, error_line: usize, error_col: usize) {
    for line in source_context(source, error_line, error_col) {
        eprintln!("{line}");
    }
}

fn source_context(source: &str, error_line: usize, error_col: usize) -> Vec<String> {
    const CONTEXT_LINES: usize = 5;

    let lines: Vec<&str> = source.lines().collect();
    let total_lines = lines.len();
    if error_line == 0 || error_line > total_lines {
        return Vec::new();
    }

    let start_line = error_line.saturating_sub(CONTEXT_LINES).max(1);
    let end_line = (error_line + CONTEXT_LINES).min(total_lines);
    let width = end_line.to_string().len();
    let separator = format!("{}|--", "-".repeat(width + 1));

    let mut out = vec![separator.clone()];
    for line_idx in start_line..=end_line {
        out.push(format!("{line_idx:>width$} | {}", lines[line_idx - 1]));
        if line_idx == error_line {
            let marker = " ".repeat(error_col.saturating_sub(1));
            out.push(format!("{} | {marker}^", " ".repeat(width)));
        }
    }
    out.push(separator);
    out
}
