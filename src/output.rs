use std::fmt::Write;

use codescope_index::{IndexReport, SearchResult};

const SNIPPET_LINES: usize = 8;

/// `file:line  score`, then the first lines of the snippet indented.
pub fn render_result(result: &SearchResult) -> String {
    let mut out = format!("{}:{}  {:.3}\n", result.file, result.line, result.score);
    let lines: Vec<&str> = result.content.lines().collect();
    for line in lines.iter().take(SNIPPET_LINES) {
        let _ = writeln!(out, "    {line}");
    }
    if lines.len() > SNIPPET_LINES {
        let _ = writeln!(out, "    ... ({} more lines)", lines.len() - SNIPPET_LINES);
    }
    out
}

pub fn render_report(report: &IndexReport) -> String {
    let mut out = String::new();
    let status = if report.cancelled { "cancelled" } else { "done" };
    let _ = writeln!(
        out,
        "{status}: {} file(s) indexed of {} scanned, {} point(s) in {} batch(es), {} ms",
        report.files_indexed,
        report.files_scanned,
        report.points_upserted,
        report.batches_flushed,
        report.duration_ms
    );
    if report.files_removed > 0 {
        let _ = writeln!(out, "{} file(s) removed", report.files_removed);
    }
    if !report.errors.is_empty() {
        let _ = writeln!(out, "{} file(s) skipped:", report.errors.len());
        for error in &report.errors {
            let _ = writeln!(out, "  {error}");
        }
    }
    out
}
