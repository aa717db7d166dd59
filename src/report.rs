//! CSV and console rendering of the coverage report.

use crate::metrics::RepoMetrics;
use std::fs;
use std::io;
use std::path::Path;

pub const CSV_HEADER: &str = "repo,merged_count,reviewed_any,reviewed_any_pct,approved,changes_requested,commented_only,no_review";

/// Renders the full CSV document, header included, one row per repository.
pub fn render_csv(rows: &[RepoMetrics]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for row in rows {
        out.push_str(&csv_row(row));
        out.push('\n');
    }
    out
}

pub fn csv_row(row: &RepoMetrics) -> String {
    format!(
        "{},{},{},{:.1},{},{},{},{}",
        escape_csv_field(&row.repo),
        row.merged_count,
        row.reviewed_any(),
        row.pct(row.reviewed_any()),
        row.approved,
        row.changes_requested,
        row.commented_only,
        row.no_review
    )
}

pub fn write_csv(path: impl AsRef<Path>, rows: &[RepoMetrics]) -> io::Result<()> {
    fs::write(path, render_csv(rows))
}

/// Quotes a field containing a comma, quote or line break, doubling inner quotes.
fn escape_csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// The console summary for one repository; idle repositories print nothing.
pub fn progress_line(row: &RepoMetrics) -> Option<String> {
    if row.merged_count == 0 {
        return None;
    }
    Some(format!(
        "{}: merged={} reviewed_any={} ({:.1}%) no_review={}",
        row.repo,
        row.merged_count,
        row.reviewed_any(),
        row.pct(row.reviewed_any()),
        row.no_review
    ))
}
