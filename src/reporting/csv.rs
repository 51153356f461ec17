//! CSV output for result documents (`results.csv`).
//!
//! The column set is fixed. Extra keys captured by a parse pattern are
//! dropped here; they only appear in `results.json`.

use std::fs;
use std::path::Path;

use crate::core::models::{MetricRecord, ResultDocument};
use crate::error::{LocalTestError, Result};

/// Columns of `results.csv`, in order.
pub const FIELDS: &[&str] = &["test_case_id", "result", "measurement", "units"];

/// Rows end with CRLF, as RFC 4180 specifies.
const LINE_TERMINATOR: &str = "\r\n";

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or newlines.
/// Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Format a single metric as a CSV row, without the line terminator.
#[must_use]
pub fn format_row(metric: &MetricRecord) -> String {
    FIELDS
        .iter()
        .map(|&field| escape_field(metric.get(field).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders the header plus one row per metric.
#[must_use]
pub fn render(document: &ResultDocument) -> String {
    let mut out = FIELDS.join(",");
    out.push_str(LINE_TERMINATOR);
    for metric in &document.metrics {
        out.push_str(&format_row(metric));
        out.push_str(LINE_TERMINATOR);
    }
    out
}

/// Writes `results.csv`.
pub fn write_results(path: &Path, document: &ResultDocument) -> Result<()> {
    fs::write(path, render(document)).map_err(|e| LocalTestError::io(path, e))
}
