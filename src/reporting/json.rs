//! JSON output for result documents (`results.json`).

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::fs;
use std::path::Path;

use crate::core::models::ResultDocument;
use crate::error::{LocalTestError, Result};

/// Renders the document with four-space indentation.
pub fn render(document: &ResultDocument) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer)?;
    // serde_json only ever emits valid UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes `results.json`.
pub fn write_results(path: &Path, document: &ResultDocument) -> Result<()> {
    fs::write(path, render(document)?).map_err(|e| LocalTestError::io(path, e))
}
