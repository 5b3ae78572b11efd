//! Operation batch files.
//!
//! A batch is either a JSON array of operation records or JSONL with one
//! record per line. The first non-blank character decides.

use crate::jsonl::{JsonlError, read_records, read_text_from_path};
use compendium_kernel::InsertionOperation;
use std::path::Path;

/// Parse a batch from text.
pub fn read_operations(text: &str) -> Result<Vec<InsertionOperation>, JsonlError> {
    if text.trim_start().starts_with('[') {
        return serde_json::from_str(text).map_err(|e| JsonlError::Parse(e.line(), e.to_string()));
    }
    read_records(text.as_bytes())
}

/// Parse a batch file.
pub fn read_operations_from_path(
    path: impl AsRef<Path>,
) -> Result<Vec<InsertionOperation>, JsonlError> {
    let path = path.as_ref();
    let text = read_text_from_path(path)?;
    let operations = read_operations(&text).map_err(|err| match err {
        JsonlError::Parse(line, message) => {
            JsonlError::Parse(line, format!("{}: {message}", path.display()))
        }
        other => other,
    })?;
    tracing::debug!(path = %path.display(), operations = operations.len(), "batch loaded");
    Ok(operations)
}
