//! Record decoding for single-document JSON and newline-delimited JSON.
//!
//! Every line (or top-level array element) is decoded on its own. A row that
//! fails to parse, or parses but does not fit the target record type, is
//! skipped with a warning; it never aborts the rest of the source.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::constants::source::MALFORMED_PREVIEW_CHARS;
use crate::errors::SourceError;

/// Layout of a record source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RecordFormat {
    /// One JSON document. A top-level array yields one row per element.
    Json,
    /// One JSON value per line.
    #[default]
    JsonLines,
}

impl fmt::Display for RecordFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordFormat::Json => f.write_str("json"),
            RecordFormat::JsonLines => f.write_str("jsonl"),
        }
    }
}

impl FromStr for RecordFormat {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(RecordFormat::Json),
            "jsonl" | "ndjson" | "jsonlines" | "json-lines" => Ok(RecordFormat::JsonLines),
            other => Err(format!("unknown record format '{other}' (expected json or jsonl)")),
        }
    }
}

/// Untyped rows decoded from one source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DecodedRows {
    /// Rows in source order.
    pub rows: Vec<Value>,
    /// Lines that were not valid JSON.
    pub skipped: usize,
}

/// Decode raw source text into JSON rows.
///
/// Blank lines in JSON-lines input are ignored without counting as skipped.
/// A `Json` document that fails to parse as a whole is a source-level
/// failure, since there is no smaller unit to recover.
pub fn decode_rows(
    text: &str,
    format: RecordFormat,
    location: &str,
) -> Result<DecodedRows, SourceError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    match format {
        RecordFormat::JsonLines => Ok(decode_lines(text, location)),
        RecordFormat::Json => {
            let document: Value =
                serde_json::from_str(text).map_err(|err| SourceError::Decode {
                    location: location.to_string(),
                    reason: err.to_string(),
                })?;
            let rows = match document {
                Value::Array(items) => items,
                other => vec![other],
            };
            Ok(DecodedRows { rows, skipped: 0 })
        }
    }
}

fn decode_lines(text: &str, location: &str) -> DecodedRows {
    let mut decoded = DecodedRows::default();
    for (line_idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(row) => decoded.rows.push(row),
            Err(err) => {
                warn!(
                    "[article_recs:source] skipping malformed JSON line {} in {}: {} ({err})",
                    line_idx + 1,
                    location,
                    preview(trimmed)
                );
                decoded.skipped += 1;
            }
        }
    }
    decoded
}

/// Convert untyped rows into records, skipping rows that do not fit `T`.
///
/// Returns the records plus the number of rows skipped.
pub fn rows_into_records<T: DeserializeOwned>(rows: &[Value], location: &str) -> (Vec<T>, usize) {
    let mut records = Vec::with_capacity(rows.len());
    let mut skipped = 0;
    for (idx, row) in rows.iter().enumerate() {
        match T::deserialize(row) {
            Ok(record) => records.push(record),
            Err(err) => {
                warn!(
                    "[article_recs:source] skipping row {} in {} that does not fit the record shape: {} ({err})",
                    idx + 1,
                    location,
                    preview(&row.to_string())
                );
                skipped += 1;
            }
        }
    }
    (records, skipped)
}

/// First `MALFORMED_PREVIEW_CHARS` characters of `text`, with `...` when cut.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MALFORMED_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
