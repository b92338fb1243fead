//! Line splitting and parsing — one raw log line in, one [`Record`] out.
//!
//! A well-formed line is `<timestamp> | <message>`: the timestamp field is
//! everything before the *first* separator, the message is everything after
//! it. Both fields are whitespace-trimmed. Parse failures are non-fatal to
//! the engine that encountered them; it counts the line and moves on.

use std::path::Path;

use thiserror::Error;

use crate::types::{Record, TimestampLayout};

/// Separator between the timestamp field and the message field.
pub const FIELD_SEPARATOR: char = '|';

/// Why a line could not be turned into a [`Record`].
#[derive(Debug, Error)]
pub enum ParseError {
    /// The line contains no field separator at all.
    #[error("line has no `|` separator: {line:?}")]
    MalformedLine {
        /// The offending line, for diagnostics.
        line: String,
    },
    /// The timestamp field does not match the file's configured layout.
    #[error("timestamp {field:?} does not match layout {layout}: {source}")]
    BadTimestamp {
        /// The trimmed timestamp field.
        field: String,
        /// The layout it was expected to match.
        layout: TimestampLayout,
        source: chrono::ParseError,
    },
}

/// Split `line` on the first [`FIELD_SEPARATOR`] and parse the timestamp
/// field against `layout`. Pure function: no state, no I/O.
pub fn parse_line(
    line: &str,
    source: &Path,
    layout: TimestampLayout,
) -> Result<Record, ParseError> {
    let (ts_field, message) =
        line.split_once(FIELD_SEPARATOR)
            .ok_or_else(|| ParseError::MalformedLine {
                line: line.to_owned(),
            })?;

    let ts_field = ts_field.trim();
    let ts = layout
        .parse(ts_field)
        .map_err(|source| ParseError::BadTimestamp {
            field: ts_field.to_owned(),
            layout,
            source,
        })?;

    Ok(Record {
        ts,
        message: message.trim().to_owned(),
        source: source.to_path_buf(),
        layout,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
