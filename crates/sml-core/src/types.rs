//! Core types for sml-core — Ship My Logs.
//!
//! This module defines the data structures shared across the pipeline: the
//! parsed [`Record`], the [`TimestampLayout`] selector, the per-file
//! [`FileCursor`], and the per-engine [`LineCounters`].

use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};

/// One parsed log entry, ready for persistence.
///
/// Produced by [`parse_line`](crate::parse::parse_line), immutable afterwards,
/// and consumed exactly once by a sink worker. A record has no identity of its
/// own; the sink assigns one at insert time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Timestamp parsed from the line per the file's configured layout.
    pub ts: DateTime<Utc>,
    /// Message text, whitespace-trimmed.
    pub message: String,
    /// Path of the file the line was read from.
    pub source: PathBuf,
    /// The layout the timestamp was parsed with.
    pub layout: TimestampLayout,
}

/// The two recognized timestamp layouts, selected by `1` or `2` in the
/// configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimestampLayout {
    /// Selector `1` — `Jan  2, 2006 at  3:04:05pm (UTC)`.
    Human,
    /// Selector `2` — `2006-01-02T15:04:05Z`.
    Rfc3339,
}

impl TimestampLayout {
    /// Map a configuration selector to a layout. Only `1` and `2` are
    /// recognized.
    pub fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            1 => Some(TimestampLayout::Human),
            2 => Some(TimestampLayout::Rfc3339),
            _ => None,
        }
    }

    /// The chrono format pattern for this layout. This string also travels
    /// with every [`Record`] into the persisted document.
    pub const fn pattern(&self) -> &'static str {
        match self {
            TimestampLayout::Human => "%b %e, %Y at %l:%M:%S%P (UTC)",
            TimestampLayout::Rfc3339 => "%Y-%m-%dT%H:%M:%SZ",
        }
    }

    /// Parse a timestamp field against this layout. Both layouts denote UTC
    /// wall-clock time.
    pub fn parse(&self, raw: &str) -> chrono::ParseResult<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(raw, self.pattern()).map(|naive| naive.and_utc())
    }
}

impl std::fmt::Display for TimestampLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimestampLayout::Human => write!(f, "human"),
            TimestampLayout::Rfc3339 => write!(f, "rfc3339"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for TimestampLayout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let selector = u8::deserialize(deserializer)?;
        TimestampLayout::from_selector(selector).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unrecognized timestamp layout selector {selector} (expected 1 or 2)"
            ))
        })
    }
}

/// Per-file read state, owned exclusively by the file's tail engine.
///
/// `offset` counts the bytes consumed from the file so far. It only moves
/// forward, except on a detected truncation, where the engine resets it to
/// the new (smaller) file size.
#[derive(Debug, Clone)]
pub struct FileCursor {
    /// Absolute or relative path, as supplied by the input list.
    pub path: PathBuf,
    /// File name for log output (`app.log` rather than the full path).
    pub name: String,
    /// Bytes of the file consumed so far.
    pub offset: u64,
    /// Timestamp layout every line of this file is expected to use.
    pub layout: TimestampLayout,
}

impl FileCursor {
    /// A cursor positioned at offset zero. The engine advances it to the
    /// current end of file when it opens the file.
    pub fn new(path: PathBuf, layout: TimestampLayout) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path,
            name,
            offset: 0,
            layout,
        }
    }
}

/// Per-engine line counters, reported at termination for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounters {
    /// Lines successfully parsed into a [`Record`].
    pub parsed: u64,
    /// Lines dropped as malformed (no separator or bad timestamp).
    pub malformed: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
