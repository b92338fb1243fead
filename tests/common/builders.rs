//! Log-line builders and burst writers.
//!
//! These produce the `<timestamp> | <message>` shape the parser expects,
//! formatted with the same chrono patterns the pipeline parses with, so a
//! written line always round-trips.

use std::io::Write;
use std::path::Path;

use chrono::{TimeZone, Utc};
use sml_core::TimestampLayout;

/// One well-formed log line (newline-terminated), with a deterministic
/// timestamp derived from `sequence`.
pub fn log_line(layout: TimestampLayout, sequence: u32, message: &str) -> String {
    let ts = Utc
        .with_ymd_and_hms(2024, 6, 1, 0, 0, 0)
        .unwrap()
        .checked_add_signed(chrono::Duration::seconds(sequence as i64))
        .unwrap();
    format!("{} | {message}\n", ts.format(layout.pattern()))
}

/// Append raw bytes to `path` in a single write call.
pub fn append(path: &Path, content: &str) {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
}

/// Append a burst of `count` well-formed lines to `path`. Messages embed the
/// file name and sequence number, so every (path, timestamp, message) triple
/// across a harness run is unique.
pub fn write_burst(path: &Path, layout: TimestampLayout, start: u32, count: u32) {
    let name = path.file_name().unwrap().to_string_lossy();
    let mut burst = String::new();
    for i in start..start + count {
        burst.push_str(&log_line(layout, i, &format!("{name} line {i}")));
    }
    append(path, &burst);
}

/// The layout assigned to file `index` in a mixed-layout fleet: evens get
/// the first layout, odds the second.
pub fn layout_for(index: usize) -> TimestampLayout {
    if index % 2 == 0 {
        TimestampLayout::Human
    } else {
        TimestampLayout::Rfc3339
    }
}
