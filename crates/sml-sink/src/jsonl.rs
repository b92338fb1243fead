//! Append-only JSONL sink.
//!
//! Records land as one JSON document per line in
//! `<root_dir>/<collection>.jsonl`. The document carries the sink-assigned
//! `id` plus the record's timestamp, message, source path, and the timestamp
//! pattern it was parsed with.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

use sml_core::Record;

use crate::{Sink, SinkError};

#[derive(Debug, Serialize)]
struct Document<'a> {
    id: Uuid,
    log_date: chrono::DateTime<chrono::Utc>,
    log_msg: &'a str,
    file_name: &'a Path,
    log_format: &'a str,
}

/// A [`Sink`] writing one JSON line per record to a single collection file.
pub struct JsonlSink {
    path: PathBuf,
    file: Mutex<fs::File>,
}

impl JsonlSink {
    /// Open `<root_dir>/<collection>.jsonl` for appending, creating the
    /// directory and the file as needed.
    pub async fn open(root_dir: &Path, collection: &str) -> Result<Self, SinkError> {
        fs::create_dir_all(root_dir).await?;
        let path = root_dir.join(format!("{collection}.jsonl"));
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the collection file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Sink for JsonlSink {
    async fn insert(&self, record: Record) -> Result<(), SinkError> {
        let document = Document {
            id: Uuid::new_v4(),
            log_date: record.ts,
            log_msg: &record.message,
            file_name: &record.source,
            log_format: record.layout.pattern(),
        };
        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');

        // One guarded write per record: workers insert concurrently and the
        // file must never see interleaved bytes.
        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use sml_core::TimestampLayout;
    use std::collections::HashSet;

    fn record(second: u32, message: &str) -> Record {
        Record {
            ts: Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, second).unwrap(),
            message: message.to_string(),
            source: "/var/log/app.log".into(),
            layout: TimestampLayout::Rfc3339,
        }
    }

    #[tokio::test]
    async fn inserts_append_one_document_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::open(dir.path(), "logs").await.unwrap();

        sink.insert(record(1, "first")).await.unwrap();
        sink.insert(record(2, "second")).await.unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let documents: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0]["log_msg"], "first");
        assert_eq!(documents[1]["log_msg"], "second");
        assert_eq!(documents[0]["file_name"], "/var/log/app.log");
        assert_eq!(
            documents[0]["log_format"],
            TimestampLayout::Rfc3339.pattern()
        );
    }

    #[tokio::test]
    async fn every_document_gets_a_fresh_id() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonlSink::open(dir.path(), "logs").await.unwrap();

        for i in 0..20 {
            sink.insert(record(i, "same message")).await.unwrap();
        }

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        let ids: HashSet<String> = contents
            .lines()
            .map(|line| {
                let doc: serde_json::Value = serde_json::from_str(line).unwrap();
                doc["id"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test]
    async fn reopening_appends_rather_than_truncates() {
        let dir = tempfile::tempdir().unwrap();
        {
            let sink = JsonlSink::open(dir.path(), "logs").await.unwrap();
            sink.insert(record(1, "from first run")).await.unwrap();
        }
        let sink = JsonlSink::open(dir.path(), "logs").await.unwrap();
        sink.insert(record(2, "from second run")).await.unwrap();

        let contents = std::fs::read_to_string(sink.path()).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
