//! Recording sinks for integration harnesses.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use sml_core::Record;
use sml_sink::{Sink, SinkError};

/// A [`Sink`] that keeps every inserted record in memory.
#[derive(Default)]
pub struct MemorySink {
    records: Mutex<Vec<Record>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything inserted so far.
    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Poll until at least `count` records have been inserted. Panics if
    /// `deadline` passes first — a harness that trips this wants a bigger
    /// write burst timeout, not a silent shortfall.
    pub async fn wait_for(&self, count: usize, deadline: Duration) {
        let started = Instant::now();
        loop {
            let len = self.len();
            if len >= count {
                return;
            }
            assert!(
                started.elapsed() < deadline,
                "sink received {len} of {count} expected records within {deadline:?}"
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn insert(&self, record: Record) -> Result<(), SinkError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}
