//! Fixed-size worker pool draining the shared record queue into a sink.
//!
//! Workers are spawned before any tail engine starts and terminate only when
//! the queue is closed *and* drained, which the orchestrator guarantees
//! happens after every engine has reached a terminal state. A failed insert
//! is logged and the record dropped; the worker keeps going.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use sml_core::queue::QueueReceiver;
use sml_core::Record;

use crate::Sink;

/// A fixed set of concurrent sink workers.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `workers` tasks, each pulling records from `records` and
    /// handing them to `sink`.
    pub fn spawn(sink: Arc<dyn Sink>, records: QueueReceiver<Record>, workers: usize) -> Self {
        let handles = (0..workers)
            .map(|worker| {
                let sink = Arc::clone(&sink);
                let mut records = records.clone();
                tokio::spawn(async move {
                    while let Some(record) = records.next().await {
                        if let Err(err) = sink.insert(record).await {
                            warn!(worker, error = %err, "sink insert failed; record dropped");
                        }
                    }
                    debug!(worker, "record queue closed and drained; worker exiting");
                })
            })
            .collect();
        Self { handles }
    }

    /// Wait for every worker to exit. Completes once the queue has been
    /// closed and fully drained.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "sink worker panicked");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
