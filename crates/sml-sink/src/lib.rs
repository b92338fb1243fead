//! sml-sink — the persistence boundary and worker pool for sml.
//!
//! The pipeline never talks to a concrete store directly: engines produce
//! records, the [`WorkerPool`] drains them from the shared queue, and each
//! worker hands them to a [`Sink`]. Any store that can implement
//! `insert(record)` can sit behind the pool; this crate ships the
//! append-only [`JsonlSink`] used by the binary.

use async_trait::async_trait;
use thiserror::Error;

use sml_core::Record;

pub mod jsonl;
pub mod pool;

pub use jsonl::JsonlSink;
pub use pool::WorkerPool;

/// Why an insert failed. Insert failures are non-fatal to the pipeline: the
/// worker logs them and drops the record.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("sink i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("record could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// An abstract persistence destination for records.
///
/// Implementations must be safe for concurrent invocation: every worker in
/// the pool calls `insert` on the same shared instance.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Persist one record, assigning it a new unique identifier.
    async fn insert(&self, record: Record) -> Result<(), SinkError>;
}
