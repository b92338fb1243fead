//! sml-core — Ship My Logs core library.
//!
//! Shared building blocks for the tailing pipeline: the parsed [`Record`]
//! and its [`TimestampLayout`], the pure line parser, the bounded record
//! queue, and the configuration surface.
//!
//! # Architecture
//!
//! ```text
//! Tail Engine ──► parse ──► Queue ──► Worker Pool ──► Sink
//!  (sml-tail)   (sml-core)          (sml-sink)
//! ```
//!
//! All inter-task communication uses channels; the queue is the only value
//! touched by more than one task.

pub mod config;
pub mod parse;
pub mod queue;
pub mod types;

pub use config::Config;
pub use types::{FileCursor, LineCounters, Record, TimestampLayout};
