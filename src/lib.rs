//! sml — Ship My Logs.
//!
//! Continuously tails a set of growing log files, parses newly appended
//! lines into structured records, and forwards them through a bounded queue
//! to a persistence sink.
//!
//! # Architecture
//!
//! ```text
//! paths (stdin) ──► Orchestrator ──► Tail Engine (×N files)
//!                                         │ parse
//!                                         ▼
//!                                   bounded Queue ──► Worker Pool ──► Sink
//! ```
//!
//! Each tail engine is an independent task watching one file; a failing file
//! never affects the others. All engines feed one bounded queue, drained by
//! a fixed pool of sink workers — a slow sink throttles ingestion instead of
//! growing a buffer. The orchestrator owns both lifetimes: workers start
//! before any engine runs, and the queue closes only after every engine has
//! terminated.

pub mod orchestrator;

pub use orchestrator::{Orchestrator, RunSummary};
