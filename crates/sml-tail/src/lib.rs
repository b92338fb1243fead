//! sml-tail — per-file tail engines for sml.
//!
//! Each watched file gets its own [`TailEngine`]: an inotify watch, a byte
//! cursor, and an event loop that turns filesystem notifications into parsed
//! records on the shared queue. Engines are fully independent — one file's
//! failure never affects another's — and terminate either gracefully via
//! [`TailHandle::stop`] or as failed when the file goes away.

pub mod assembler;
pub mod engine;

pub use assembler::LineAssembler;
pub use engine::{EngineError, TailEngine, TailHandle};
