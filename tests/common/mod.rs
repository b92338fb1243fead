//! Shared test utilities for sml integration harnesses.
//!
//! Import everything you need via `mod common; use common::*;` at the top of
//! each harness file. The writers produce the same `<timestamp> | <message>`
//! line shape the pipeline expects; [`MemorySink`] records every insert so
//! harnesses can assert on exact delivery counts.

pub mod builders;
pub mod sinks;

pub use builders::*;
pub use sinks::*;
