//! Shared utilities for oplog point-in-time archiving
//!
//! Bounded polling for external state that settles asynchronously, and the
//! tracing subscriber setup used by the archiver's entry points.

pub mod resilience;
pub mod tracing;

pub use resilience::*;
