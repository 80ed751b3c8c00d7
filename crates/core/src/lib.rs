//! Core domain types, errors, and constants for oplog point-in-time archiving.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum, its `ErrorClass` taxonomy and the
//!   `Result` alias shared by every crate in the workspace.
//! - **`types`**: timestamps, chunks, lock records, backup and restore
//!   metadata. All of them are plain values copied out of the metadata store.
//! - **`constants`**: defaults and environment variable names.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, ErrorClass, Result, ResultExt},
    types::*,
};
