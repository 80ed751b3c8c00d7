//! Configuration management for the oplog archiver
//!
//! This crate owns the archiver's tunables: the slicing period, the chunk
//! path prefix, the default codec and the lock/backup-start wait budget.

pub mod config;
pub mod loader;


pub use config::{ArchiverConfig, ConfigFile, PollFile};
pub use loader::ConfigLoader;
