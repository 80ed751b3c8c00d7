//! Archiver configuration
//!
//! `ArchiverConfig` is immutable once loaded and cheap to clone into each
//! replica set's worker.

use pitr_core::constants::{DEFAULT_PATH_PREFIX, DEFAULT_SLICE_SPAN};
use pitr_core::{CompressionType, Error, Result};
use pitr_utils::PollConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings of an archiving worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiverConfig {
    /// Period of the slicing timer
    pub slice_span: Duration,
    /// Leading path segment of chunk objects; empty for none
    pub path_prefix: String,
    /// Codec applied to uploaded chunks
    pub compression: CompressionType,
    /// Cadence and budget of the lock and backup-start waits
    pub poll: PollConfig,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            slice_span: DEFAULT_SLICE_SPAN,
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            compression: CompressionType::default(),
            poll: PollConfig::default(),
        }
    }
}

impl ArchiverConfig {
    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.slice_span.is_zero() {
            return Err(Error::configuration("slice span must be greater than zero"));
        }
        if self.poll.interval.is_zero() {
            return Err(Error::configuration("poll interval must be greater than zero"));
        }
        if self.poll.max_wait < self.poll.interval {
            return Err(Error::configuration(format!(
                "backup start wait ({:?}) is shorter than the poll interval ({:?})",
                self.poll.max_wait, self.poll.interval
            )));
        }
        if self.path_prefix.starts_with('/') || self.path_prefix.ends_with('/') {
            return Err(Error::configuration(format!(
                "path prefix '{}' must not start or end with '/'",
                self.path_prefix
            )));
        }
        Ok(())
    }

    /// Apply the values present in a config file
    pub fn merge(&mut self, file: ConfigFile) {
        if let Some(secs) = file.slice_span_secs {
            self.slice_span = Duration::from_secs(secs);
        }
        if let Some(prefix) = file.path_prefix {
            self.path_prefix = prefix;
        }
        if let Some(compression) = file.compression {
            self.compression = compression;
        }
        if let Some(poll) = file.poll {
            if let Some(secs) = poll.interval_secs {
                self.poll.interval = Duration::from_secs(secs);
            }
            if let Some(secs) = poll.max_wait_secs {
                self.poll.max_wait = Duration::from_secs(secs);
            }
        }
    }
}

/// On-disk representation; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub slice_span_secs: Option<u64>,
    pub path_prefix: Option<String>,
    pub compression: Option<CompressionType>,
    pub poll: Option<PollFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollFile {
    pub interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
}
