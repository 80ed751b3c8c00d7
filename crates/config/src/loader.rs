//! Configuration loader
//!
//! Layers, lowest precedence first: built-in defaults, an optional JSON file,
//! then `PITR_*` environment variables.

use crate::config::{ArchiverConfig, ConfigFile};
use pitr_core::constants::{
    PITR_COMPRESSION_VAR, PITR_PATH_PREFIX_VAR, PITR_POLL_INTERVAL_VAR, PITR_SLICE_SPAN_VAR,
    PITR_WAIT_BACKUP_START_VAR,
};
use pitr_core::{CompressionType, Error, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Loads an [`ArchiverConfig`]
pub struct ConfigLoader {
    /// Optional JSON file
    file: Option<PathBuf>,
    /// Environment snapshot; the process environment when unset
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            file: None,
            env: None,
        }
    }

    /// Read settings from a JSON file
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use the given variables instead of the process environment
    pub fn env(mut self, vars: HashMap<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Load and validate the configuration
    pub fn load(self) -> Result<ArchiverConfig> {
        let mut config = ArchiverConfig::default();

        if let Some(path) = &self.file {
            config.merge(read_file(path)?);
            tracing::debug!(path = %path.display(), "loaded archiver config file");
        }

        let env = self.env.unwrap_or_else(|| std::env::vars().collect());
        apply_env(&mut config, &env)?;

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_file(path: &Path) -> Result<ConfigFile> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        Error::configuration(format!("cannot read config file '{}': {e}", path.display()))
    })?;
    serde_json::from_str(&raw).map_err(|e| {
        Error::configuration(format!("invalid config file '{}': {e}", path.display()))
    })
}

fn apply_env(config: &mut ArchiverConfig, env: &HashMap<String, String>) -> Result<()> {
    if let Some(span) = env_secs(env, PITR_SLICE_SPAN_VAR)? {
        config.slice_span = span;
    }
    if let Some(prefix) = env.get(PITR_PATH_PREFIX_VAR) {
        config.path_prefix = prefix.clone();
    }
    if let Some(compression) = env.get(PITR_COMPRESSION_VAR) {
        config.compression = compression.parse::<CompressionType>()?;
    }
    if let Some(interval) = env_secs(env, PITR_POLL_INTERVAL_VAR)? {
        config.poll.interval = interval;
    }
    if let Some(max_wait) = env_secs(env, PITR_WAIT_BACKUP_START_VAR)? {
        config.poll.max_wait = max_wait;
    }
    Ok(())
}

fn env_secs(env: &HashMap<String, String>, var: &str) -> Result<Option<Duration>> {
    match env.get(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|e| {
                Error::configuration(format!("{var}='{raw}' is not a number of seconds: {e}"))
            }),
    }
}
