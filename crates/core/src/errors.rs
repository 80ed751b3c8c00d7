use crate::types::LockData;
use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for archiving operations
pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Core error type for archiving operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Streaming was asked to start without a resume point
    #[error("no starting point defined")]
    NoStartingPoint,

    /// There is no full backup to continue from
    #[error("no backup found")]
    NoBackupFound,

    /// A restore happened after the most recent backup
    #[error("no backup found after the restored {backup}")]
    StaleBackup { backup: String },

    /// Another member took over archiving for the replica set
    #[error("pitr lock was stolen by node {node}")]
    LockStolen { node: String },

    /// No lock record showed up within the wait budget
    #[error("undefined behaviour operation is running")]
    UndefinedOperation,

    /// The replica set is locked by an operation archiving cannot hand off to
    #[error("another operation is running: {lock}")]
    ConflictingOperation { lock: Box<LockData> },

    /// A bounded wait ran out of tries
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// A collaborator call failed
    #[error("{operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: BoxError,
    },

    /// Object storage I/O
    #[error("storage {operation} failed for '{path}': {source}")]
    Storage {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Unsupported operation errors
    #[error("unsupported feature '{feature}': {message}")]
    Unsupported { feature: String, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },
}

/// Broad classes callers act on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The archiver was set up wrong
    Config,
    /// Durable state does not allow archiving to start
    Precondition,
    /// Another operation owns the replica set
    Conflict,
    /// External state did not settle in time
    Timeout,
    /// Metadata store or storage I/O
    Transport,
}

impl Error {
    /// Classify the error
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::NoStartingPoint | Error::Configuration { .. } | Error::Unsupported { .. } => {
                ErrorClass::Config
            }
            Error::NoBackupFound | Error::StaleBackup { .. } => ErrorClass::Precondition,
            Error::LockStolen { .. }
            | Error::UndefinedOperation
            | Error::ConflictingOperation { .. } => ErrorClass::Conflict,
            Error::Timeout { .. } => ErrorClass::Timeout,
            Error::Transport { .. } | Error::Storage { .. } => ErrorClass::Transport,
        }
    }

    /// Create a stale backup error
    #[must_use]
    pub fn stale_backup(backup: impl Into<String>) -> Self {
        Error::StaleBackup {
            backup: backup.into(),
        }
    }

    /// Create a lock stolen error
    #[must_use]
    pub fn lock_stolen(node: impl Into<String>) -> Self {
        Error::LockStolen { node: node.into() }
    }

    /// Create a conflicting operation error carrying the observed record
    #[must_use]
    pub fn conflicting_operation(lock: LockData) -> Self {
        Error::ConflictingOperation {
            lock: Box::new(lock),
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Wrap a collaborator error with the operation that produced it
    #[must_use]
    pub fn transport(operation: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Transport {
            operation: operation.into(),
            source: source.into(),
        }
    }

    /// Create a storage I/O error
    #[must_use]
    pub fn storage(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::Storage {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create an unsupported feature error
    #[must_use]
    pub fn unsupported(feature: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Unsupported {
            feature: feature.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Configuration {
            message: format!("invalid JSON: {error}"),
        }
    }
}

/// Extension trait for adding operation context to Results
pub trait ResultExt<T> {
    /// Wrap the error as a transport failure of `operation`
    fn context(self, operation: impl Into<String>) -> Result<T>;

    /// Same as [`ResultExt::context`] with a lazily built message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::transport(operation, e))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| Error::transport(f(), e))
    }
}
