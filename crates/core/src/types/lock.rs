//! Shared lock record arbitrating archiving against full backups

use super::node::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Selects the lock record of one replica set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockHeader {
    pub replset: String,
}

impl LockHeader {
    pub fn new(replset: impl Into<String>) -> Self {
        Self {
            replset: replset.into(),
        }
    }
}

/// Operation currently holding a replica set's lock
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockKind {
    /// Oplog archiving
    Pitr,
    /// Full backup
    Backup,
    /// No operation observed
    #[default]
    Undefined,
    /// Any other operation (restore, resync, ...)
    Other(String),
}

impl Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockKind::Pitr => f.write_str("pitr"),
            LockKind::Backup => f.write_str("backup"),
            LockKind::Undefined => f.write_str("undefined"),
            LockKind::Other(name) => f.write_str(name),
        }
    }
}

/// A snapshot of a lock record, copied out of the metadata store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockData {
    pub header: LockHeader,
    pub kind: LockKind,
    /// Member holding the lock
    pub node: Option<NodeId>,
    /// Name of the backup when `kind` is [`LockKind::Backup`]
    pub backup_name: Option<String>,
}

impl LockData {
    /// The value read when no record exists
    pub fn undefined(header: LockHeader) -> Self {
        Self {
            header,
            kind: LockKind::Undefined,
            node: None,
            backup_name: None,
        }
    }

    pub fn pitr(header: LockHeader, node: NodeId) -> Self {
        Self {
            header,
            kind: LockKind::Pitr,
            node: Some(node),
            backup_name: None,
        }
    }

    pub fn backup(header: LockHeader, node: NodeId, backup_name: impl Into<String>) -> Self {
        Self {
            header,
            kind: LockKind::Backup,
            node: Some(node),
            backup_name: Some(backup_name.into()),
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.kind == LockKind::Undefined
    }

    /// Whether `node` is the holder
    pub fn is_held_by(&self, node: &NodeId) -> bool {
        self.node.as_ref() == Some(node)
    }
}

impl Display for LockData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lock on {}", self.kind, self.header.replset)?;
        if let Some(node) = &self.node {
            write!(f, " held by {node}")?;
        }
        if let Some(name) = &self.backup_name {
            write!(f, " (backup {name})")?;
        }
        Ok(())
    }
}
