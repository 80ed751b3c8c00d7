//! Backup and restore records read from the metadata store

use super::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Per replica set progress of a full backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplsetMeta {
    pub name: String,
    /// Cut-over point published once the backup has started on this replica set
    pub first_write_ts: Timestamp,
    pub last_write_ts: Timestamp,
}

/// A full backup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupMeta {
    pub name: String,
    pub start_ts: i64,
    /// Cluster time the backup is consistent to
    pub last_write_ts: Timestamp,
    pub replsets: Vec<ReplsetMeta>,
}

impl BackupMeta {
    /// First-write timestamp of `replset`, once published.
    ///
    /// The backup writes a placeholder of `1` before the real value is known,
    /// so only values past it count.
    pub fn first_write_for(&self, replset: &str) -> Option<Timestamp> {
        self.replsets
            .iter()
            .find(|rs| rs.name == replset && rs.first_write_ts.t > 1)
            .map(|rs| rs.first_write_ts)
    }
}

/// A restore that was applied to the cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreMeta {
    /// Backup the restore was made from
    pub backup: String,
    pub start_ts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backup(first_write: u32) -> BackupMeta {
        BackupMeta {
            name: "bcp1".to_string(),
            start_ts: 1_700_000_000,
            last_write_ts: Timestamp::ZERO,
            replsets: vec![ReplsetMeta {
                name: "rs0".to_string(),
                first_write_ts: Timestamp::new(first_write, 0),
                last_write_ts: Timestamp::ZERO,
            }],
        }
    }

    #[test]
    fn test_first_write_requires_publication() {
        assert_eq!(backup(0).first_write_for("rs0"), None);
        assert_eq!(backup(1).first_write_for("rs0"), None);
        assert_eq!(backup(250).first_write_for("rs0"), Some(Timestamp::new(250, 0)));
        assert_eq!(backup(250).first_write_for("rs1"), None);
    }
}
