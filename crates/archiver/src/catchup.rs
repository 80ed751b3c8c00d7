//! Resume point of the oplog timeline
//!
//! Run when the timeline was lost: on (re)start or after another member's
//! failure. The starting point is the last backup's consistency point or the
//! end of the last chunk, whichever is more recent.

use crate::traits::MetadataStore;
use pitr_core::{Error, Result, ResultExt, Timestamp};

/// Compute where archiving of `replset` has to resume from
pub async fn catchup(store: &dyn MetadataStore, replset: &str) -> Result<Timestamp> {
    let backup = store
        .last_backup()
        .await
        .context("get last backup")?
        .ok_or(Error::NoBackupFound)?;

    let restore = store.last_restore().await.context("get last restore")?;
    if let Some(restore) = restore {
        if restore.start_ts > backup.start_ts {
            return Err(Error::stale_backup(restore.backup));
        }
    }

    let mut last_ts = backup.last_write_ts;

    let chunk = store
        .last_chunk(replset)
        .await
        .context("get last chunk")?;
    if let Some(chunk) = chunk {
        if chunk.end_ts > last_ts {
            last_ts = chunk.end_ts;
        }
    }

    tracing::debug!(rs = replset, backup = %backup.name, last_ts = %last_ts, "catchup resolved");
    Ok(last_ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{backup, chunk, MemoryMetadataStore};
    use pitr_core::{ErrorClass, RestoreMeta};

    #[tokio::test]
    async fn test_no_backup() {
        let store = MemoryMetadataStore::new();
        let err = catchup(&store, "rs0").await.unwrap_err();
        assert!(matches!(err, Error::NoBackupFound));
        assert_eq!(err.class(), ErrorClass::Precondition);
    }

    #[tokio::test]
    async fn test_backup_only() {
        let store = MemoryMetadataStore::new();
        store.add_backup(backup("bcp1", 1_000, 100));

        assert_eq!(catchup(&store, "rs0").await.unwrap(), Timestamp::new(100, 0));
    }

    #[tokio::test]
    async fn test_newer_chunk_wins() {
        let store = MemoryMetadataStore::new();
        store.add_backup(backup("bcp1", 1_000, 100));
        store.push_chunk(chunk("rs0", 100, 180));
        store.push_chunk(chunk("rs0", 180, 200));
        store.push_chunk(chunk("rs1", 200, 900));

        assert_eq!(catchup(&store, "rs0").await.unwrap(), Timestamp::new(200, 0));
    }

    #[tokio::test]
    async fn test_older_chunk_ignored() {
        let store = MemoryMetadataStore::new();
        store.push_chunk(chunk("rs0", 10, 50));
        store.add_backup(backup("bcp2", 1_000, 100));

        assert_eq!(catchup(&store, "rs0").await.unwrap(), Timestamp::new(100, 0));
    }

    #[tokio::test]
    async fn test_restore_after_backup_is_stale() {
        let store = MemoryMetadataStore::new();
        store.add_backup(backup("bcp1", 1_000, 100));
        store.add_restore(RestoreMeta {
            backup: "bcp0".to_string(),
            start_ts: 1_001,
        });

        let err = catchup(&store, "rs0").await.unwrap_err();
        assert!(matches!(err, Error::StaleBackup { ref backup } if backup == "bcp0"));
        assert_eq!(err.to_string(), "no backup found after the restored bcp0");
    }

    #[tokio::test]
    async fn test_restore_before_backup_is_fine() {
        let store = MemoryMetadataStore::new();
        store.add_backup(backup("bcp1", 1_000, 100));
        store.add_restore(RestoreMeta {
            backup: "bcp0".to_string(),
            start_ts: 999,
        });

        assert_eq!(catchup(&store, "rs0").await.unwrap(), Timestamp::new(100, 0));
    }

    #[tokio::test]
    async fn test_store_failure_is_wrapped() {
        let store = MemoryMetadataStore::new();
        store.add_backup(backup("bcp1", 1_000, 100));
        store.fail_reads(true);

        let err = catchup(&store, "rs0").await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Transport);
        assert!(err.to_string().starts_with("get last backup"));
    }
}
