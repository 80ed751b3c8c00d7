//! Collaborator contracts consumed by the archiver
//!
//! The metadata store, the replica set membership view and the oplog reader
//! are owned by the surrounding process. The archiver only sees them through
//! these traits, which lets the in-memory implementations in
//! [`crate::memory`] stand in for them.

use crate::storage::Storage;
use crate::upload;
use async_trait::async_trait;
use pitr_core::{
    BackupMeta, Chunk, CompressionType, LockData, LockHeader, NodeId, RestoreMeta, Result,
    Timestamp,
};
use tokio::io::AsyncRead;

/// Byte stream of one oplog window
pub type WindowReader = Box<dyn AsyncRead + Send + Unpin>;

/// Durable metadata shared by every member of the cluster.
///
/// "Not found" is `Ok(None)`; `Err` is reserved for transport failures.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Most recent completed full backup
    async fn last_backup(&self) -> Result<Option<BackupMeta>>;

    /// Most recent restore
    async fn last_restore(&self) -> Result<Option<RestoreMeta>>;

    /// Chunk with the greatest start timestamp for `replset`
    async fn last_chunk(&self, replset: &str) -> Result<Option<Chunk>>;

    /// Index an uploaded chunk
    async fn add_chunk(&self, chunk: &Chunk) -> Result<()>;

    /// Current lock record of a replica set
    async fn lock_data(&self, header: &LockHeader) -> Result<Option<LockData>>;

    /// A backup by name, finished or still running
    async fn backup_meta(&self, name: &str) -> Result<Option<BackupMeta>>;
}

/// This process's view of its replica set membership
#[async_trait]
pub trait Membership: Send + Sync {
    /// Whether the node may still archive (e.g. is a healthy secondary)
    async fn is_eligible(&self) -> Result<bool>;

    /// Identity the node holds locks under
    async fn self_id(&self) -> Result<NodeId>;
}

/// Reader of the local oplog
#[async_trait]
pub trait OplogSource: Send + Sync {
    /// Bound the next read to `[start, end)`
    fn set_window(&self, start: Timestamp, end: Timestamp);

    /// Timestamp of the newest oplog entry
    async fn last_write(&self) -> Result<Timestamp>;

    /// Stream the entries of the current window
    async fn window_reader(&self) -> Result<WindowReader>;

    /// Compress the current window and save it as `path`; returns bytes stored.
    ///
    /// The default encodes with the built-in codecs of [`crate::upload`].
    async fn upload(
        &self,
        storage: &dyn Storage,
        compression: CompressionType,
        path: &str,
    ) -> Result<u64> {
        let reader = self.window_reader().await?;
        upload::upload(reader, storage, compression, path).await
    }
}
