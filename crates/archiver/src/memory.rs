//! In-memory collaborators
//!
//! Scriptable stand-ins for the metadata store, the membership view and the
//! oplog reader. Scripted sequences (lock records, backup metadata, last-write
//! values) are consumed one value per read, and the final value sticks.

use crate::traits::{Membership, MetadataStore, OplogSource, WindowReader};
use async_trait::async_trait;
use parking_lot::Mutex;
use pitr_core::{
    BackupMeta, Chunk, CompressionType, Error, LockData, LockHeader, NodeId, ReplsetMeta,
    RestoreMeta, Result, Timestamp,
};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn next_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

fn unavailable(what: &str) -> Error {
    Error::transport(
        what,
        std::io::Error::new(std::io::ErrorKind::ConnectionReset, "metadata store unavailable"),
    )
}

#[derive(Debug, Default)]
struct StoreState {
    backups: Vec<BackupMeta>,
    backup_scripts: HashMap<String, VecDeque<BackupMeta>>,
    restores: Vec<RestoreMeta>,
    chunks: Vec<Chunk>,
    locks: HashMap<String, VecDeque<Option<LockData>>>,
    lock_reads: usize,
    backup_reads: usize,
    fail_reads: bool,
    fail_add_chunk: bool,
    lose_add_chunk_reply: bool,
}

/// Metadata store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryMetadataStore {
    state: Mutex<StoreState>,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed backup; the latest added is the last backup
    pub fn add_backup(&self, backup: BackupMeta) {
        self.state.lock().backups.push(backup);
    }

    /// Record a restore; the latest added is the last restore
    pub fn add_restore(&self, restore: RestoreMeta) {
        self.state.lock().restores.push(restore);
    }

    /// Index a chunk directly
    pub fn push_chunk(&self, chunk: Chunk) {
        self.state.lock().chunks.push(chunk);
    }

    /// Set a replica set's lock record; `None` removes it
    pub fn set_lock(&self, replset: &str, lock: Option<LockData>) {
        self.script_locks(replset, vec![lock]);
    }

    /// Lock records returned by successive reads
    pub fn script_locks(&self, replset: &str, locks: Vec<Option<LockData>>) {
        self.state
            .lock()
            .locks
            .insert(replset.to_string(), locks.into());
    }

    /// Metadata of a running backup as returned by successive reads
    pub fn script_backup(&self, name: &str, metas: Vec<BackupMeta>) {
        self.state
            .lock()
            .backup_scripts
            .insert(name.to_string(), metas.into());
    }

    /// Make every read fail with a transport error
    pub fn fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Make indexing chunks fail with a transport error
    pub fn fail_add_chunk(&self, fail: bool) {
        self.state.lock().fail_add_chunk = fail;
    }

    /// Make indexing chunks commit, then report a transport error
    pub fn lose_add_chunk_reply(&self, lose: bool) {
        self.state.lock().lose_add_chunk_reply = lose;
    }

    /// Indexed chunks of `replset` in insertion order
    pub fn chunks(&self, replset: &str) -> Vec<Chunk> {
        self.state
            .lock()
            .chunks
            .iter()
            .filter(|c| c.replset == replset)
            .cloned()
            .collect()
    }

    /// Number of lock record reads served
    pub fn lock_reads(&self) -> usize {
        self.state.lock().lock_reads
    }

    /// Number of backup metadata reads served
    pub fn backup_reads(&self) -> usize {
        self.state.lock().backup_reads
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn last_backup(&self) -> Result<Option<BackupMeta>> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(unavailable("find last backup"));
        }
        Ok(state.backups.last().cloned())
    }

    async fn last_restore(&self) -> Result<Option<RestoreMeta>> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(unavailable("find last restore"));
        }
        Ok(state.restores.last().cloned())
    }

    async fn last_chunk(&self, replset: &str) -> Result<Option<Chunk>> {
        let state = self.state.lock();
        if state.fail_reads {
            return Err(unavailable("find last chunk"));
        }
        Ok(state
            .chunks
            .iter()
            .filter(|c| c.replset == replset)
            .max_by_key(|c| c.start_ts)
            .cloned())
    }

    async fn add_chunk(&self, chunk: &Chunk) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_add_chunk {
            return Err(unavailable("insert chunk"));
        }
        state.chunks.push(chunk.clone());
        if state.lose_add_chunk_reply {
            return Err(unavailable("insert chunk"));
        }
        Ok(())
    }

    async fn lock_data(&self, header: &LockHeader) -> Result<Option<LockData>> {
        let mut state = self.state.lock();
        state.lock_reads += 1;
        if state.fail_reads {
            return Err(unavailable("find lock"));
        }
        Ok(state
            .locks
            .get_mut(&header.replset)
            .and_then(next_sticky)
            .flatten())
    }

    async fn backup_meta(&self, name: &str) -> Result<Option<BackupMeta>> {
        let mut state = self.state.lock();
        state.backup_reads += 1;
        if state.fail_reads {
            return Err(unavailable("find backup"));
        }
        if let Some(meta) = state.backup_scripts.get_mut(name).and_then(next_sticky) {
            return Ok(Some(meta));
        }
        Ok(state.backups.iter().rev().find(|b| b.name == name).cloned())
    }
}

/// Membership view with a fixed identity and a switchable eligibility
#[derive(Debug)]
pub struct StaticMembership {
    id: NodeId,
    eligible: AtomicBool,
    checks: AtomicUsize,
}

impl StaticMembership {
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            eligible: AtomicBool::new(true),
            checks: AtomicUsize::new(0),
        }
    }

    pub fn set_eligible(&self, eligible: bool) {
        self.eligible.store(eligible, Ordering::SeqCst);
    }

    /// Number of eligibility checks served
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Membership for StaticMembership {
    async fn is_eligible(&self) -> Result<bool> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.eligible.load(Ordering::SeqCst))
    }

    async fn self_id(&self) -> Result<NodeId> {
        Ok(self.id.clone())
    }
}

/// Oplog reader producing synthetic entries for each window
#[derive(Debug, Default)]
pub struct MemoryOplog {
    last_writes: Mutex<VecDeque<Timestamp>>,
    windows: Mutex<Vec<(Timestamp, Timestamp)>>,
}

impl MemoryOplog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-write values returned by successive reads
    pub fn script_last_writes(&self, values: impl IntoIterator<Item = Timestamp>) {
        *self.last_writes.lock() = values.into_iter().collect();
    }

    /// Every window set so far
    pub fn windows(&self) -> Vec<(Timestamp, Timestamp)> {
        self.windows.lock().clone()
    }

    /// Bytes produced for a window
    pub fn window_bytes(start: Timestamp, end: Timestamp) -> Vec<u8> {
        format!("{{\"ts\":[{start},{end})}}\n").repeat(32).into_bytes()
    }
}

#[async_trait]
impl OplogSource for MemoryOplog {
    fn set_window(&self, start: Timestamp, end: Timestamp) {
        self.windows.lock().push((start, end));
    }

    async fn last_write(&self) -> Result<Timestamp> {
        next_sticky(&mut self.last_writes.lock())
            .ok_or_else(|| Error::transport("read last write", Error::NoStartingPoint))
    }

    async fn window_reader(&self) -> Result<WindowReader> {
        let (start, end) = self
            .windows
            .lock()
            .last()
            .copied()
            .ok_or_else(|| Error::configuration("oplog window not set"))?;
        Ok(Box::new(Cursor::new(Self::window_bytes(start, end))))
    }
}

/// A completed backup of `rs0` consistent to `last_write` seconds
pub fn backup(name: &str, start_ts: i64, last_write: u32) -> BackupMeta {
    BackupMeta {
        name: name.to_string(),
        start_ts,
        last_write_ts: Timestamp::new(last_write, 0),
        replsets: vec![ReplsetMeta {
            name: "rs0".to_string(),
            first_write_ts: Timestamp::new(u32::try_from(start_ts).unwrap_or(u32::MAX), 0),
            last_write_ts: Timestamp::new(last_write, 0),
        }],
    }
}

/// A running backup that has published `first_write` for `replset`; `0`
/// means not published yet
pub fn running_backup(name: &str, replset: &str, first_write: u32) -> BackupMeta {
    BackupMeta {
        name: name.to_string(),
        start_ts: i64::from(first_write),
        last_write_ts: Timestamp::ZERO,
        replsets: vec![ReplsetMeta {
            name: replset.to_string(),
            first_write_ts: Timestamp::new(first_write, 0),
            last_write_ts: Timestamp::ZERO,
        }],
    }
}

/// An indexed gzip chunk covering `[start, end)` seconds
pub fn chunk(replset: &str, start: u32, end: u32) -> Chunk {
    Chunk {
        replset: replset.to_string(),
        file_name: crate::namer::chunk_path(
            pitr_core::DEFAULT_PATH_PREFIX,
            replset,
            start,
            end,
            CompressionType::Gzip,
        ),
        compression: CompressionType::Gzip,
        start_ts: Timestamp::new(start, 0),
        end_ts: Timestamp::new(end, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_locks_stick_on_last() {
        let store = MemoryMetadataStore::new();
        let header = LockHeader::new("rs0");
        store.script_locks(
            "rs0",
            vec![None, Some(LockData::pitr(header.clone(), NodeId::new("a")))],
        );

        assert_eq!(store.lock_data(&header).await.unwrap(), None);
        for _ in 0..3 {
            assert!(store.lock_data(&header).await.unwrap().is_some());
        }
        assert_eq!(store.lock_reads(), 4);
        assert_eq!(store.lock_data(&LockHeader::new("rs1")).await.unwrap(), None);
    }

    #[test]
    fn test_backup_fixture_saturates_out_of_range_start() {
        let meta = backup("bcp1", i64::from(u32::MAX) + 10, 100);
        assert_eq!(
            meta.replsets[0].first_write_ts,
            Timestamp::new(u32::MAX, 0)
        );
        assert_eq!(
            backup("bcp2", 1_000, 100).replsets[0].first_write_ts,
            Timestamp::new(1_000, 0)
        );
    }

    #[tokio::test]
    async fn test_lost_reply_still_indexes() {
        let store = MemoryMetadataStore::new();
        store.lose_add_chunk_reply(true);

        assert!(store.add_chunk(&chunk("rs0", 100, 200)).await.is_err());
        assert_eq!(store.chunks("rs0").len(), 1);
    }

    #[tokio::test]
    async fn test_last_chunk_orders_by_start() {
        let store = MemoryMetadataStore::new();
        store.push_chunk(chunk("rs0", 200, 300));
        store.push_chunk(chunk("rs0", 100, 200));

        let last = store.last_chunk("rs0").await.unwrap().unwrap();
        assert_eq!(last.end_ts, Timestamp::new(300, 0));
        assert!(store.last_chunk("rs9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_oplog_reader_follows_window() {
        let oplog = MemoryOplog::new();
        assert!(oplog.window_reader().await.is_err());
        assert!(oplog.last_write().await.is_err());

        oplog.script_last_writes([Timestamp::new(5, 0)]);
        assert_eq!(oplog.last_write().await.unwrap(), Timestamp::new(5, 0));
        assert_eq!(oplog.last_write().await.unwrap(), Timestamp::new(5, 0));

        oplog.set_window(Timestamp::new(1, 0), Timestamp::new(5, 0));
        let mut reader = oplog.window_reader().await.unwrap();
        let mut out = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut reader, &mut out)
            .await
            .unwrap();
        assert_eq!(
            out,
            MemoryOplog::window_bytes(Timestamp::new(1, 0), Timestamp::new(5, 0))
        );
    }
}
