//! The archiving worker of one replica set
//!
//! Wakes up on a timer (or on request), asks the [`LockArbiter`] how far it
//! may go, uploads the oplog window since the previous checkpoint, indexes
//! the chunk and only then moves the checkpoint. A crash between upload and
//! indexing therefore never moves the resume point past what is indexed.

use crate::arbiter::{Decision, LockArbiter};
use crate::catchup::catchup;
use crate::namer::chunk_path;
use crate::storage::Storage;
use crate::traits::{Membership, MetadataStore, OplogSource};
use pitr_config::ArchiverConfig;
use pitr_core::{Chunk, CompressionType, Error, LockHeader, Result, ResultExt, Timestamp};
use pitr_utils::tracing::pitr_span;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn, Instrument};

/// Why a worker stopped without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamExit {
    /// The cancellation future completed
    Cancelled,
    /// The node is no longer suitable for archiving
    Ineligible,
    /// A full backup took over; the timeline is covered up to `last_ts`
    Handoff { last_ts: Timestamp },
}

/// Streams a replica set's oplog into the storage, chunk by chunk
pub struct PitrStream {
    replset: String,
    config: ArchiverConfig,
    store: Arc<dyn MetadataStore>,
    membership: Arc<dyn Membership>,
    oplog: Arc<dyn OplogSource>,
    /// Exclusive lower bound of the next chunk
    last_ts: Timestamp,
}

impl PitrStream {
    pub fn new(
        replset: impl Into<String>,
        config: ArchiverConfig,
        store: Arc<dyn MetadataStore>,
        membership: Arc<dyn Membership>,
        oplog: Arc<dyn OplogSource>,
    ) -> Self {
        Self {
            replset: replset.into(),
            config,
            store,
            membership,
            oplog,
            last_ts: Timestamp::ZERO,
        }
    }

    pub fn replset(&self) -> &str {
        &self.replset
    }

    /// Current checkpoint
    pub fn last_ts(&self) -> Timestamp {
        self.last_ts
    }

    /// Seed the checkpoint explicitly instead of via [`PitrStream::catchup`]
    pub fn start_from(&mut self, ts: Timestamp) {
        self.last_ts = ts;
    }

    /// Seed the checkpoint from the durable backup and chunk history
    pub async fn catchup(&mut self) -> Result<()> {
        self.last_ts = catchup(self.store.as_ref(), &self.replset).await?;
        Ok(())
    }

    /// Catch up, then stream with the configured compression
    pub async fn run<C>(
        &mut self,
        cancel: C,
        wakeup: &mut mpsc::Receiver<()>,
        storage: &dyn Storage,
    ) -> Result<StreamExit>
    where
        C: Future<Output = ()>,
    {
        self.catchup().await?;
        let compression = self.config.compression;
        self.stream(cancel, wakeup, storage, compression).await
    }

    /// Save chunks until cancelled, handed off, or failed.
    ///
    /// Every `slice_span` (or whenever `wakeup` receives) one chunk covering
    /// `[last_ts, end)` is written, with `end` decided by the lock record.
    pub async fn stream<C>(
        &mut self,
        cancel: C,
        wakeup: &mut mpsc::Receiver<()>,
        storage: &dyn Storage,
        compression: CompressionType,
    ) -> Result<StreamExit>
    where
        C: Future<Output = ()>,
    {
        let span = pitr_span(&self.replset);
        self.stream_inner(cancel, wakeup, storage, compression)
            .instrument(span)
            .await
    }

    async fn stream_inner<C>(
        &mut self,
        cancel: C,
        wakeup: &mut mpsc::Receiver<()>,
        storage: &dyn Storage,
        compression: CompressionType,
    ) -> Result<StreamExit>
    where
        C: Future<Output = ()>,
    {
        self.config.validate()?;
        if self.last_ts.is_zero() {
            return Err(Error::NoStartingPoint);
        }
        info!(
            from = %self.last_ts.to_datetime(),
            last_ts = %self.last_ts,
            "streaming started"
        );

        // identity is fixed for the whole run; a different holder later on
        // means the lock was stolen
        let me = self
            .membership
            .self_id()
            .await
            .context("get node identity")?;

        let store = Arc::clone(&self.store);
        let membership = Arc::clone(&self.membership);
        let oplog = Arc::clone(&self.oplog);
        let arbiter = LockArbiter::new(
            store.as_ref(),
            membership.as_ref(),
            oplog.as_ref(),
            LockHeader::new(self.replset.clone()),
            me,
            self.config.poll,
        );

        let span = self.config.slice_span;
        let mut ticker = interval_at(Instant::now() + span, span);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cancel = std::pin::pin!(cancel);

        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => {
                    info!("got done signal, stopping");
                    return Ok(StreamExit::Cancelled);
                }
                Some(()) = wakeup.recv() => {
                    info!("got wake_up signal");
                }
                _ = ticker.tick() => {}
            }

            let (end, last) = match arbiter.arbitrate().await? {
                Decision::Ineligible => {
                    info!("node is no longer suitable for archiving, stopping");
                    return Ok(StreamExit::Ineligible);
                }
                Decision::Slice { end, last } => (end, last),
            };

            // object names only carry seconds, so a window must move past
            // the checkpoint's second to get a name of its own
            if end.t <= self.last_ts.t {
                if last {
                    info!(last_ts = %self.last_ts, "backup starts within saved oplog, stopping");
                    return Ok(StreamExit::Handoff {
                        last_ts: self.last_ts,
                    });
                }
                debug!(last_ts = %self.last_ts, "no new oplog since the last chunk");
                continue;
            }

            self.save_chunk(storage, compression, end).await?;

            if last {
                info!(
                    last_ts = %self.last_ts,
                    at = %self.last_ts.to_datetime(),
                    "pausing/stopping with last_ts"
                );
                return Ok(StreamExit::Handoff {
                    last_ts: self.last_ts,
                });
            }
        }
    }

    /// Upload `[last_ts, end)`, index it and advance the checkpoint
    async fn save_chunk(
        &mut self,
        storage: &dyn Storage,
        compression: CompressionType,
        end: Timestamp,
    ) -> Result<Chunk> {
        let start = self.last_ts;
        self.oplog.set_window(start, end);

        let fname = chunk_path(
            &self.config.path_prefix,
            &self.replset,
            start.t,
            end.t,
            compression,
        );
        let written = match self.oplog.upload(storage, compression, &fname).await {
            Ok(written) => written,
            Err(e @ Error::Unsupported { .. }) => return Err(e),
            Err(e) => {
                return Err(Error::transport(
                    format!("unable to upload chunk {}.{}", start.t, end.t),
                    e,
                ))
            }
        };
        debug!(path = %fname, bytes = written, "chunk uploaded");

        let chunk = Chunk {
            replset: self.replset.clone(),
            file_name: fname,
            compression,
            start_ts: start,
            end_ts: end,
        };
        if let Err(e) = self.store.add_chunk(&chunk).await {
            warn!(
                path = %chunk.file_name,
                start = %start,
                end = %end,
                error = %e,
                "chunk uploaded but its metadata was not saved"
            );
            remove_orphan(self.store.as_ref(), storage, &chunk).await;
            return Err(Error::transport(
                format!("unable to save chunk meta {}", chunk.file_name),
                e,
            ));
        }

        info!(path = %chunk.file_name, start = %start, end = %end, bytes = written, "chunk saved");
        self.last_ts = end;
        Ok(chunk)
    }
}

/// Drop the object of `chunk` unless the index knows about it.
///
/// A failed index write may still have committed, so the object is only
/// removed once the store confirms the chunk is missing. When that cannot be
/// confirmed the object stays.
async fn remove_orphan(store: &dyn MetadataStore, storage: &dyn Storage, chunk: &Chunk) {
    let path = chunk.file_name.as_str();
    match store.last_chunk(&chunk.replset).await {
        Ok(Some(last)) if last.file_name == chunk.file_name && last.end_ts == chunk.end_ts => {
            warn!(path, "chunk metadata write failed but the chunk is indexed, keeping it");
            return;
        }
        Ok(_) => {}
        Err(e) => {
            warn!(path, error = %e, "unable to check the chunk index, keeping the object");
            return;
        }
    }

    match storage.delete(path).await {
        Ok(()) => info!(path, "removed unindexed chunk"),
        Err(e) => error!(path, error = %e, "failed to remove unindexed chunk"),
    }
}
