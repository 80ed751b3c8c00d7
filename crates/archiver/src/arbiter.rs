//! Per-iteration decision on who may extend the timeline
//!
//! Before each slice the lock record is re-read and interpreted:
//!
//! - our own archiving lock: slice up to the oplog's last write
//! - an archiving lock held by someone else: the duty moved (e.g. after an
//!   election), stop
//! - a backup lock: wait for the backup to publish its start, make the last
//!   slice up to it and stop
//! - no lock even after waiting (the backup may have dropped our lock without
//!   taking its own yet): undefined, stop
//! - any other operation: stop

use crate::traits::{Membership, MetadataStore, OplogSource};
use crate::waiters::{wait_for_backup_start, wait_for_lock};
use pitr_core::{Error, LockHeader, LockKind, NodeId, Result, ResultExt, Timestamp};
use pitr_utils::PollConfig;

/// What the next iteration should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Slice up to `end`; when `last` is set, stop after persisting it
    Slice { end: Timestamp, last: bool },
    /// The node may no longer archive; stop without error
    Ineligible,
}

/// Interprets the lock record of one replica set for one node
pub struct LockArbiter<'a> {
    store: &'a dyn MetadataStore,
    membership: &'a dyn Membership,
    oplog: &'a dyn OplogSource,
    header: LockHeader,
    me: NodeId,
    poll: PollConfig,
}

impl<'a> LockArbiter<'a> {
    pub fn new(
        store: &'a dyn MetadataStore,
        membership: &'a dyn Membership,
        oplog: &'a dyn OplogSource,
        header: LockHeader,
        me: NodeId,
        poll: PollConfig,
    ) -> Self {
        Self {
            store,
            membership,
            oplog,
            header,
            me,
            poll,
        }
    }

    /// Decide the end of the next slice
    pub async fn arbitrate(&self) -> Result<Decision> {
        let eligible = self.membership.is_eligible().await.context("node check")?;
        if !eligible {
            return Ok(Decision::Ineligible);
        }

        let lock = wait_for_lock(self.store, &self.header, &self.poll).await?;

        match lock.kind {
            LockKind::Pitr => {
                if !lock.is_held_by(&self.me) {
                    let holder = lock.node.map(|n| n.to_string()).unwrap_or_default();
                    return Err(Error::lock_stolen(holder));
                }
                let end = self
                    .oplog
                    .last_write()
                    .await
                    .context("define last write timestamp")?;
                Ok(Decision::Slice { end, last: false })
            }
            LockKind::Backup => {
                let Some(name) = lock.backup_name.clone() else {
                    return Err(Error::conflicting_operation(lock));
                };
                let end =
                    wait_for_backup_start(self.store, &name, &self.header.replset, &self.poll)
                        .await?;
                Ok(Decision::Slice { end, last: true })
            }
            LockKind::Undefined => Err(Error::UndefinedOperation),
            LockKind::Other(_) => Err(Error::conflicting_operation(lock)),
        }
    }
}
