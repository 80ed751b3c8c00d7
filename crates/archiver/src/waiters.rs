//! Bounded waits for state published by other operations
//!
//! A full backup deletes the archiving lock before it acquires its own, and
//! publishes its per replica set cut-over point only after it started. Both
//! waits poll at the configured cadence within the same budget.

use crate::traits::MetadataStore;
use pitr_core::{Error, LockData, LockHeader, Result, ResultExt, Timestamp};
use pitr_utils::{poll_until, PollConfig, Probe};

/// Read the lock record of `header`, waiting for one to appear.
///
/// Returns the last record seen once the budget is spent, which may still be
/// undefined. A transport error ends the wait immediately.
pub async fn wait_for_lock(
    store: &dyn MetadataStore,
    header: &LockHeader,
    poll: &PollConfig,
) -> Result<LockData> {
    let outcome = poll_until(poll, move |_| async move {
        let lock = store
            .lock_data(header)
            .await
            .context("get lock")?
            .unwrap_or_else(|| LockData::undefined(header.clone()));
        if lock.is_undefined() {
            Ok(Probe::Pending(Some(lock)))
        } else {
            Ok(Probe::Settled(lock))
        }
    })
    .await?;

    Ok(outcome
        .into_inner()
        .unwrap_or_else(|| LockData::undefined(header.clone())))
}

/// Wait until backup `name` publishes its first-write timestamp for `replset`
pub async fn wait_for_backup_start(
    store: &dyn MetadataStore,
    name: &str,
    replset: &str,
    poll: &PollConfig,
) -> Result<Timestamp> {
    let outcome = poll_until(poll, move |_| async move {
        let backup = store.backup_meta(name).await.context("get backup meta")?;
        match backup.and_then(|b| b.first_write_for(replset)) {
            Some(ts) => Ok(Probe::Settled(ts)),
            None => Ok(Probe::Pending(None)),
        }
    })
    .await?;

    match outcome {
        Probe::Settled(ts) => Ok(ts),
        Probe::Pending(_) => Err(Error::timeout(
            format!("wait for backup {name} to start on {replset}"),
            poll.max_wait,
        )),
    }
}
