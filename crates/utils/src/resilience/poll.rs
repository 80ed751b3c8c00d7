//! Bounded polling with a fixed cadence.

use pitr_core::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_BACKUP_START};
use pitr_core::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

/// Cadence and budget of a bounded poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Time between two probes
    pub interval: Duration,
    /// Total time before giving up
    pub max_wait: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_WAIT_BACKUP_START,
        }
    }
}

impl PollConfig {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }

    /// Number of probes the budget allows, never less than one
    pub fn max_attempts(&self) -> u32 {
        if self.interval.is_zero() {
            return 1;
        }
        let attempts = self.max_wait.as_nanos() / self.interval.as_nanos();
        u32::try_from(attempts).unwrap_or(u32::MAX).max(1)
    }
}

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe<T> {
    /// The awaited state was observed
    Settled(T),
    /// Not there yet, optionally with what was seen instead
    Pending(Option<T>),
}

impl<T> Probe<T> {
    pub fn is_settled(&self) -> bool {
        matches!(self, Probe::Settled(_))
    }

    /// The carried value, settled or not
    pub fn into_inner(self) -> Option<T> {
        match self {
            Probe::Settled(v) => Some(v),
            Probe::Pending(v) => v,
        }
    }
}

/// Probe until the state settles or the budget is spent.
///
/// Each pending probe is followed by one tick of `config.interval`. An error
/// from the probe ends the poll immediately. Running out of attempts is not an
/// error: the last pending value seen is returned and the caller decides.
pub async fn poll_until<F, Fut, T>(config: &PollConfig, mut probe: F) -> Result<Probe<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Probe<T>>>,
{
    let mut ticker = interval(config.interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;

    let attempts = config.max_attempts();
    let mut last_seen = None;
    for attempt in 0..attempts {
        match probe(attempt).await? {
            Probe::Settled(value) => {
                if attempt > 0 {
                    tracing::debug!(attempt, "state settled after polling");
                }
                return Ok(Probe::Settled(value));
            }
            Probe::Pending(seen) => {
                if seen.is_some() {
                    last_seen = seen;
                }
            }
        }
        ticker.tick().await;
    }

    tracing::debug!(attempts, "poll budget exhausted");
    Ok(Probe::Pending(last_seen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pitr_core::Error;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config() -> PollConfig {
        PollConfig::new(Duration::from_secs(1), Duration::from_secs(5))
    }

    #[test]
    fn test_max_attempts() {
        assert_eq!(config().max_attempts(), 5);
        assert_eq!(PollConfig::default().max_attempts(), 51);
        assert_eq!(
            PollConfig::new(Duration::from_secs(2), Duration::from_secs(1)).max_attempts(),
            1
        );
        assert_eq!(PollConfig::new(Duration::ZERO, Duration::from_secs(1)).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settles_on_third_probe() {
        let start = tokio::time::Instant::now();
        let result = poll_until(&config(), |attempt| async move {
            if attempt == 2 {
                Ok(Probe::Settled(attempt))
            } else {
                Ok(Probe::Pending(None))
            }
        })
        .await
        .unwrap();

        assert_eq!(result, Probe::Settled(2));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_seen() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let start = tokio::time::Instant::now();

        let result = poll_until(&config(), move |attempt| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 1 {
                    Ok(Probe::Pending(Some("seen")))
                } else {
                    Ok(Probe::Pending(None))
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, Probe::Pending(Some("seen")));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_aborts_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<Probe<()>> = poll_until(&config(), move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::transport("get lock", Error::NoBackupFound)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
