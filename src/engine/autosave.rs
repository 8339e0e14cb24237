use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(30);
const MIN_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosavePolicy {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: DEFAULT_AUTOSAVE_INTERVAL,
        }
    }
}

impl AutosavePolicy {
    pub fn every(interval: Duration) -> Self {
        Self {
            enabled: true,
            interval,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Periodic tick source feeding the session's command queue.
///
/// Holds only a weak sender, so it never keeps the queue alive on its own.
/// A tick is dropped rather than queued when the queue is full; the next one
/// covers it. Aborted on `cancel` or drop.
pub struct AutosaveScheduler {
    handle: JoinHandle<()>,
}

impl AutosaveScheduler {
    pub fn start<M, F>(interval: Duration, tx: &mpsc::Sender<M>, tick: F) -> Self
    where
        M: Send + 'static,
        F: Fn() -> M + Send + 'static,
    {
        let period = interval.max(MIN_AUTOSAVE_INTERVAL);
        let weak = tx.downgrade();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(tx) = weak.upgrade() else {
                    tracing::debug!("Auto-save scheduler stopping: queue closed");
                    break;
                };
                match tx.try_send(tick()) {
                    Ok(()) => tracing::trace!("Auto-save tick queued"),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        tracing::trace!("Auto-save tick skipped (queue full)")
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        });

        tracing::debug!("Auto-save scheduler started ({}s)", period.as_secs());
        Self { handle }
    }

    pub fn cancel(self) {
        tracing::debug!("Auto-save scheduler cancelled");
        drop(self);
    }

    #[cfg(test)]
    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for AutosaveScheduler {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
