//! Periodic eviction tasks for in-memory stores.
//!
//! Stores that hold time-bounded entries implement [`Sweep`]. A sweeper is
//! started explicitly with [`spawn_sweeper`] and stopped through the returned
//! [`SweepHandle`], so no store owns a hidden background task.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A store whose stale entries can be evicted.
pub trait Sweep: Send + Sync + 'static {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Remove stale entries and return how many were evicted.
    ///
    /// Must not hold locks across entries for long; request handling keeps
    /// running while a sweep is in progress.
    fn sweep(&self) -> usize;
}

/// Handle to a running sweeper task.
pub struct SweepHandle {
    name: &'static str,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SweepHandle {
    /// Name of the swept store.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the sweeper and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await
            && e.is_panic()
        {
            tracing::error!(store = self.name, error = ?e, "Sweeper task panicked");
        }
    }
}

/// Spawn a task that calls [`Sweep::sweep`] every `interval`.
///
/// The first sweep happens one `interval` after spawning. Missed ticks are
/// skipped rather than replayed.
///
/// # Panics
///
/// Panics if `interval` is zero (config validation rejects that earlier).
pub fn spawn_sweeper<S: Sweep>(store: Arc<S>, interval: Duration) -> SweepHandle {
    assert!(!interval.is_zero(), "sweep interval must be non-zero");

    let name = store.name();
    let cancel = CancellationToken::new();
    let child = cancel.clone();

    let task = tokio::spawn(async move {
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = child.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = store.sweep();
                    if evicted > 0 {
                        tracing::info!(store = name, evicted, "Sweeper evicted stale entries");
                    } else {
                        tracing::trace!(store = name, "Sweeper found nothing to evict");
                    }
                }
            }
        }

        tracing::debug!(store = name, "Sweeper stopped");
    });

    SweepHandle { name, cancel, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        sweeps: AtomicUsize,
    }

    impl Sweep for CountingStore {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn sweep(&self) -> usize {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            1
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_on_interval() {
        let store = Arc::new(CountingStore::default());
        let handle = spawn_sweeper(store.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.sweeps.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(store.sweeps.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(store.sweeps.load(Ordering::SeqCst), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_when_asked() {
        let store = Arc::new(CountingStore::default());
        let handle = spawn_sweeper(store.clone(), Duration::from_secs(1));
        assert_eq!(handle.name(), "counting");

        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.stop().await;
        let after_stop = store.sweeps.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.sweeps.load(Ordering::SeqCst), after_stop);
    }
}
