//! Shared background sweeper for expired windows.
//!
//! One sweeper serves every limiter instance in the process. The interval is
//! a fixed process-wide value, independent of any limiter's window length,
//! since a single process commonly runs limiters with very different window
//! configurations. Sweeping is garbage collection only: limiters re-check
//! staleness on access, so correctness never depends on the sweep schedule.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::clock::Clock;

use super::limiter::WindowedRateLimiter;

/// Default sweep interval when none is configured.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Anything the sweeper can reclaim expired state from.
pub trait Sweepable: Send + Sync {
    /// Reclaim expired entries, returning the number removed.
    fn sweep(&self) -> usize;
}

impl<C: Clock> Sweepable for WindowedRateLimiter<C> {
    fn sweep(&self) -> usize {
        WindowedRateLimiter::sweep(self)
    }
}

/// Handle to the background sweep task.
///
/// An explicit handle rather than a process-lifetime timer: the host
/// application starts it, and stopping (or dropping) the handle stops the
/// task, so timers never leak across test runs.
pub struct Sweeper {
    handle: Option<JoinHandle<()>>,
    shutdown: watch::Sender<bool>,
}

impl Sweeper {
    /// Spawn a sweep task over the given limiters.
    pub fn spawn(limiters: Vec<Arc<dyn Sweepable>>, interval: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        info!(
            limiters = limiters.len(),
            interval_secs = interval.as_secs(),
            "Starting rate limit sweeper"
        );

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so the first real
            // sweep happens one full interval after startup.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed: usize = limiters.iter().map(|l| l.sweep()).sum();
                        if removed > 0 {
                            debug!(removed = removed, "Sweeper reclaimed expired windows");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        info!("Rate limit sweeper stopping");
                        break;
                    }
                }
            }
        });

        Self {
            handle: Some(handle),
            shutdown,
        }
    }

    /// Stop the sweep task and wait for it to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LimiterSettings;

    fn test_limiter(clock: ManualClock) -> Arc<WindowedRateLimiter<ManualClock>> {
        Arc::new(
            WindowedRateLimiter::with_clock(LimiterSettings::new(1000, 3).unwrap(), clock)
                .unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reclaims_expired_windows() {
        let clock = ManualClock::new(0);
        let limiter = test_limiter(clock.clone());

        limiter.limit("x");
        assert_eq!(limiter.window_count(), 1);

        // Expire the window, then let one sweep interval elapse.
        clock.set(2000);
        let targets: Vec<Arc<dyn Sweepable>> = vec![limiter.clone()];
        let sweeper = Sweeper::spawn(targets, Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(limiter.window_count(), 0);
        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_leaves_fresh_windows() {
        let clock = ManualClock::new(0);
        let limiter = test_limiter(clock.clone());

        limiter.limit("x");
        let targets: Vec<Arc<dyn Sweepable>> = vec![limiter.clone()];
        let sweeper = Sweeper::spawn(targets, Duration::from_secs(5));
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert_eq!(limiter.window_count(), 1);
        sweeper.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_covers_multiple_limiters() {
        let clock = ManualClock::new(0);
        let first = test_limiter(clock.clone());
        let second = test_limiter(clock.clone());

        first.limit("a");
        second.limit("b");
        clock.set(5000);

        let targets: Vec<Arc<dyn Sweepable>> = vec![first.clone(), second.clone()];
        let sweeper = Sweeper::spawn(targets, Duration::from_secs(1));
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(first.window_count(), 0);
        assert_eq!(second.window_count(), 0);
        sweeper.stop().await;
    }

    #[tokio::test]
    async fn test_sweeper_stop_is_clean() {
        let clock = ManualClock::new(0);
        let limiter = test_limiter(clock);

        let targets: Vec<Arc<dyn Sweepable>> = vec![limiter];
        let sweeper = Sweeper::spawn(targets, Duration::from_secs(60));
        sweeper.stop().await;
    }
}
