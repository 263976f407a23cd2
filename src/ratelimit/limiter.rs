//! Core fixed-window rate limiter implementation.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::LimiterSettings;
use crate::error::Result;

use super::window::{Decision, RateWindow, WindowStats};

/// A fixed-window rate limiter tracking admissions per opaque identifier.
///
/// Each distinct identifier owns at most one [`RateWindow`] at a time.
/// Windows are created lazily on first request, replaced in place when found
/// stale, and reclaimed by [`sweep`](Self::sweep). The per-identifier
/// read-modify-write in [`limit`](Self::limit) runs under a write lock, so no
/// more than `max_requests` admissions can occur per identifier per window
/// even under concurrent callers.
///
/// This is a fixed-window counter, not a sliding window: a caller timing
/// requests at a window boundary can achieve up to twice the ceiling across
/// two adjacent windows. The trade-off buys O(1) checks with no per-request
/// history.
///
/// This struct is thread-safe and can be shared across multiple tasks.
pub struct WindowedRateLimiter<C: Clock = SystemClock> {
    /// Immutable limiter settings.
    settings: LimiterSettings,
    /// Windows indexed by identifier.
    windows: RwLock<HashMap<String, RateWindow>>,
    /// Time source; injected so tests can drive expiry deterministically.
    clock: C,
}

impl WindowedRateLimiter<SystemClock> {
    /// Create a limiter using the system clock.
    ///
    /// Fails if the settings are invalid (zero window or zero ceiling).
    pub fn new(settings: LimiterSettings) -> Result<Self> {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> WindowedRateLimiter<C> {
    /// Create a limiter with a custom [`Clock`].
    pub fn with_clock(settings: LimiterSettings, clock: C) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            windows: RwLock::new(HashMap::new()),
            clock,
        })
    }

    /// The settings this limiter was constructed with.
    pub fn settings(&self) -> LimiterSettings {
        self.settings
    }

    /// Check and record one request for `identifier`.
    ///
    /// Total over its inputs: every call returns a [`Decision`], never an
    /// error. The identifier is treated as an opaque key; callers compose it
    /// (e.g. `ip:endpoint`) before calling.
    pub fn limit(&self, identifier: &str) -> Decision {
        let now = self.clock.now_millis();
        let max_requests = self.settings.max_requests;

        trace!(identifier = %identifier, "Checking rate limit");

        let mut windows = self.windows.write();

        match windows.get(identifier).copied() {
            Some(window) if !window.is_stale(now) => {
                if window.count < max_requests {
                    let updated = RateWindow {
                        count: window.count + 1,
                        reset_at: window.reset_at,
                    };
                    windows.insert(identifier.to_string(), updated);
                    Decision {
                        admitted: true,
                        limit: max_requests,
                        remaining: max_requests - updated.count,
                        reset_at: updated.reset_at,
                    }
                } else {
                    // Exhausted: reject without touching the window.
                    debug!(
                        identifier = %identifier,
                        limit = max_requests,
                        "Rate limit exceeded"
                    );
                    Decision {
                        admitted: false,
                        limit: max_requests,
                        remaining: 0,
                        reset_at: window.reset_at,
                    }
                }
            }
            _ => {
                // Missing or stale: open a fresh window counting this request.
                let window = RateWindow::open(now, self.settings.window_ms);
                debug!(
                    identifier = %identifier,
                    reset_at = window.reset_at,
                    "Opening new rate limit window"
                );
                let reset_at = window.reset_at;
                windows.insert(identifier.to_string(), window);
                Decision {
                    admitted: true,
                    limit: max_requests,
                    remaining: max_requests - 1,
                    reset_at,
                }
            }
        }
    }

    /// Read-only view of the current window for `identifier`.
    ///
    /// Never mutates state. Returns `None` for unknown identifiers and for
    /// identifiers whose window is stale, since a stale window is logically
    /// absent.
    pub fn stats(&self, identifier: &str) -> Option<WindowStats> {
        let now = self.clock.now_millis();
        let windows = self.windows.read();
        let window = windows.get(identifier)?;
        if window.is_stale(now) {
            return None;
        }
        Some(WindowStats {
            count: window.count,
            remaining: self.settings.max_requests.saturating_sub(window.count),
            reset_at: window.reset_at,
        })
    }

    /// Unconditionally forget `identifier`.
    ///
    /// The next `limit()` call for it starts a fresh window. Administrative
    /// override, e.g. clearing a lockout.
    pub fn reset(&self, identifier: &str) {
        let mut windows = self.windows.write();
        if windows.remove(identifier).is_some() {
            debug!(identifier = %identifier, "Rate limit window reset");
        }
    }

    /// Reclaim every expired window, returning the number removed.
    ///
    /// Garbage collection only: staleness is re-checked by `limit()` on
    /// access, so a sweep racing a check on the same identifier is harmless.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let mut windows = self.windows.write();
        let before = windows.len();
        windows.retain(|_, window| !window.is_stale(now));
        let removed = before - windows.len();
        if removed > 0 {
            trace!(removed = removed, "Swept expired rate limit windows");
        }
        removed
    }

    /// Number of identifiers currently tracked, stale entries included.
    pub fn window_count(&self) -> usize {
        let windows = self.windows.read();
        windows.len()
    }

    /// Drop all tracked windows.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        let mut windows = self.windows.write();
        windows.clear();
    }
}
