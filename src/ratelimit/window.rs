//! Window state and throttling decisions.

use serde::{Deserialize, Serialize};

/// Per-identifier counting state for one fixed window.
///
/// A window is stale once `now >= reset_at`. Stale windows are logically
/// equivalent to absent: the limiter replaces them with a fresh window
/// instead of reusing the old count, so a stale-but-not-yet-swept entry is
/// still handled correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Admitted requests counted so far in this window.
    /// Rejected requests do not increment the count.
    pub count: u64,
    /// Epoch milliseconds at which this window expires.
    pub reset_at: u64,
}

impl RateWindow {
    /// Open a fresh window for a request arriving at `now`.
    pub fn open(now: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_at: now + window_ms,
        }
    }

    /// Whether this window has expired as of `now`.
    pub fn is_stale(&self, now: u64) -> bool {
        now >= self.reset_at
    }
}

/// The outcome of a single throttling check.
///
/// Always returned, never thrown: the limiter is total over its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the request was admitted.
    pub admitted: bool,
    /// The configured admission ceiling, echoed back for caller visibility.
    pub limit: u64,
    /// Requests still permitted in the current window.
    pub remaining: u64,
    /// Epoch milliseconds when the current window resets.
    pub reset_at: u64,
}

impl Decision {
    /// Seconds until the window resets, rounded up, never less than one.
    ///
    /// Suitable for a `Retry-After` header.
    pub fn retry_after_secs(&self, now: u64) -> u64 {
        let remaining_ms = self.reset_at.saturating_sub(now);
        remaining_ms.div_ceil(1000).max(1)
    }
}

/// Read-only view of an identifier's current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStats {
    /// Admitted requests counted in the current window.
    pub count: u64,
    /// Requests still permitted in the current window.
    pub remaining: u64,
    /// Epoch milliseconds when the current window resets.
    pub reset_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_open() {
        let window = RateWindow::open(1_000, 500);
        assert_eq!(window.count, 1);
        assert_eq!(window.reset_at, 1_500);
    }

    #[test]
    fn test_window_staleness_boundary() {
        let window = RateWindow::open(0, 1_000);
        assert!(!window.is_stale(999));
        assert!(window.is_stale(1_000));
        assert!(window.is_stale(5_000));
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let decision = Decision {
            admitted: false,
            limit: 3,
            remaining: 0,
            reset_at: 2_500,
        };
        assert_eq!(decision.retry_after_secs(1_000), 2);
        assert_eq!(decision.retry_after_secs(2_000), 1);
        // Never advertise zero even at the boundary
        assert_eq!(decision.retry_after_secs(2_500), 1);
    }
}
