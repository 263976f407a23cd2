//! Throttle trait for abstracting over limiter implementations.

use async_trait::async_trait;

use crate::clock::Clock;

use super::limiter::WindowedRateLimiter;
use super::window::Decision;

/// Trait for throttling backends.
///
/// This abstracts over [`WindowedRateLimiter`] so the HTTP adapter and the
/// registry can work with any admission strategy.
#[async_trait]
pub trait Throttle: Send + Sync {
    /// Check and record one request for `identifier`.
    async fn limit(&self, identifier: &str) -> Decision;
}

#[async_trait]
impl<C: Clock> Throttle for WindowedRateLimiter<C> {
    async fn limit(&self, identifier: &str) -> Decision {
        WindowedRateLimiter::limit(self, identifier)
    }
}
