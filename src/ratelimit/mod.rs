//! Fixed-window throttling logic and state management.

mod limiter;
mod registry;
mod sweep;
mod throttle;
mod window;

pub use limiter::WindowedRateLimiter;
pub use registry::LimiterRegistry;
pub use sweep::{Sweepable, Sweeper, DEFAULT_SWEEP_INTERVAL};
pub use throttle::Throttle;
pub use window::{Decision, RateWindow, WindowStats};
