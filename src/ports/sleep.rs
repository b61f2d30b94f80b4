//! Sleep port for the poller's wait intervals.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Boxed future type alias used by [`Sleeper`] to keep the trait
/// dyn-compatible.
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Suspends the current task for a duration.
///
/// Abstracting the wait lets poller tests run instantly and count sleep
/// cycles exactly.
pub trait Sleeper: Send + Sync {
    /// Resolves after roughly `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}
