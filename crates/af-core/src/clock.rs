//! Time source and timer used by the waiting primitives

use std::time::Duration;

use async_trait::async_trait;

/// Monotonic-enough clock plus an async sleep.
///
/// Everything runs on the page's single event loop, so the futures are not
/// required to be `Send`.
#[async_trait(?Send)]
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    async fn sleep(&self, duration: Duration);
}
