use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use log::trace;
use tokio::sync::Semaphore;

use crate::error::{Error, Result};

/// Caps how many invocations of an operation are in flight at once.
///
/// A `Limit` holds a fixed pool of slots.  [`Limit::run`] takes a slot
/// before driving its future and frees it when the future settles,
/// success or failure alike; callers past the cap suspend and resume
/// in arrival order.  The limiter never inspects or swallows the
/// wrapped operation's failures.
///
/// ```rust
/// use flowctl::limit::Limit;
///
/// let limit = Limit::new(2).unwrap();
/// let doubled = futures::executor::block_on(limit.run(async { 21 * 2 }));
/// assert_eq!(doubled, 42);
/// ```
#[derive(Clone, Debug)]
pub struct Limit {
    permits: Arc<Semaphore>,
}

impl Limit {
    /// Builds a limiter allowing `concurrency` invocations in flight.
    /// Zero is rejected; the type rules out negatives and fractions.
    pub fn new(concurrency: usize) -> Result<Limit> {
        if concurrency == 0 {
            return Err(Error::InvalidConcurrency(concurrency));
        }
        Ok(Limit { permits: Arc::new(Semaphore::new(concurrency)) })
    }

    /// Awaits a free slot, then drives `fut` to completion.
    pub async fn run<F: Future>(&self, fut: F) -> F::Output {
        let _permit = self
            .permits
            .acquire()
            .await
            .expect("limiter semaphore closed");
        trace!("Limiter slot acquired");
        fut.await
    }

    /// Lifts a unary async function into one with the same signature
    /// that takes a slot per call.
    pub fn wrap<A, F, Fut>(self, f: F) -> impl Fn(A) -> BoxFuture<'static, Fut::Output>
    where
        A: Send + 'static,
        F: Fn(A) -> Fut,
        Fut: Future + Send + 'static,
    {
        move |arg| {
            let limit = self.clone();
            let fut = f(arg);
            async move { limit.run(fut).await }.boxed()
        }
    }
}

#[cfg(test)]
mod limit_test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_rejects_zero() {
        let err = Limit::new(0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected concurrency to be a positive integer: 0"
        );
    }

    #[tokio::test]
    async fn test_caps_in_flight() {
        let limit = Limit::new(2).unwrap();
        let in_flight = AtomicUsize::new(0);
        let high_water = AtomicUsize::new(0);

        let runs: Vec<_> = (0..5)
            .map(|_| {
                let limit = limit.clone();
                let in_flight = &in_flight;
                let high_water = &high_water;
                async move {
                    limit
                        .run(async move {
                            let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                            high_water.fetch_max(now, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                            in_flight.fetch_sub(1, Ordering::SeqCst);
                        })
                        .await
                }
            })
            .collect();
        futures::future::join_all(runs).await;

        assert!(high_water.load(Ordering::SeqCst) <= 2);
        assert!(high_water.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_wrap_keeps_signature() {
        let limit = Limit::new(1).unwrap();
        let double = limit.wrap(|x: u32| async move { x * 2 });
        assert_eq!(double(4).await, 8);
        assert_eq!(double(5).await, 10);
    }

    #[tokio::test]
    async fn test_failures_free_the_slot() {
        let limit = Limit::new(1).unwrap();
        let failed: Result<()> = limit.run(async { Err(Error::StreamClosed) }).await;
        assert!(failed.is_err());
        // The slot freed by the failure is available again.
        assert_eq!(limit.run(async { 1 }).await, 1);
    }
}
