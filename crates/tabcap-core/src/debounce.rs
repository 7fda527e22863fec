//! Trailing-edge debouncer.
//!
//! Collapses a burst of signals into one call that fires after the
//! burst goes quiet for the configured delay. A single pending timer
//! slot: re-triggering cancels the pending timer and re-arms it.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Single-slot trailing-edge debouncer.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    slot: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Mutex::new(None),
        }
    }

    /// Arm (or re-arm) the timer; `action` runs once the delay elapses
    /// without another trigger. Must be called within a tokio runtime.
    pub fn trigger<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });

        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(prior) = slot.replace(handle) {
            prior.abort();
        }
    }

    /// Cancel any pending timer.
    pub fn cancel(&self) {
        let mut slot = match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(prior) = slot.take() {
            prior.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn burst_collapses_to_one_trailing_call() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            let fired = Arc::clone(&fired);
            debouncer.trigger(async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        // Quiet period: only the final arm fires.
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_suppresses_pending_call() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        debouncer.trigger(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        debouncer.cancel();
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_after_fire_works() {
        let debouncer = Debouncer::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = Arc::clone(&fired);
            debouncer.trigger(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(200)).await;
        }

        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
