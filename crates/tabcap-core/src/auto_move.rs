//! Auto-move timer — a single-slot cancelable scheduled task.
//!
//! At most one pending move exists per controller instance. Arming for
//! a tab always disarms any prior slot first, so a timer can never fire
//! against a tab the user has already switched away from; the firing
//! action itself re-verifies the target is still active.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug)]
struct ArmedMove {
    tab_id: u64,
    handle: JoinHandle<()>,
}

/// The single pending auto-move slot.
#[derive(Debug, Default)]
pub struct AutoMoveSlot {
    slot: Mutex<Option<ArmedMove>>,
}

impl AutoMoveSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer for `tab_id`, replacing any pending slot. `fire`
    /// runs after `delay`; it is responsible for re-verifying the
    /// target. Must be called within a tokio runtime.
    pub fn arm<F>(&self, tab_id: u64, delay: Duration, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire.await;
        });

        let mut slot = self.lock();
        if let Some(prior) = slot.replace(ArmedMove { tab_id, handle }) {
            debug!(tab_id = prior.tab_id, "auto-move timer superseded");
            prior.handle.abort();
        }
    }

    /// Cancel any pending move.
    pub fn disarm(&self) {
        if let Some(prior) = self.lock().take() {
            prior.handle.abort();
        }
    }

    /// Tab id of the pending slot, if armed. The slot is not cleared
    /// on fire, so this may name a tab whose move already ran; arming
    /// and disarming both supersede it either way.
    #[must_use]
    pub fn armed_tab(&self) -> Option<u64> {
        self.lock().as_ref().map(|armed| armed.tab_id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<ArmedMove>> {
        match self.slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let slot = AutoMoveSlot::new();
        let moved = Arc::new(AtomicU64::new(0));

        let moved_tab = Arc::clone(&moved);
        slot.arm(7, Duration::from_millis(3_000), async move {
            moved_tab.store(7, Ordering::SeqCst);
        });
        assert_eq!(slot.armed_tab(), Some(7));

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert_eq!(moved.load(Ordering::SeqCst), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_supersedes_the_prior_target() {
        let slot = AutoMoveSlot::new();
        let moved = Arc::new(AtomicU64::new(0));

        let first = Arc::clone(&moved);
        slot.arm(1, Duration::from_millis(1_000), async move {
            first.store(1, Ordering::SeqCst);
        });
        tokio::time::sleep(Duration::from_millis(500)).await;

        let second = Arc::clone(&moved);
        slot.arm(2, Duration::from_millis(1_000), async move {
            second.store(2, Ordering::SeqCst);
        });
        assert_eq!(slot.armed_tab(), Some(2));

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        // Only the second slot ever fired.
        assert_eq!(moved.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_cancels_the_pending_move() {
        let slot = AutoMoveSlot::new();
        let moved = Arc::new(AtomicU64::new(0));

        let fire = Arc::clone(&moved);
        slot.arm(3, Duration::from_millis(1_000), async move {
            fire.store(3, Ordering::SeqCst);
        });
        slot.disarm();
        assert_eq!(slot.armed_tab(), None);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(moved.load(Ordering::SeqCst), 0);
    }
}
