//! Ephemeral population snapshot.
//!
//! Recomputed from the live platform on every pass — never persisted,
//! never trusted across a queue delay — so locally-held eviction state
//! cannot drift from a population the user mutates at any moment.

use tracing::warn;

use crate::capacity::effective_capacity;
use crate::config::Config;
use crate::platform::{PlatformError, TabInfo, TabPlatform};

/// One pass's view of the tab population.
#[derive(Debug, Clone)]
pub struct TabSnapshot {
    /// Every tab, pinned included.
    pub total: usize,
    /// Pinned tabs are exempt from capacity accounting and eviction.
    pub pinned: usize,
    /// Tabs subject to the capacity bound, in platform order.
    pub non_pinned: Vec<TabInfo>,
    /// Effective capacity at capture time.
    pub capacity: usize,
    /// Hidden-queue length at capture time.
    pub hidden_len: usize,
}

impl TabSnapshot {
    /// Capture a fresh snapshot.
    ///
    /// A failed window query degrades to the fixed limit; a failed tab
    /// query fails the capture and the caller treats the pass as a
    /// no-op.
    pub async fn capture(
        platform: &dyn TabPlatform,
        config: &Config,
        hidden_len: usize,
    ) -> Result<Self, PlatformError> {
        let tabs = platform.query_all().await?;

        let width = if config.adaptive_limit {
            match platform.query_windows().await {
                Ok(windows) => focused_width(&windows),
                Err(err) => {
                    warn!(error = %err, "window query failed, using fixed limit");
                    None
                }
            }
        } else {
            None
        };
        let capacity = effective_capacity(config, width);

        let (pinned, non_pinned): (Vec<TabInfo>, Vec<TabInfo>) =
            tabs.iter().cloned().partition(|t| t.pinned);

        Ok(Self {
            total: tabs.len(),
            pinned: pinned.len(),
            non_pinned,
            capacity,
            hidden_len,
        })
    }

    /// More non-pinned tabs than capacity allows.
    #[must_use]
    pub fn needs_hiding(&self) -> bool {
        self.non_pinned.len() > self.capacity
    }

    /// Spare capacity exists and hidden entries remain.
    #[must_use]
    pub fn can_restore(&self) -> bool {
        self.non_pinned.len() < self.capacity && self.hidden_len > 0
    }

    /// Non-pinned tabs over capacity.
    #[must_use]
    pub fn excess(&self) -> usize {
        self.non_pinned.len().saturating_sub(self.capacity)
    }

    /// Capacity left for restorations.
    #[must_use]
    pub fn spare(&self) -> usize {
        self.capacity.saturating_sub(self.non_pinned.len())
    }
}

/// Width of the focused window, falling back to the first reported
/// window.
pub(crate) fn focused_width(windows: &[crate::platform::WindowInfo]) -> Option<u32> {
    windows
        .iter()
        .find(|w| w.focused)
        .or_else(|| windows.first())
        .map(|w| w.width)
}
