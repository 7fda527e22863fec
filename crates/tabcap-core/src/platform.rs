//! Tab platform seam — the externally-managed tab population.
//!
//! The controller never talks to a browser directly; it consumes this
//! trait. Implementations wrap the real host (an extension bridge, a
//! remote-debugging socket) or a simulator. The trait enables testing
//! the whole controller against an in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from tab platform operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The tab no longer exists (closed or moved by the user mid-pass).
    #[error("tab {0} not found")]
    TabNotFound(u64),

    /// Tab creation was rejected by the host.
    #[error("tab creation failed: {0}")]
    CreateFailed(String),

    /// Window enumeration failed.
    #[error("window query failed: {0}")]
    WindowQuery(String),

    /// The host is unreachable or shutting down.
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// A live tab as reported by the platform.
///
/// Identity (`id`) is owned by the platform and is never reused for a
/// hidden entry; a restored tab always comes back with a fresh id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: u64,
    pub url: String,
    /// URL still being resolved by the host, if navigation is in flight.
    #[serde(default)]
    pub pending_url: Option<String>,
    pub title: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Pinned tabs are exempt from capacity accounting and eviction.
    pub pinned: bool,
    /// Left-to-right position in the tab strip.
    pub position: u32,
    pub active: bool,
}

impl TabInfo {
    /// The URL to retain when this tab is evicted: the committed URL,
    /// falling back to the pending one while navigation is in flight.
    #[must_use]
    pub fn effective_url(&self) -> &str {
        if self.url.is_empty() {
            self.pending_url.as_deref().unwrap_or_default()
        } else {
            &self.url
        }
    }
}

/// A host window, queried for adaptive capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Inner width in pixels.
    pub width: u32,
    pub focused: bool,
}

/// Target position for a tab move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveTarget {
    /// Leftmost position in the strip.
    Start,
    /// Rightmost position in the strip.
    End,
    /// Explicit index.
    Index(u32),
}

/// Host tab platform consumed by the controller.
///
/// All calls may suspend; all calls may fail transiently. The
/// controller treats failures per its eviction/restoration policy and
/// never stops processing triggers because of one.
#[async_trait]
pub trait TabPlatform: Send + Sync {
    /// Enumerate every tab across all windows.
    async fn query_all(&self) -> Result<Vec<TabInfo>, PlatformError>;

    /// Create a tab for `url`. Returns the new live tab.
    async fn create(&self, url: &str, active: bool) -> Result<TabInfo, PlatformError>;

    /// Remove (close) a tab.
    async fn remove(&self, tab_id: u64) -> Result<(), PlatformError>;

    /// Move a tab within its strip.
    async fn move_tab(&self, tab_id: u64, target: MoveTarget) -> Result<(), PlatformError>;

    /// Enumerate normal windows.
    async fn query_windows(&self) -> Result<Vec<WindowInfo>, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(url: &str, pending: Option<&str>) -> TabInfo {
        TabInfo {
            id: 1,
            url: url.to_string(),
            pending_url: pending.map(str::to_string),
            title: String::new(),
            icon_url: None,
            pinned: false,
            position: 0,
            active: false,
        }
    }

    #[test]
    fn effective_url_prefers_committed() {
        let t = tab("https://a.example", Some("https://b.example"));
        assert_eq!(t.effective_url(), "https://a.example");
    }

    #[test]
    fn effective_url_falls_back_to_pending() {
        let t = tab("", Some("https://b.example"));
        assert_eq!(t.effective_url(), "https://b.example");
        assert_eq!(tab("", None).effective_url(), "");
    }
}
