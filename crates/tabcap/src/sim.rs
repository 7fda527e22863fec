//! In-memory browser simulator.
//!
//! Stands in for a real host so the controller can be driven from the
//! command line: one tab strip, one window with an adjustable width,
//! and counters for every mutation the controller issues. User actions
//! (opening, closing, focusing tabs) go through the helper methods;
//! controller actions arrive through the `TabPlatform` impl.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tabcap_core::{BadgeColor, BadgeSink, MoveTarget, PlatformError, TabInfo, TabPlatform, WindowInfo};
use tracing::debug;

/// Mutations issued by the controller, not by the simulated user.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimStats {
    /// Tabs created (restorations).
    pub created: usize,
    /// Tabs removed (evictions).
    pub removed: usize,
    /// Tabs moved (auto-move).
    pub moved: usize,
}

#[derive(Debug)]
struct SimState {
    tabs: Vec<TabInfo>,
    next_id: u64,
    width: u32,
    stats: SimStats,
}

/// The simulated browser.
#[derive(Debug)]
pub struct SimPlatform {
    state: Mutex<SimState>,
}

impl SimPlatform {
    #[must_use]
    pub fn new(width: u32) -> Self {
        Self {
            state: Mutex::new(SimState {
                tabs: Vec::new(),
                next_id: 1,
                width,
                stats: SimStats::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// User opens a tab. Returns the new tab for the created trigger.
    pub fn open_tab(&self, url: &str) -> TabInfo {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        let position = state.tabs.len() as u32;
        let tab = TabInfo {
            id,
            url: url.to_string(),
            pending_url: None,
            title: format!("tab {id}"),
            icon_url: None,
            pinned: false,
            position,
            active: false,
        };
        state.tabs.push(tab.clone());
        tab
    }

    /// User closes a tab. Returns whether it existed.
    pub fn close_tab(&self, tab_id: u64) -> bool {
        let mut state = self.lock();
        let before = state.tabs.len();
        state.tabs.retain(|t| t.id != tab_id);
        let existed = state.tabs.len() < before;
        if existed {
            reindex(&mut state.tabs);
        }
        existed
    }

    /// User focuses a tab. Returns whether it existed.
    pub fn focus_tab(&self, tab_id: u64) -> bool {
        let mut state = self.lock();
        let exists = state.tabs.iter().any(|t| t.id == tab_id);
        if exists {
            for tab in &mut state.tabs {
                tab.active = tab.id == tab_id;
            }
        }
        exists
    }

    /// Window resize.
    pub fn set_width(&self, width: u32) {
        self.lock().width = width;
    }

    #[must_use]
    pub fn tab_ids(&self) -> Vec<u64> {
        self.lock().tabs.iter().map(|t| t.id).collect()
    }

    /// Visible non-pinned tab count.
    #[must_use]
    pub fn visible(&self) -> usize {
        self.lock().tabs.iter().filter(|t| !t.pinned).count()
    }

    #[must_use]
    pub fn stats(&self) -> SimStats {
        self.lock().stats
    }
}

fn reindex(tabs: &mut [TabInfo]) {
    for (i, tab) in tabs.iter_mut().enumerate() {
        tab.position = i as u32;
    }
}

#[async_trait]
impl TabPlatform for SimPlatform {
    async fn query_all(&self) -> Result<Vec<TabInfo>, PlatformError> {
        Ok(self.lock().tabs.clone())
    }

    async fn create(&self, url: &str, active: bool) -> Result<TabInfo, PlatformError> {
        let tab = self.open_tab(url);
        let mut state = self.lock();
        state.stats.created += 1;
        if active {
            for t in &mut state.tabs {
                t.active = t.id == tab.id;
            }
        }
        debug!(tab_id = tab.id, url, "sim: tab restored");
        Ok(tab)
    }

    async fn remove(&self, tab_id: u64) -> Result<(), PlatformError> {
        if !self.close_tab(tab_id) {
            return Err(PlatformError::TabNotFound(tab_id));
        }
        self.lock().stats.removed += 1;
        debug!(tab_id, "sim: tab evicted");
        Ok(())
    }

    async fn move_tab(&self, tab_id: u64, target: MoveTarget) -> Result<(), PlatformError> {
        let mut state = self.lock();
        let Some(idx) = state.tabs.iter().position(|t| t.id == tab_id) else {
            return Err(PlatformError::TabNotFound(tab_id));
        };
        let tab = state.tabs.remove(idx);
        match target {
            MoveTarget::Start => state.tabs.insert(0, tab),
            MoveTarget::End => state.tabs.push(tab),
            MoveTarget::Index(i) => {
                let i = (i as usize).min(state.tabs.len());
                state.tabs.insert(i, tab);
            }
        }
        reindex(&mut state.tabs);
        state.stats.moved += 1;
        debug!(tab_id, ?target, "sim: tab moved");
        Ok(())
    }

    async fn query_windows(&self) -> Result<Vec<WindowInfo>, PlatformError> {
        Ok(vec![WindowInfo {
            width: self.lock().width,
            focused: true,
        }])
    }
}

/// Badge sink that logs updates and keeps the latest view for the
/// end-of-run summary.
#[derive(Debug, Default)]
pub struct LogBadge {
    text: Mutex<String>,
    color: Mutex<Option<BadgeColor>>,
}

impl LogBadge {
    #[must_use]
    pub fn text(&self) -> String {
        match self.text.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    #[must_use]
    pub fn color(&self) -> Option<BadgeColor> {
        match self.color.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl BadgeSink for LogBadge {
    fn set_text(&self, text: &str) {
        debug!(text, "badge text");
        if let Ok(mut guard) = self.text.lock() {
            *guard = text.to_string();
        }
    }

    fn set_color(&self, color: BadgeColor) {
        debug!(hex = color.hex(), "badge color");
        if let Ok(mut guard) = self.color.lock() {
            *guard = Some(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn controller_mutations_are_counted_separately() {
        let sim = SimPlatform::new(1_920);
        let user_tab = sim.open_tab("https://a.example");
        assert_eq!(sim.stats().created, 0);

        let restored = sim.create("https://b.example", false).await.unwrap();
        assert_eq!(sim.stats().created, 1);
        assert_ne!(restored.id, user_tab.id);

        sim.remove(user_tab.id).await.unwrap();
        assert_eq!(sim.stats().removed, 1);
        assert_eq!(sim.visible(), 1);
        assert!(sim.remove(user_tab.id).await.is_err());
    }

    #[tokio::test]
    async fn moves_reindex_positions() {
        let sim = SimPlatform::new(1_920);
        let a = sim.open_tab("https://a.example");
        let b = sim.open_tab("https://b.example");
        sim.move_tab(b.id, MoveTarget::Start).await.unwrap();

        let tabs = sim.query_all().await.unwrap();
        assert_eq!(tabs[0].id, b.id);
        assert_eq!(tabs[0].position, 0);
        assert_eq!(tabs[1].id, a.id);
        assert_eq!(tabs[1].position, 1);
    }
}
