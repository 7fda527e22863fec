//! Bounded hidden-tab queue.
//!
//! A hidden entry is a recipe to recreate a tab (url/title/icon), not a
//! live tab: the platform identity of an evicted tab is discarded, and
//! restoration always creates a brand-new tab.
//!
//! Two disciplines coexist on the same sequence:
//! - eviction appends at the back; inserting past the bound drops the
//!   front (oldest) entry — deliberate data loss, not an error;
//! - restoration pops from the back (most-recently-hidden first), a
//!   stack discipline, with push-back undo on a failed restore.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::access_times::now_ms;
use crate::platform::TabInfo;

/// A previously evicted tab, retained as a recreation recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenEntry {
    /// Opaque local identity, unique per process run. Never a live tab
    /// id.
    pub local_id: u64,
    pub url: String,
    pub title: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Entries seeded from browsing history rather than evicted live
    /// tabs; excluded from the `user` badge count.
    #[serde(default)]
    pub from_history: bool,
}

impl HiddenEntry {
    /// Build the recipe for an evicted live tab.
    #[must_use]
    pub fn for_tab(tab: &TabInfo) -> Self {
        Self {
            local_id: next_local_id(),
            url: tab.effective_url().to_string(),
            title: tab.title.clone(),
            icon_url: tab.icon_url.clone(),
            from_history: false,
        }
    }
}

// Epoch-ms plus random low digits, matching the original id scheme.
fn next_local_id() -> u64 {
    let base = now_ms().max(0) as u64;
    base * 1_000 + rand::rng().random_range(0..1_000)
}

/// Append-at-back bounded queue of hidden entries, oldest at front.
///
/// Invariant: `len() <= max()` after every operation.
#[derive(Debug, Clone)]
pub struct HiddenQueue {
    entries: VecDeque<HiddenEntry>,
    max: usize,
}

impl HiddenQueue {
    /// Create an empty queue bounded at `max` (floored at 1).
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max: max.max(1),
        }
    }

    /// Append an entry, dropping and returning the oldest entry if the
    /// bound would be exceeded.
    pub fn push(&mut self, entry: HiddenEntry) -> Option<HiddenEntry> {
        self.entries.push_back(entry);
        if self.entries.len() > self.max {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Pop the most-recently-hidden entry for restoration.
    pub fn pop_back(&mut self) -> Option<HiddenEntry> {
        self.entries.pop_back()
    }

    /// Undo a failed restoration pop. Does not re-apply the bound: the
    /// entry was just removed, so re-inserting it cannot overflow.
    pub fn push_back(&mut self, entry: HiddenEntry) {
        self.entries.push_back(entry);
    }

    /// Remove one entry by local id. Returns whether it existed.
    pub fn remove(&mut self, local_id: u64) -> bool {
        match self.entries.iter().position(|e| e.local_id == local_id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Re-bound the queue (config change), dropping oldest entries as
    /// needed. Returns the number dropped.
    pub fn set_max(&mut self, max: usize) -> usize {
        self.max = max.max(1);
        let mut dropped = 0;
        while self.entries.len() > self.max {
            self.entries.pop_front();
            dropped += 1;
        }
        dropped
    }

    /// Replace contents from a persisted or externally-updated
    /// sequence, truncating oldest entries past the bound.
    pub fn replace(&mut self, entries: Vec<HiddenEntry>) {
        self.entries = entries.into();
        while self.entries.len() > self.max {
            self.entries.pop_front();
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    pub fn iter(&self) -> impl Iterator<Item = &HiddenEntry> {
        self.entries.iter()
    }

    /// Snapshot as a plain sequence (oldest first), for persistence and
    /// the UI-facing query surface.
    #[must_use]
    pub fn to_vec(&self) -> Vec<HiddenEntry> {
        self.entries.iter().cloned().collect()
    }
}
