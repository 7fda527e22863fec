//! Access-time tracking — maps live tab identity to the epoch-ms
//! timestamp of its last interaction.
//!
//! Pure bookkeeping; persistence of the map is the controller's
//! fire-and-forget concern. An unknown identity reads as timestamp 0
//! ("never accessed"), which deliberately sorts ahead of every real
//! timestamp in eviction order: freshly discovered tabs with no
//! recorded access are evicted first.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// Last-interaction timestamps per live tab id.
///
/// Invariant: entries exist only for identities currently known to the
/// platform. Creation/activation inserts, close/eviction removes, and
/// [`AccessTimes::retain_known`] sweeps anything that slipped through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessTimes {
    map: HashMap<u64, i64>,
}

impl AccessTimes {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(map: HashMap<u64, i64>) -> Self {
        Self { map }
    }

    /// Record `now` as the last interaction for `tab_id`.
    pub fn touch(&mut self, tab_id: u64) {
        self.map.insert(tab_id, now_ms());
    }

    /// Record an explicit timestamp. Used by tests and by restore paths
    /// that want a deterministic ordering.
    pub fn touch_at(&mut self, tab_id: u64, timestamp_ms: i64) {
        self.map.insert(tab_id, timestamp_ms);
    }

    /// Drop the entry for a closed or evicted tab. Returns whether an
    /// entry existed.
    pub fn forget(&mut self, tab_id: u64) -> bool {
        self.map.remove(&tab_id).is_some()
    }

    /// Last-interaction timestamp, or 0 for unknown identities.
    #[must_use]
    pub fn time_of(&self, tab_id: u64) -> i64 {
        self.map.get(&tab_id).copied().unwrap_or(0)
    }

    /// Sweep entries whose identity is no longer live. Returns the
    /// number of stale entries removed.
    pub fn retain_known(&mut self, live: impl Fn(u64) -> bool) -> usize {
        let before = self.map.len();
        self.map.retain(|id, _| live(*id));
        before - self.map.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of the raw map, for persistence.
    #[must_use]
    pub fn to_map(&self) -> HashMap<u64, i64> {
        self.map.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_identity_reads_zero() {
        let times = AccessTimes::new();
        assert_eq!(times.time_of(42), 0);
    }

    #[test]
    fn touch_then_forget() {
        let mut times = AccessTimes::new();
        times.touch(1);
        assert!(times.time_of(1) > 0);
        assert!(times.forget(1));
        assert!(!times.forget(1));
        assert_eq!(times.time_of(1), 0);
    }

    #[test]
    fn retain_known_sweeps_stale_ids() {
        let mut times = AccessTimes::new();
        for id in 0..6 {
            times.touch_at(id, 100 + id as i64);
        }
        let removed = times.retain_known(|id| id % 2 == 0);
        assert_eq!(removed, 3);
        assert_eq!(times.len(), 3);
        assert_eq!(times.time_of(1), 0);
        assert_eq!(times.time_of(2), 102);
    }

    #[test]
    fn serializes_as_bare_map() {
        let mut times = AccessTimes::new();
        times.touch_at(7, 1234);
        let json = serde_json::to_string(&times).unwrap();
        assert_eq!(json, r#"{"7":1234}"#);
        let back: AccessTimes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, times);
    }
}
