//! Eviction and restoration planning.
//!
//! Pure decisions over a population snapshot; the controller commits a
//! plan by issuing platform mutations and updating the hidden queue and
//! access times. Keeping planning separate from commit lets the
//! ordering rules be tested without any platform.

use crate::access_times::AccessTimes;
use crate::platform::TabInfo;

/// Select least-recently-used eviction victims.
///
/// Ordering: ascending by `(last access time, strip position)` — the
/// earliest-accessed tab goes first, and among ties (including the
/// common never-accessed tie at timestamp 0) the leftmost tab goes
/// first. Returns the first `min(max_count, len - capacity)` tabs of
/// that ordering; empty when the population is within capacity.
#[must_use]
pub fn select_victims(
    non_pinned: &[TabInfo],
    access_times: &AccessTimes,
    capacity: usize,
    max_count: usize,
) -> Vec<TabInfo> {
    let excess = non_pinned.len().saturating_sub(capacity);
    let count = excess.min(max_count);
    if count == 0 {
        return Vec::new();
    }

    let mut ordered: Vec<&TabInfo> = non_pinned.iter().collect();
    ordered.sort_by_key(|tab| (access_times.time_of(tab.id), tab.position));
    ordered.into_iter().take(count).cloned().collect()
}

/// How many hidden entries a restoration pass should attempt.
#[must_use]
pub fn restore_count(spare_capacity: usize, queue_len: usize) -> usize {
    spare_capacity.min(queue_len)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: u64, position: u32) -> TabInfo {
        TabInfo {
            id,
            url: format!("https://example.test/{id}"),
            pending_url: None,
            title: String::new(),
            icon_url: None,
            pinned: false,
            position,
            active: false,
        }
    }

    fn times(pairs: &[(u64, i64)]) -> AccessTimes {
        let mut t = AccessTimes::new();
        for &(id, ts) in pairs {
            t.touch_at(id, ts);
        }
        t
    }

    #[test]
    fn lru_order_breaks_ties_by_position() {
        // Times [5,3,3,9] at positions [0,1,2,3], two evictions needed.
        let tabs = vec![tab(10, 0), tab(11, 1), tab(12, 2), tab(13, 3)];
        let access = times(&[(10, 5), (11, 3), (12, 3), (13, 9)]);

        let victims = select_victims(&tabs, &access, 2, usize::MAX);
        let ids: Vec<u64> = victims.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![11, 12]);
    }

    #[test]
    fn never_accessed_evicted_before_any_real_timestamp() {
        let tabs = vec![tab(1, 0), tab(2, 1), tab(3, 2)];
        let access = times(&[(1, 50), (3, 10)]); // tab 2 never accessed

        let victims = select_victims(&tabs, &access, 2, usize::MAX);
        assert_eq!(victims[0].id, 2);
    }

    #[test]
    fn max_count_amortizes_a_burst() {
        let tabs: Vec<TabInfo> = (0..10).map(|i| tab(i, i as u32)).collect();
        let access = AccessTimes::new();

        // Five over capacity but only one victim per created-tab pass.
        let victims = select_victims(&tabs, &access, 5, 1);
        assert_eq!(victims.len(), 1);
        assert_eq!(victims[0].id, 0);
    }

    #[test]
    fn within_capacity_selects_nothing() {
        let tabs = vec![tab(1, 0), tab(2, 1)];
        assert!(select_victims(&tabs, &AccessTimes::new(), 2, usize::MAX).is_empty());
        assert!(select_victims(&tabs, &AccessTimes::new(), 5, 1).is_empty());
    }

    #[test]
    fn input_order_is_irrelevant() {
        let tabs = vec![tab(13, 3), tab(12, 2), tab(10, 0), tab(11, 1)];
        let access = times(&[(10, 5), (11, 3), (12, 3), (13, 9)]);

        let victims = select_victims(&tabs, &access, 2, usize::MAX);
        let ids: Vec<u64> = victims.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![11, 12]);
    }

    #[test]
    fn restore_count_is_min_of_spare_and_queue() {
        assert_eq!(restore_count(3, 10), 3);
        assert_eq!(restore_count(10, 3), 3);
        assert_eq!(restore_count(0, 5), 0);
        assert_eq!(restore_count(5, 0), 0);
    }
}
