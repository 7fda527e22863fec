//! Effective-capacity derivation.
//!
//! The cap on non-pinned visible tabs is the fixed configured limit,
//! optionally tightened by how many tabs the current display width can
//! actually show.

use crate::config::Config;

/// Hard floor for the adaptive cap. Prevents pathologically narrow
/// displays from starving the user of any visible tabs.
pub const MIN_ADAPTIVE_CAPACITY: usize = 5;

/// Compute the currently applicable cap on non-pinned visible tabs.
///
/// `display_width` is `None` when adaptive sizing is off or the window
/// query failed; both cases fall back to the fixed limit.
#[must_use]
pub fn effective_capacity(config: &Config, display_width: Option<u32>) -> usize {
    if !config.adaptive_limit {
        return config.tab_limit;
    }
    let Some(width) = display_width else {
        return config.tab_limit;
    };
    let fits = (width / config.pixels_per_tab.max(1)) as usize;
    fits.max(MIN_ADAPTIVE_CAPACITY).min(config.tab_limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adaptive(pixels_per_tab: u32, tab_limit: usize) -> Config {
        Config {
            adaptive_limit: true,
            pixels_per_tab,
            tab_limit,
            ..Config::default()
        }
    }

    #[test]
    fn fixed_when_adaptive_disabled() {
        let config = Config {
            adaptive_limit: false,
            tab_limit: 20,
            ..Config::default()
        };
        assert_eq!(effective_capacity(&config, Some(10_000)), 20);
    }

    #[test]
    fn fixed_when_width_unavailable() {
        assert_eq!(effective_capacity(&adaptive(150, 20), None), 20);
    }

    #[test]
    fn width_1200_at_150_px_gives_8() {
        assert_eq!(effective_capacity(&adaptive(150, 20), Some(1_200)), 8);
    }

    #[test]
    fn adaptive_never_exceeds_fixed() {
        assert_eq!(effective_capacity(&adaptive(100, 12), Some(5_000)), 12);
    }

    #[test]
    fn narrow_display_floors_at_five() {
        assert_eq!(effective_capacity(&adaptive(150, 20), Some(300)), 5);
        assert_eq!(effective_capacity(&adaptive(150, 20), Some(0)), 5);
    }

    #[test]
    fn floor_still_bounded_by_fixed_limit() {
        // Fixed limit below the adaptive floor wins the final min.
        assert_eq!(effective_capacity(&adaptive(150, 3), Some(300)), 3);
    }
}
