//! Controller configuration.
//!
//! Owned exclusively by the controller; mutated only through an
//! explicit apply-config operation that re-derives capacity and re-runs
//! the hide/restore policy. Every field carries a serde default so a
//! partial persisted config merges over the shipped defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the badge displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeMode {
    /// Total open tab count.
    Open,
    /// Hidden-queue length (blank when zero).
    Hidden,
    /// Open tabs plus hidden non-history entries.
    User,
}

/// Which edge of the strip auto-move targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveDirection {
    Start,
    End,
}

/// Auto-move sub-feature: after a dwell delay, the active tab is moved
/// to a configured edge of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoMoveConfig {
    pub enabled: bool,
    pub direction: MoveDirection,
    /// Dwell delay before the move fires, in milliseconds.
    pub delay_ms: u64,
}

impl Default for AutoMoveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            direction: MoveDirection::Start,
            delay_ms: 3_000,
        }
    }
}

/// Full controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Master switch; when false, mutating passes are no-ops (badge and
    /// access bookkeeping still run).
    pub active: bool,
    /// Fixed cap on non-pinned visible tabs.
    pub tab_limit: usize,
    /// Bound on the hidden queue; oldest entries drop past this.
    pub hidden_queue_max: usize,
    pub badge_mode: BadgeMode,
    /// Derive capacity from display width when true.
    pub adaptive_limit: bool,
    /// Horizontal pixels budgeted per tab for the adaptive cap.
    pub pixels_per_tab: u32,
    pub auto_move: AutoMoveConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active: true,
            tab_limit: 20,
            hidden_queue_max: 80,
            badge_mode: BadgeMode::Open,
            adaptive_limit: true,
            pixels_per_tab: 150,
            auto_move: AutoMoveConfig::default(),
        }
    }
}

impl Config {
    /// Validate range constraints. Called on apply-config.
    pub fn validate(&self) -> Result<()> {
        if self.tab_limit < 1 {
            return Err(Error::Config("tab_limit must be >= 1".into()));
        }
        if self.hidden_queue_max < 1 {
            return Err(Error::Config("hidden_queue_max must be >= 1".into()));
        }
        if self.pixels_per_tab < 1 {
            return Err(Error::Config("pixels_per_tab must be >= 1".into()));
        }
        Ok(())
    }
}
