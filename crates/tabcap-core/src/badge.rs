//! Badge text/color derivation and the status sink seam.
//!
//! Badge refresh is read-only: it never routes through the operation
//! serializer and tolerates momentarily stale snapshots.

use serde::{Deserialize, Serialize};

use crate::config::BadgeMode;
use crate::hidden_queue::HiddenQueue;

/// Badge background color tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeColor {
    /// Open-tab count.
    Blue,
    /// User-tab count (open + hidden non-history).
    Green,
    /// Hidden-queue length.
    Indigo,
}

impl BadgeColor {
    /// Hex value written to the host badge.
    #[must_use]
    pub fn hex(self) -> &'static str {
        match self {
            Self::Blue => "#2196F3",
            Self::Green => "#4CAF50",
            Self::Indigo => "#3f50b5",
        }
    }
}

/// What the badge should display right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeView {
    /// Badge text; empty string blanks the badge.
    pub text: String,
    pub color: BadgeColor,
}

/// Badge/status sink implemented by the surrounding host glue.
pub trait BadgeSink: Send + Sync {
    fn set_text(&self, text: &str);
    fn set_color(&self, color: BadgeColor);
}

/// Derive the badge contents for the given mode.
#[must_use]
pub fn badge_view(mode: BadgeMode, total_tabs: usize, hidden: &HiddenQueue) -> BadgeView {
    match mode {
        BadgeMode::Open => BadgeView {
            text: total_tabs.to_string(),
            color: BadgeColor::Blue,
        },
        BadgeMode::User => {
            let user_hidden = hidden.iter().filter(|e| !e.from_history).count();
            BadgeView {
                text: (total_tabs + user_hidden).to_string(),
                color: BadgeColor::Green,
            }
        }
        BadgeMode::Hidden => BadgeView {
            text: if hidden.is_empty() {
                String::new()
            } else {
                hidden.len().to_string()
            },
            color: BadgeColor::Indigo,
        },
    }
}
