//! tabcap-core: bounded working-set control for browser tabs.
//!
//! Enforces a cap on visible tabs against an externally-mutated
//! population: least-recently-used tabs are transparently evicted into
//! a bounded hidden queue when the population exceeds a dynamically
//! computed capacity, and restored when capacity frees up.
//!
//! # Architecture
//!
//! ```text
//! trigger ──► OpSerializer ──► pass: TabSnapshot ──► capacity
//!                                      │
//!                              policy (evict/restore)
//!                                      │
//!                        TabPlatform mutations ──► HiddenQueue /
//!                                                  AccessTimes ──► StateStore
//! ```
//!
//! # Modules
//!
//! - `controller`: population controller orchestrating the passes
//! - `serializer`: FIFO single-flight operation queue
//! - `policy`: LRU eviction / restoration planning
//! - `snapshot`: ephemeral population snapshot
//! - `capacity`: effective-capacity derivation
//! - `hidden_queue`: bounded hidden-tab queue
//! - `access_times`: last-interaction tracking
//! - `auto_move`: single-slot auto-move timer
//! - `debounce`: trailing-edge resize debouncer
//! - `badge`: badge derivation and sink seam
//! - `platform`: host tab platform seam
//! - `store`: persistence substrate seam
//! - `config`: controller configuration
//!
//! # Safety
//!
//! This crate forbids unsafe code.

#![forbid(unsafe_code)]

pub mod access_times;
pub mod auto_move;
pub mod badge;
pub mod capacity;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod error;
pub mod hidden_queue;
pub mod platform;
pub mod policy;
pub mod serializer;
pub mod snapshot;
pub mod store;

pub use access_times::AccessTimes;
pub use badge::{BadgeColor, BadgeSink, BadgeView, badge_view};
pub use capacity::{MIN_ADAPTIVE_CAPACITY, effective_capacity};
pub use config::{AutoMoveConfig, BadgeMode, Config, MoveDirection};
pub use controller::TabController;
pub use error::{Error, Result};
pub use hidden_queue::{HiddenEntry, HiddenQueue};
pub use platform::{MoveTarget, PlatformError, TabInfo, TabPlatform, WindowInfo};
pub use serializer::OpSerializer;
pub use snapshot::TabSnapshot;
pub use store::{MemoryStore, StateStore, StoreChange};
