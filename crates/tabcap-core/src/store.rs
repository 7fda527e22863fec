//! Persistence substrate seam.
//!
//! The controller persists three documents — config, hidden queue,
//! access times — through this trait and applies externally-driven
//! change notifications to its in-memory copies so multiple surfaces
//! reading the same persisted state stay consistent.
//!
//! Writes are best-effort: the controller fires them without depending
//! on the result, and in-memory state stays authoritative for the
//! current process until the next successful write.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::Result;
use crate::hidden_queue::HiddenEntry;

/// An externally-driven change to persisted state (e.g. another
/// surface wrote through the same substrate).
#[derive(Debug, Clone)]
pub enum StoreChange {
    Config(Config),
    Hidden(Vec<HiddenEntry>),
    AccessTimes(HashMap<u64, i64>),
}

/// Key-value persistence consumed by the controller.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the persisted config, `None` if never written.
    async fn load_config(&self) -> Result<Option<Config>>;
    async fn save_config(&self, config: &Config) -> Result<()>;

    async fn load_hidden(&self) -> Result<Vec<HiddenEntry>>;
    async fn save_hidden(&self, entries: &[HiddenEntry]) -> Result<()>;

    async fn load_access_times(&self) -> Result<HashMap<u64, i64>>;
    async fn save_access_times(&self, times: &HashMap<u64, i64>) -> Result<()>;
}

/// In-memory reference store, used by tests and the CLI simulator.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    config: Option<Config>,
    hidden: Vec<HiddenEntry>,
    access_times: HashMap<u64, i64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryStoreInner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Snapshot of the persisted hidden queue, for assertions.
    #[must_use]
    pub fn hidden_snapshot(&self) -> Vec<HiddenEntry> {
        self.lock().hidden.clone()
    }

    /// Snapshot of the persisted access times, for assertions.
    #[must_use]
    pub fn access_snapshot(&self) -> HashMap<u64, i64> {
        self.lock().access_times.clone()
    }

    /// Snapshot of the persisted config, for assertions.
    #[must_use]
    pub fn config_snapshot(&self) -> Option<Config> {
        self.lock().config.clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load_config(&self) -> Result<Option<Config>> {
        Ok(self.lock().config.clone())
    }

    async fn save_config(&self, config: &Config) -> Result<()> {
        self.lock().config = Some(config.clone());
        Ok(())
    }

    async fn load_hidden(&self) -> Result<Vec<HiddenEntry>> {
        Ok(self.lock().hidden.clone())
    }

    async fn save_hidden(&self, entries: &[HiddenEntry]) -> Result<()> {
        self.lock().hidden = entries.to_vec();
        Ok(())
    }

    async fn load_access_times(&self) -> Result<HashMap<u64, i64>> {
        Ok(self.lock().access_times.clone())
    }

    async fn save_access_times(&self, times: &HashMap<u64, i64>) -> Result<()> {
        self.lock().access_times = times.clone();
        Ok(())
    }
}
