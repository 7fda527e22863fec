//! Population controller — orchestrates capacity enforcement against
//! the externally-mutated tab population.
//!
//! Every mutating pass routes through the operation serializer and
//! independently re-snapshots the live population (a snapshot taken
//! before the pass was queued may be arbitrarily stale). Read-only
//! helpers (badge refresh, the UI-facing query surface) bypass the
//! serializer and tolerate momentarily stale state.
//!
//! Per-pass flow: trigger → serializer enqueue → fresh snapshot →
//! capacity → eviction/restoration decision → platform mutations →
//! hidden queue / access times updated and persisted best-effort.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::access_times::AccessTimes;
use crate::auto_move::AutoMoveSlot;
use crate::badge::{BadgeSink, badge_view};
use crate::capacity::effective_capacity;
use crate::config::{Config, MoveDirection};
use crate::debounce::Debouncer;
use crate::error::Result;
use crate::hidden_queue::{HiddenEntry, HiddenQueue};
use crate::platform::{MoveTarget, TabInfo, TabPlatform};
use crate::policy;
use crate::serializer::OpSerializer;
use crate::snapshot::{TabSnapshot, focused_width};
use crate::store::{StateStore, StoreChange};

/// Trailing delay collapsing window-resize bursts into one pass.
const RESIZE_DEBOUNCE: Duration = Duration::from_millis(500);

/// Locally-held controller state. The serializer guarantees at most
/// one mutating pass touches this at a time; the mutex only covers the
/// brief non-suspending critical sections within a pass and the
/// concurrent read-only queries.
struct CoreState {
    config: Config,
    hidden: HiddenQueue,
    access: AccessTimes,
}

struct Inner {
    platform: Arc<dyn TabPlatform>,
    store: Arc<dyn StateStore>,
    badge: Arc<dyn BadgeSink>,
    state: Mutex<CoreState>,
    serializer: OpSerializer,
    resize_debounce: Debouncer,
    auto_move: AutoMoveSlot,
}

/// The population controller.
///
/// Construct once per process and clone the handle into trigger
/// handlers; there are no ambient globals. Construction spawns the
/// serializer worker and therefore requires a tokio runtime.
#[derive(Clone)]
pub struct TabController {
    inner: Arc<Inner>,
}

impl TabController {
    #[must_use]
    pub fn new(
        platform: Arc<dyn TabPlatform>,
        store: Arc<dyn StateStore>,
        badge: Arc<dyn BadgeSink>,
    ) -> Self {
        let config = Config::default();
        let hidden = HiddenQueue::new(config.hidden_queue_max);
        Self {
            inner: Arc::new(Inner {
                platform,
                store,
                badge,
                state: Mutex::new(CoreState {
                    config,
                    hidden,
                    access: AccessTimes::new(),
                }),
                serializer: OpSerializer::new(),
                resize_debounce: Debouncer::new(RESIZE_DEBOUNCE),
                auto_move: AutoMoveSlot::new(),
            }),
        }
    }

    /// Load persisted state and apply the current config to the live
    /// population: one full pass, badge refresh, auto-move re-armed
    /// for the currently active tab.
    pub async fn bootstrap(&self) {
        match self.inner.store.load_config().await {
            Ok(Some(config)) => match config.validate() {
                Ok(()) => {
                    let mut state = self.inner.lock_state();
                    state.hidden.set_max(config.hidden_queue_max);
                    state.config = config;
                }
                Err(err) => warn!(error = %err, "persisted config invalid, keeping defaults"),
            },
            Ok(None) => {}
            Err(err) => warn!(error = %err, "failed to load config, keeping defaults"),
        }
        match self.inner.store.load_hidden().await {
            Ok(entries) => self.inner.lock_state().hidden.replace(entries),
            Err(err) => warn!(error = %err, "failed to load hidden queue"),
        }
        match self.inner.store.load_access_times().await {
            Ok(map) => self.inner.lock_state().access = AccessTimes::from_map(map),
            Err(err) => warn!(error = %err, "failed to load access times"),
        }
        // Persisted access entries can outlive their tabs across a
        // restart; sweep anything no longer live.
        if let Ok(tabs) = self.inner.platform.query_all().await {
            let live: HashSet<u64> = tabs.iter().map(|t| t.id).collect();
            let swept = self
                .inner
                .lock_state()
                .access
                .retain_known(|id| live.contains(&id));
            if swept > 0 {
                debug!(swept, "swept stale access-time entries");
                self.inner.persist_access();
            }
        }
        info!("tab controller initialized");

        self.submit_full_pass().await;
        self.inner.refresh_badge().await;
        self.inner.rearm_auto_move_for_active().await;
    }

    /// Trigger: a tab was created.
    ///
    /// Hides at most one victim per creation — a burst of creations
    /// each hides one until equilibrium.
    pub async fn on_tab_created(&self, tab: &TabInfo) {
        self.inner.lock_state().access.touch(tab.id);
        self.inner.persist_access();
        self.inner.refresh_badge().await;

        if !self.inner.lock_state().config.active {
            return;
        }
        let run = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .serializer
            .submit(move || async move { run.hide_pass(1).await })
            .await;
        if let Err(err) = outcome {
            warn!(tab_id = tab.id, error = %err, "tab-created pass failed");
        }
    }

    /// Trigger: a tab was removed. Restores hidden entries into any
    /// spare capacity unless the whole window is closing.
    pub async fn on_tab_removed(&self, tab_id: u64, window_closing: bool) {
        if self.inner.lock_state().access.forget(tab_id) {
            self.inner.persist_access();
        }
        self.inner.refresh_badge().await;

        if window_closing || !self.inner.lock_state().config.active {
            return;
        }
        let run = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .serializer
            .submit(move || async move { run.restore_pass().await })
            .await;
        if let Err(err) = outcome {
            warn!(tab_id, error = %err, "tab-removed pass failed");
        }
    }

    /// Trigger: a tab became active. Records the interaction and arms
    /// the auto-move timer for it.
    pub async fn on_tab_activated(&self, tab_id: u64) {
        self.inner.lock_state().access.touch(tab_id);
        self.inner.persist_access();
        self.inner.refresh_badge().await;
        self.inner.arm_auto_move(tab_id);
    }

    /// Trigger: display geometry changed. Debounced; the trailing call
    /// runs a full hide-or-restore pass since the capacity delta can
    /// be large.
    pub fn on_window_resized(&self) {
        let config = self.inner.lock_state().config.clone();
        if !config.active || !config.adaptive_limit {
            return;
        }
        let inner = Arc::clone(&self.inner);
        self.inner.resize_debounce.trigger(async move {
            let run = Arc::clone(&inner);
            let outcome = inner
                .serializer
                .submit(move || async move { run.full_pass().await })
                .await;
            if let Err(err) = outcome {
                warn!(error = %err, "resize pass failed");
            }
        });
    }

    /// Trigger: a window gained focus. Badge refresh plus auto-move
    /// re-arm for the newly focused active tab; no capacity pass.
    pub async fn on_window_focus_changed(&self) {
        self.inner.refresh_badge().await;
        self.inner.rearm_auto_move_for_active().await;
    }

    /// Apply a new configuration: validate, persist, re-derive
    /// capacity, run a full pass, re-arm auto-move.
    pub async fn apply_config(&self, config: Config) -> Result<()> {
        config.validate()?;
        self.install_config(config).await;
        self.inner.persist_config();
        Ok(())
    }

    /// Apply an externally-driven change to persisted state, keeping
    /// this instance consistent with other surfaces writing through
    /// the same substrate.
    pub async fn on_store_change(&self, change: StoreChange) {
        match change {
            StoreChange::Config(config) => {
                if let Err(err) = config.validate() {
                    warn!(error = %err, "ignoring invalid external config change");
                    return;
                }
                // Came from the store; do not write it back.
                self.install_config(config).await;
            }
            StoreChange::Hidden(entries) => {
                self.inner.lock_state().hidden.replace(entries);
            }
            StoreChange::AccessTimes(map) => {
                self.inner.lock_state().access = AccessTimes::from_map(map);
            }
        }
    }

    /// UI-facing query: the hidden queue, oldest first. Not
    /// serialized; may lag a queued pass.
    #[must_use]
    pub fn hidden_entries(&self) -> Vec<HiddenEntry> {
        self.inner.lock_state().hidden.to_vec()
    }

    /// UI-facing command: drop one hidden entry. Serialized because it
    /// mutates the queue. Returns whether the entry existed.
    pub async fn remove_hidden_entry(&self, local_id: u64) -> bool {
        let inner = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .serializer
            .submit(move || async move {
                let removed = inner.lock_state().hidden.remove(local_id);
                if removed {
                    inner.persist_hidden();
                }
                Ok(removed)
            })
            .await;
        match outcome {
            Ok(removed) => {
                if removed {
                    self.inner.refresh_badge().await;
                }
                removed
            }
            Err(err) => {
                warn!(local_id, error = %err, "remove-hidden-entry failed");
                false
            }
        }
    }

    /// UI-facing query: the currently applicable capacity.
    pub async fn current_effective_capacity(&self) -> usize {
        let config = self.inner.lock_state().config.clone();
        let width = if config.adaptive_limit {
            match self.inner.platform.query_windows().await {
                Ok(windows) => focused_width(&windows),
                Err(err) => {
                    debug!(error = %err, "window query failed for capacity query");
                    None
                }
            }
        } else {
            None
        };
        effective_capacity(&config, width)
    }

    /// Current in-memory config snapshot.
    #[must_use]
    pub fn config(&self) -> Config {
        self.inner.lock_state().config.clone()
    }

    /// Recompute and push the badge. Read-only.
    pub async fn refresh_badge(&self) {
        self.inner.refresh_badge().await;
    }

    async fn install_config(&self, config: Config) {
        let auto_move_enabled = config.auto_move.enabled;
        {
            let mut state = self.inner.lock_state();
            let dropped = state.hidden.set_max(config.hidden_queue_max);
            if dropped > 0 {
                debug!(dropped, "hidden queue shrunk by config change");
            }
            state.config = config;
        }
        if !auto_move_enabled {
            self.inner.auto_move.disarm();
        }
        self.inner.persist_hidden();
        self.inner.refresh_badge().await;
        self.submit_full_pass().await;
        self.inner.rearm_auto_move_for_active().await;
    }

    async fn submit_full_pass(&self) {
        let run = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .serializer
            .submit(move || async move { run.full_pass().await })
            .await;
        if let Err(err) = outcome {
            warn!(error = %err, "full pass failed");
        }
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, CoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fresh snapshot of the live population under the current config.
    async fn snapshot(&self) -> Option<TabSnapshot> {
        let (config, hidden_len) = {
            let state = self.lock_state();
            (state.config.clone(), state.hidden.len())
        };
        match TabSnapshot::capture(self.platform.as_ref(), &config, hidden_len).await {
            Ok(snap) => Some(snap),
            Err(err) => {
                // Cannot see the population; degrade to a no-op pass.
                warn!(error = %err, "population snapshot failed, skipping pass");
                None
            }
        }
    }

    /// Hide up to `max_count` victims if the population exceeds
    /// capacity.
    async fn hide_pass(self: &Arc<Self>, max_count: usize) -> Result<()> {
        let Some(snap) = self.snapshot().await else {
            return Ok(());
        };
        if !snap.needs_hiding() {
            return Ok(());
        }
        let victims = {
            let state = self.lock_state();
            policy::select_victims(&snap.non_pinned, &state.access, snap.capacity, max_count)
        };
        if victims.is_empty() {
            return Ok(());
        }
        self.commit_hide(&victims).await;
        Ok(())
    }

    /// Restore hidden entries into spare capacity.
    async fn restore_pass(self: &Arc<Self>) -> Result<()> {
        let Some(snap) = self.snapshot().await else {
            return Ok(());
        };
        if !snap.can_restore() {
            return Ok(());
        }
        self.restore_up_to(policy::restore_count(snap.spare(), snap.hidden_len))
            .await;
        Ok(())
    }

    /// Full hide-or-restore pass; used on resize, config change, and
    /// bootstrap, where the capacity delta can be large.
    async fn full_pass(self: &Arc<Self>) -> Result<()> {
        if !self.lock_state().config.active {
            return Ok(());
        }
        let Some(snap) = self.snapshot().await else {
            return Ok(());
        };
        if snap.needs_hiding() {
            let victims = {
                let state = self.lock_state();
                policy::select_victims(&snap.non_pinned, &state.access, snap.capacity, snap.excess())
            };
            if !victims.is_empty() {
                self.commit_hide(&victims).await;
            }
        } else if snap.can_restore() {
            self.restore_up_to(policy::restore_count(snap.spare(), snap.hidden_len))
                .await;
        }
        Ok(())
    }

    /// Commit an eviction plan: queue hidden entries, persist, then
    /// issue removals. A failed removal does not roll back its hidden
    /// entry — once queued as hidden, it stays queued.
    async fn commit_hide(self: &Arc<Self>, victims: &[TabInfo]) {
        {
            let mut state = self.lock_state();
            for victim in victims {
                if let Some(dropped) = state.hidden.push(HiddenEntry::for_tab(victim)) {
                    debug!(url = %dropped.url, "hidden queue full, dropped oldest entry");
                }
                state.access.forget(victim.id);
            }
        }
        self.persist_hidden();
        self.persist_access();

        for victim in victims {
            debug!(tab_id = victim.id, url = %victim.effective_url(), "hiding tab");
            if let Err(err) = self.platform.remove(victim.id).await {
                warn!(tab_id = victim.id, error = %err, "failed to remove evicted tab");
            }
        }
        self.refresh_badge().await;
    }

    /// Pop-and-recreate up to `count` entries, most-recently-hidden
    /// first. A failed creation pushes the entry back and stops the
    /// pass — no retry storm against an unreachable platform.
    async fn restore_up_to(self: &Arc<Self>, count: usize) -> usize {
        let mut restored = 0;
        for _ in 0..count {
            let Some(entry) = self.lock_state().hidden.pop_back() else {
                break;
            };
            debug!(url = %entry.url, "restoring tab");
            match self.platform.create(&entry.url, false).await {
                Ok(tab) => {
                    self.lock_state().access.touch(tab.id);
                    restored += 1;
                }
                Err(err) => {
                    warn!(url = %entry.url, error = %err, "restore failed, re-queueing entry");
                    self.lock_state().hidden.push_back(entry);
                    break;
                }
            }
        }
        if restored > 0 {
            self.persist_hidden();
            self.persist_access();
            self.refresh_badge().await;
        }
        restored
    }

    /// Recompute and push the badge. Read-only; skipped when the
    /// population cannot be queried.
    async fn refresh_badge(&self) {
        let total = match self.platform.query_all().await {
            Ok(tabs) => tabs.len(),
            Err(err) => {
                debug!(error = %err, "badge refresh skipped, population unavailable");
                return;
            }
        };
        let view = {
            let state = self.lock_state();
            badge_view(state.config.badge_mode, total, &state.hidden)
        };
        self.badge.set_text(&view.text);
        self.badge.set_color(view.color);
    }

    /// Arm the auto-move timer for `tab_id`. The firing action runs
    /// through the serializer and re-verifies the target is still the
    /// active tab.
    fn arm_auto_move(self: &Arc<Self>, tab_id: u64) {
        let auto = self.lock_state().config.auto_move;
        if !auto.enabled {
            return;
        }
        let inner = Arc::clone(self);
        self.auto_move
            .arm(tab_id, Duration::from_millis(auto.delay_ms), async move {
                let run = Arc::clone(&inner);
                let outcome = inner
                    .serializer
                    .submit(move || async move { run.auto_move_op(tab_id).await })
                    .await;
                if let Err(err) = outcome {
                    debug!(tab_id, error = %err, "auto-move skipped");
                }
            });
    }

    /// Serialized auto-move commit: verify the target is still active
    /// and the feature still enabled, then move it to the configured
    /// edge.
    async fn auto_move_op(self: &Arc<Self>, tab_id: u64) -> Result<()> {
        let auto = self.lock_state().config.auto_move;
        if !auto.enabled {
            return Ok(());
        }
        let tabs = self.platform.query_all().await?;
        let Some(active) = tabs.iter().find(|t| t.active) else {
            debug!(tab_id, "no active tab, auto-move cancelled");
            return Ok(());
        };
        if active.id != tab_id {
            debug!(tab_id, active = active.id, "active tab changed, auto-move cancelled");
            return Ok(());
        }
        let target = match auto.direction {
            MoveDirection::Start => MoveTarget::Start,
            MoveDirection::End => MoveTarget::End,
        };
        self.platform.move_tab(tab_id, target).await?;
        debug!(tab_id, ?target, "auto-moved active tab");
        Ok(())
    }

    /// Arm auto-move for whichever tab is currently active.
    async fn rearm_auto_move_for_active(self: &Arc<Self>) {
        match self.platform.query_all().await {
            Ok(tabs) => {
                if let Some(active) = tabs.iter().find(|t| t.active) {
                    self.arm_auto_move(active.id);
                }
            }
            Err(err) => debug!(error = %err, "auto-move re-arm skipped"),
        }
    }

    // Best-effort async writes: no return-value dependency, in-memory
    // state stays authoritative until the next successful write.

    fn persist_hidden(&self) {
        let entries = self.lock_state().hidden.to_vec();
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(err) = store.save_hidden(&entries).await {
                warn!(error = %err, "failed to persist hidden queue");
            }
        });
    }

    fn persist_access(&self) {
        let times = self.lock_state().access.to_map();
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(err) = store.save_access_times(&times).await {
                warn!(error = %err, "failed to persist access times");
            }
        });
    }

    fn persist_config(&self) {
        let config = self.lock_state().config.clone();
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(err) = store.save_config(&config).await {
                warn!(error = %err, "failed to persist config");
            }
        });
    }
}
