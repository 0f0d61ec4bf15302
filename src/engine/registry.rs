//! Copyright © 2025-2026 Lumen Authors. All Rights Reserved.
//!
//! This file is part of Lumen.
//!
//! Licensed under the Apache License, Version 2.0 (the "License");
//! You may not use this file except in compliance with the License.
//! You may obtain a copy of the License at
//!
//!     http://www.apache.org/licenses/LICENSE-2.0
//!
//! Unless required by applicable law or agreed to in writing, software
//! distributed under the License is distributed on an "AS IS" BASIS,
//! WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//! See the License for the specific language governing permissions and
//! limitations under the License.

//! # Plugin Registry
//!
//! The registry owns every registered plugin. It keeps an authoritative
//! name → entry map plus one priority-ordered sequence per plugin kind, all
//! behind a single lock so the map and the sequences can never disagree.
//!
//! ## Guarantees
//!
//! - At most one live entry per name. Registering a name that is already
//!   present tears the old instance down first and forgets its statistics.
//! - A removed entry is retired before its teardown runs: the dispatcher
//!   stops handing it frames, an in-flight frame is given the drain grace to
//!   finish, and late results are discarded instead of recorded.
//! - Each sequence is sorted by ascending priority; ties keep registration
//!   order.
//! - Readers get cloned snapshots. Plugin code never runs while the lock is
//!   held.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Notify;

use crate::config::DEFAULT_SHUTDOWN_GRACE_MS;
use crate::engine::isolation;
use crate::engine::performance::LuPerformanceTracker;
use crate::errors::Result;
use crate::log::LuEventLog;
use crate::plugin::{LuHook, LuPlugin, LuPluginKind};

/// Where a registry entry is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LuPluginState {
    /// Registered but its initialize hook has not run yet.
    Registered = 0,
    Initialized = 1,
    Ready = 2,
    Released = 3,
}

impl LuPluginState {
    fn from_u8(value: u8) -> LuPluginState {
        match value {
            1 => LuPluginState::Initialized,
            2 => LuPluginState::Ready,
            3 => LuPluginState::Released,
            _ => LuPluginState::Registered,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LuPluginState::Registered => "registered",
            LuPluginState::Initialized => "initialized",
            LuPluginState::Ready => "ready",
            LuPluginState::Released => "released",
        }
    }
}

/// Which entries a lookup returns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LuRegistryView {
    All,
    Enabled,
}

/// A registered plugin plus the runtime's bookkeeping for it.
pub struct LuPluginEntry {
    plugin: Arc<dyn LuPlugin>,
    name: String,
    priority: i32,
    kind: LuPluginKind,
    enabled: AtomicBool,
    busy: AtomicBool,
    retired: AtomicBool,
    released: Notify,
    state: AtomicU8,
}

impl LuPluginEntry {
    /// Capture the plugin's metadata. A panic in any accessor fails the
    /// registration instead of unwinding into the caller.
    pub(crate) fn new(plugin: Arc<dyn LuPlugin>) -> Result<Self> {
        let name = isolation::call_sync("<unnamed>", LuHook::Describe, || plugin.name().to_string())?;
        let (priority, kind, enabled) = isolation::call_sync(&name, LuHook::Describe, || {
            (plugin.priority(), plugin.kind(), plugin.enabled_by_default())
        })?;
        Ok(LuPluginEntry {
            name,
            priority,
            kind,
            enabled: AtomicBool::new(enabled),
            busy: AtomicBool::new(false),
            retired: AtomicBool::new(false),
            released: Notify::new(),
            state: AtomicU8::new(LuPluginState::Registered as u8),
            plugin,
        })
    }

    pub fn plugin(&self) -> &Arc<dyn LuPlugin> {
        &self.plugin
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn kind(&self) -> LuPluginKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub fn state(&self) -> LuPluginState {
        LuPluginState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: LuPluginState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Move to `next` after a lifecycle pass. `Initialized` is only reached
    /// from `Registered`, so a late initialize never hides `Ready`.
    pub(crate) fn advance(&self, next: LuPluginState) {
        match next {
            LuPluginState::Initialized => {
                let _ = self.state.compare_exchange(
                    LuPluginState::Registered as u8,
                    LuPluginState::Initialized as u8,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
            _ => self.set_state(next),
        }
    }

    /// True while a frame task holds this plugin's single-flight token.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the single-flight token. `None` if a frame is already in flight.
    pub(crate) fn try_claim(self: &Arc<Self>) -> Option<LuFlightGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| LuFlightGuard {
                entry: Arc::clone(self),
            })
    }

    /// True once the entry has left the registry. Retired entries receive no
    /// new frames and their late frame results are dropped.
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_retired(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    /// Wait up to `limit` for an in-flight frame to release the token.
    pub(crate) async fn settle(&self, limit: Duration) -> bool {
        let idle = async {
            loop {
                let released = self.released.notified();
                if !self.is_busy() {
                    return;
                }
                released.await;
            }
        };
        tokio::time::timeout(limit, idle).await.is_ok()
    }

    pub fn info(&self) -> LuPluginInfo {
        LuPluginInfo {
            name: self.name.clone(),
            kind: self.kind,
            priority: self.priority,
            enabled: self.is_enabled(),
            state: self.state(),
        }
    }
}

impl fmt::Debug for LuPluginEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuPluginEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("priority", &self.priority)
            .field("enabled", &self.is_enabled())
            .field("state", &self.state())
            .field("retired", &self.is_retired())
            .finish()
    }
}

/// Releases the single-flight token on drop, including on panic or
/// cancellation of the owning task.
pub(crate) struct LuFlightGuard {
    entry: Arc<LuPluginEntry>,
}

impl LuFlightGuard {
    pub(crate) fn entry(&self) -> &Arc<LuPluginEntry> {
        &self.entry
    }
}

impl Drop for LuFlightGuard {
    fn drop(&mut self) {
        self.entry.busy.store(false, Ordering::SeqCst);
        self.entry.released.notify_waiters();
    }
}

/// Management view of one plugin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuPluginInfo {
    pub name: String,
    pub kind: LuPluginKind,
    pub priority: i32,
    pub enabled: bool,
    pub state: LuPluginState,
}

#[derive(Default)]
struct LuRegistryInner {
    by_name: HashMap<String, Arc<LuPluginEntry>>,
    sequences: HashMap<LuPluginKind, Vec<Arc<LuPluginEntry>>>,
}

impl LuRegistryInner {
    fn detach(&mut self, name: &str) -> Option<Arc<LuPluginEntry>> {
        let entry = self.by_name.remove(name)?;
        if let Some(sequence) = self.sequences.get_mut(&entry.kind) {
            sequence.retain(|e| !Arc::ptr_eq(e, &entry));
        }
        Some(entry)
    }

    fn attach(&mut self, entry: Arc<LuPluginEntry>) -> Option<Arc<LuPluginEntry>> {
        let displaced = self.detach(&entry.name);
        let sequence = self.sequences.entry(entry.kind).or_default();
        sequence.push(entry.clone());
        // stable: equal priorities keep registration order
        sequence.sort_by_key(|e| e.priority);
        self.by_name.insert(entry.name.clone(), entry);
        displaced
    }

    fn of_kind(&self, kind: LuPluginKind, view: LuRegistryView) -> Vec<Arc<LuPluginEntry>> {
        self.sequences
            .get(&kind)
            .map(|sequence| {
                sequence
                    .iter()
                    .filter(|e| view == LuRegistryView::All || e.is_enabled())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub struct LuPluginRegistry {
    inner: RwLock<LuRegistryInner>,
    tracker: Arc<LuPerformanceTracker>,
    log: LuEventLog,
    hook_timeout: Option<Duration>,
    drain_grace: Duration,
    registrations: AtomicU64,
}

impl LuPluginRegistry {
    pub fn new(
        tracker: Arc<LuPerformanceTracker>,
        log: LuEventLog,
        hook_timeout: Option<Duration>,
    ) -> Self {
        LuPluginRegistry {
            inner: RwLock::new(LuRegistryInner::default()),
            tracker,
            log,
            hook_timeout,
            drain_grace: Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS),
            registrations: AtomicU64::new(0),
        }
    }

    /// How long a removed plugin's in-flight frame may run before teardown
    /// starts anyway.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    /// Insert `plugin`, replacing any entry with the same name. The replaced
    /// instance is torn down before the new one becomes visible. Fails only
    /// when the plugin's metadata accessors panic.
    pub async fn register(&self, plugin: Arc<dyn LuPlugin>) -> Result<Arc<LuPluginEntry>> {
        let entry = LuPluginEntry::new(plugin)?;
        Ok(self.insert(entry).await)
    }

    pub(crate) async fn insert(&self, entry: LuPluginEntry) -> Arc<LuPluginEntry> {
        let entry = Arc::new(entry);

        let previous = self.inner.write().detach(entry.name());
        if let Some(previous) = previous {
            self.log.info(
                "registry.plugin_replaced",
                "replacing plugin with a new instance",
                [
                    ("plugin", json!(entry.name())),
                    ("previous_priority", json!(previous.priority())),
                    ("priority", json!(entry.priority())),
                ],
            );
            self.retire(&previous).await;
        }

        let displaced = self.inner.write().attach(entry.clone());
        if let Some(displaced) = displaced {
            self.retire(&displaced).await;
        }
        self.registrations.fetch_add(1, Ordering::Relaxed);

        self.log.info(
            "registry.plugin_registered",
            "plugin registered",
            [
                ("plugin", json!(entry.name())),
                ("kind", json!(entry.kind().as_str())),
                ("priority", json!(entry.priority())),
                ("enabled", json!(entry.is_enabled())),
            ],
        );
        entry
    }

    /// Remove and tear down `name`. Returns whether it was registered.
    pub async fn unregister(&self, name: &str) -> bool {
        let removed = self.inner.write().detach(name);
        match removed {
            Some(entry) => {
                self.retire(&entry).await;
                self.log.info(
                    "registry.plugin_unregistered",
                    "plugin unregistered",
                    [("plugin", json!(name))],
                );
                true
            }
            None => {
                self.log.debug(
                    "registry.unknown_plugin",
                    "unregister ignored for unknown plugin",
                    [("plugin", json!(name))],
                );
                false
            }
        }
    }

    async fn retire(&self, entry: &Arc<LuPluginEntry>) {
        entry.mark_retired();
        if !entry.settle(self.drain_grace).await {
            self.log.warn(
                "registry.drain_timeout",
                "tearing down while a frame is still in flight",
                [
                    ("plugin", json!(entry.name())),
                    ("grace_ms", json!(self.drain_grace.as_millis() as u64)),
                ],
            );
        }

        let plugin = entry.plugin().clone();
        let result = isolation::invoke(
            entry.name().to_string(),
            LuHook::Teardown,
            self.hook_timeout,
            async move { plugin.teardown().await },
        )
        .await;
        if let Err(err) = result {
            isolation::report(&self.log, "lifecycle.hook_failed", LuHook::Teardown, &err);
        }
        entry.set_state(LuPluginState::Released);
        self.tracker.forget(entry.name());
    }

    pub fn get(&self, name: &str) -> Option<Arc<LuPluginEntry>> {
        self.inner.read().by_name.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().by_name.contains_key(name)
    }

    /// Entries of one kind in priority order.
    pub fn of_kind(&self, kind: LuPluginKind, view: LuRegistryView) -> Vec<Arc<LuPluginEntry>> {
        self.inner.read().of_kind(kind, view)
    }

    /// Every entry, grouped by kind and then by priority.
    pub fn snapshot(&self, view: LuRegistryView) -> Vec<Arc<LuPluginEntry>> {
        let inner = self.inner.read();
        LuPluginKind::ALL
            .iter()
            .flat_map(|kind| inner.of_kind(*kind, view))
            .collect()
    }

    /// Toggle the enabled flag in place. `false` if `name` is unknown.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        let entry = self.get(name);
        match entry {
            Some(entry) => {
                entry.set_enabled(enabled);
                self.log.info(
                    "registry.plugin_toggled",
                    if enabled { "plugin enabled" } else { "plugin disabled" },
                    [("plugin", json!(name)), ("enabled", json!(enabled))],
                );
                true
            }
            None => false,
        }
    }

    /// Drain every entry in snapshot order. The drained entries are retired;
    /// the caller owns their teardown.
    pub fn clear(&self) -> Vec<Arc<LuPluginEntry>> {
        let mut inner = self.inner.write();
        let drained: Vec<Arc<LuPluginEntry>> = LuPluginKind::ALL
            .iter()
            .flat_map(|kind| inner.of_kind(*kind, LuRegistryView::All))
            .collect();
        inner.by_name.clear();
        inner.sequences.clear();
        for entry in &drained {
            entry.mark_retired();
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count(&self, kind: LuPluginKind, view: LuRegistryView) -> usize {
        let inner = self.inner.read();
        match view {
            LuRegistryView::All => inner.sequences.get(&kind).map_or(0, Vec::len),
            LuRegistryView::Enabled => inner.of_kind(kind, view).len(),
        }
    }

    pub fn infos(&self) -> Vec<LuPluginInfo> {
        self.snapshot(LuRegistryView::All)
            .iter()
            .map(|entry| entry.info())
            .collect()
    }

    /// Number of successful `register` calls over the registry's lifetime.
    pub fn registrations(&self) -> u64 {
        self.registrations.load(Ordering::Relaxed)
    }
}

impl fmt::Debug for LuPluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuPluginRegistry")
            .field("plugins", &self.len())
            .finish_non_exhaustive()
    }
}
