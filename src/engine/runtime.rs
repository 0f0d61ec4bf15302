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

//! # Lumen Runtime
//!
//! [`LuRuntime`] is the single entry point the camera application talks to.
//! It composes the registry, lifecycle coordinator, frame dispatcher and
//! performance tracker, and owns the device-session state.
//!
//! ## Core Concepts
//!
//! - **Lifecycle gate**: an async mutex held by `initialize`,
//!   `register_plugin`, `unregister_plugin`, the device notifications,
//!   interface events and `shutdown`. Lifecycle passes therefore never
//!   overlap.
//! - **Frame path**: `ingest_frame` is synchronous and never waits on plugin
//!   code. It may be called from a capture thread outside the async runtime.
//! - **Isolation**: plugin failures are logged and absorbed. Only misuse of
//!   the runtime API is returned as an error.
//!
//! ## Usage
//!
//! ```ignore
//! let runtime = LuRuntime::new(LuRuntimeConfig::default())?;
//! runtime.register_plugin(Arc::new(Histogram::default())).await?;
//! runtime.initialize(LuRuntimeContext::default()).await?;
//! runtime.notify_device_ready(&device).await;
//! runtime.ingest_frame(frame)?;
//! runtime.shutdown().await;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::Mutex;

use crate::config::LuRuntimeConfig;
use crate::engine::dispatcher::LuFrameDispatcher;
use crate::engine::isolation;
use crate::engine::lifecycle::{LuLifecycleCoordinator, LuPassReport};
use crate::engine::performance::{LuPerformanceTracker, LuPluginStats};
use crate::engine::registry::{LuPluginEntry, LuPluginInfo, LuPluginRegistry, LuRegistryView};
use crate::errors::{LuError, Result};
use crate::frame::{LuDeviceHandle, LuFrame};
use crate::log::{LuEventLog, LuFacadeLogSink, LuLogSink};
use crate::plugin::{
    LuControlDescriptor, LuHook, LuInterfaceEvent, LuPlugin, LuPluginCapability, LuPluginContext,
    LuPluginControls, LuPluginKind,
};
use crate::settings::{LuMemorySettings, LuScopedSettings, LuSettingsStore};

/// Application-supplied context handed to `initialize`.
#[derive(Clone)]
pub struct LuRuntimeContext {
    application: String,
    settings: Arc<dyn LuSettingsStore>,
}

impl LuRuntimeContext {
    pub fn new(application: impl Into<String>, settings: Arc<dyn LuSettingsStore>) -> Self {
        LuRuntimeContext {
            application: application.into(),
            settings,
        }
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    pub fn settings(&self) -> &Arc<dyn LuSettingsStore> {
        &self.settings
    }

    pub(crate) fn plugin_context(&self, plugin: &str, log: &LuEventLog) -> LuPluginContext {
        LuPluginContext::new(
            plugin,
            self.application.clone(),
            LuScopedSettings::new(plugin, self.settings.clone()),
            log.clone(),
        )
    }
}

impl Default for LuRuntimeContext {
    fn default() -> Self {
        LuRuntimeContext::new("lumen", Arc::new(LuMemorySettings::new()))
    }
}

impl fmt::Debug for LuRuntimeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuRuntimeContext")
            .field("application", &self.application)
            .finish_non_exhaustive()
    }
}

/// Point-in-time summary of the runtime.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuRuntimeStatus {
    pub total_plugins: usize,
    pub enabled_plugins: usize,
    pub processing: usize,
    pub interface: usize,
    pub control: usize,
    pub frames_processed: u64,
    pub initialized: bool,
    pub device_ready: bool,
}

#[derive(Default)]
pub struct LuRuntimeBuilder {
    config: LuRuntimeConfig,
    sink: Option<Arc<dyn LuLogSink>>,
    handle: Option<Handle>,
}

impl LuRuntimeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: LuRuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn log_sink(mut self, sink: Arc<dyn LuLogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Tokio runtime that frame tasks are spawned on. Defaults to the runtime
    /// the builder is called from.
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    pub fn build(self) -> Result<LuRuntime> {
        self.config.validate()?;
        let handle = match self.handle {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|err| {
                LuError::internal(format!("no tokio runtime available for frame dispatch: {}", err))
            })?,
        };
        let sink = self
            .sink
            .unwrap_or_else(|| Arc::new(LuFacadeLogSink::new()) as Arc<dyn LuLogSink>);
        let log = LuEventLog::new(sink);

        let tracker = Arc::new(LuPerformanceTracker::new(self.config.stats_window));
        let hook_timeout = self.config.hook_timeout();
        let registry = LuPluginRegistry::new(tracker.clone(), log.clone(), hook_timeout)
            .with_drain_grace(self.config.shutdown_grace());
        let lifecycle = LuLifecycleCoordinator::new(log.clone(), hook_timeout);
        let dispatcher = LuFrameDispatcher::new(handle, &self.config, tracker.clone(), log.clone());

        log.info(
            "runtime.created",
            "plugin runtime created",
            [
                ("dispatch_mode", json!(self.config.dispatch_mode)),
                ("max_workers", json!(self.config.max_workers)),
                ("frame_budget_ms", json!(self.config.frame_budget_ms)),
                ("stats_window", json!(self.config.stats_window)),
            ],
        );

        Ok(LuRuntime {
            config: self.config,
            log,
            tracker,
            registry,
            lifecycle,
            dispatcher,
            gate: Mutex::new(None),
            initialized: RwLock::new(false),
            device: RwLock::new(None),
        })
    }
}

pub struct LuRuntime {
    config: LuRuntimeConfig,
    log: LuEventLog,
    tracker: Arc<LuPerformanceTracker>,
    registry: LuPluginRegistry,
    lifecycle: LuLifecycleCoordinator,
    dispatcher: LuFrameDispatcher,
    /// Lifecycle gate; holds the context once initialized.
    gate: Mutex<Option<LuRuntimeContext>>,
    /// Frame intake flag. `ingest_frame` holds the read side for the whole
    /// dispatch; shutdown closes it under the write side.
    initialized: RwLock<bool>,
    device: RwLock<Option<LuDeviceHandle>>,
}

impl LuRuntime {
    pub fn new(config: LuRuntimeConfig) -> Result<Self> {
        LuRuntimeBuilder::new().config(config).build()
    }

    pub fn builder() -> LuRuntimeBuilder {
        LuRuntimeBuilder::new()
    }

    pub fn config(&self) -> &LuRuntimeConfig {
        &self.config
    }

    pub fn log(&self) -> &LuEventLog {
        &self.log
    }

    pub fn is_initialized(&self) -> bool {
        *self.initialized.read()
    }

    pub fn device(&self) -> Option<LuDeviceHandle> {
        self.device.read().clone()
    }

    /// Mark the runtime initialized and run `initialize` on every registered
    /// plugin. Calling it again is a no-op.
    pub async fn initialize(&self, ctx: LuRuntimeContext) -> Result<()> {
        let mut gate = self.gate.lock().await;
        if self.is_initialized() {
            self.log.debug(
                "runtime.already_initialized",
                "initialize ignored, runtime already initialized",
                [("application", json!(ctx.application()))],
            );
            return Ok(());
        }

        *self.initialized.write() = true;
        let report = self
            .lifecycle
            .initialize_all(self.registry.snapshot(LuRegistryView::All), &ctx)
            .await;
        self.log.info(
            "runtime.initialized",
            "runtime initialized",
            [
                ("application", json!(ctx.application())),
                ("plugins", json!(report.invoked)),
                ("failed", json!(report.failed.len())),
            ],
        );
        *gate = Some(ctx);
        Ok(())
    }

    /// Register `plugin`, replacing any plugin of the same name. A plugin
    /// joining late is initialized and, if the device is ready, told so.
    pub async fn register_plugin(&self, plugin: Arc<dyn LuPlugin>) -> Result<()> {
        let entry = match LuPluginEntry::new(plugin) {
            Ok(entry) => entry,
            Err(err) => {
                isolation::report(&self.log, "lifecycle.hook_failed", LuHook::Describe, &err);
                return Err(LuError::validation(format!(
                    "plugin metadata unavailable: {}",
                    err
                )));
            }
        };
        if entry.name().trim().is_empty() {
            self.log.warn(
                "runtime.register_rejected",
                "plugin name must not be empty",
                [("kind", json!(entry.kind().as_str()))],
            );
            return Err(LuError::validation("plugin name must not be empty"));
        }

        let gate = self.gate.lock().await;
        let entry = self.registry.insert(entry).await;

        if let Some(ctx) = gate.as_ref() {
            self.lifecycle.initialize_all(vec![entry.clone()], ctx).await;
        }
        let device = self.device();
        if let Some(device) = device {
            self.lifecycle.notify_ready(vec![entry.clone()], &device).await;
        }
        Ok(())
    }

    /// Remove and tear down `name`. `false` if it was not registered.
    pub async fn unregister_plugin(&self, name: &str) -> bool {
        let _gate = self.gate.lock().await;
        self.registry.unregister(name).await
    }

    /// Takes effect from the next event. No hook fires.
    pub fn enable_plugin(&self, name: &str) -> bool {
        self.registry.set_enabled(name, true)
    }

    /// Takes effect from the next event. No hook fires.
    pub fn disable_plugin(&self, name: &str) -> bool {
        self.registry.set_enabled(name, false)
    }

    /// Hand `frame` to the enabled Processing plugins without waiting for them.
    pub fn ingest_frame(&self, frame: LuFrame) -> Result<()> {
        let open = self.initialized.read();
        if !*open {
            return Err(LuError::not_initialized("ingest_frame"));
        }
        let plugins = self
            .registry
            .of_kind(LuPluginKind::Processing, LuRegistryView::Enabled);
        if plugins.is_empty() {
            return Ok(());
        }
        self.dispatcher.dispatch(frame, plugins);
        Ok(())
    }

    pub async fn notify_device_ready(&self, device: &LuDeviceHandle) -> LuPassReport {
        let _gate = self.gate.lock().await;
        *self.device.write() = Some(device.clone());
        let report = self
            .lifecycle
            .notify_ready(self.registry.snapshot(LuRegistryView::All), device)
            .await;
        self.log.info(
            "runtime.device_ready",
            "device session ready",
            [
                ("device", json!(device.id())),
                ("notified", json!(report.invoked)),
                ("failed", json!(report.failed.len())),
            ],
        );
        report
    }

    pub async fn notify_device_released(&self, device: &LuDeviceHandle) -> LuPassReport {
        let _gate = self.gate.lock().await;
        *self.device.write() = None;
        let report = self
            .lifecycle
            .notify_released(self.registry.snapshot(LuRegistryView::All), device)
            .await;
        self.log.info(
            "runtime.device_released",
            "device session released",
            [
                ("device", json!(device.id())),
                ("notified", json!(report.invoked)),
                ("failed", json!(report.failed.len())),
            ],
        );
        report
    }

    /// Deliver an interface event to the enabled Interface plugins.
    pub async fn dispatch_interface_event(&self, event: &LuInterfaceEvent) -> LuPassReport {
        let _gate = self.gate.lock().await;
        let surfaces = self
            .registry
            .of_kind(LuPluginKind::Interface, LuRegistryView::Enabled);
        self.lifecycle.interface_event(surfaces, event).await
    }

    fn describe_controls(&self, entry: &LuPluginEntry) -> Vec<LuControlDescriptor> {
        let described = isolation::call_sync(entry.name(), LuHook::DescribeControls, || {
            match entry.plugin().capability() {
                LuPluginCapability::Control(controls) => controls.controls(),
                _ => Vec::new(),
            }
        });
        described.unwrap_or_else(|err| {
            isolation::report(&self.log, "lifecycle.hook_failed", LuHook::DescribeControls, &err);
            Vec::new()
        })
    }

    /// Adjustable parameters of every enabled Control plugin, in priority order.
    pub fn control_descriptors(&self) -> Vec<LuPluginControls> {
        self.registry
            .of_kind(LuPluginKind::Control, LuRegistryView::Enabled)
            .iter()
            .map(|entry| LuPluginControls {
                plugin: entry.name().to_string(),
                controls: self.describe_controls(entry),
            })
            .collect()
    }

    /// Route `value` to `control` on `plugin`. `false` when the plugin is
    /// unknown, disabled, not a Control plugin, does not expose `control`,
    /// rejects the value, or fails while applying it.
    pub async fn apply_control(&self, plugin: &str, control: &str, value: f64) -> bool {
        let entry = match self.registry.get(plugin) {
            Some(entry) if entry.kind() == LuPluginKind::Control && entry.is_enabled() => entry,
            _ => {
                self.log.debug(
                    "runtime.control_unroutable",
                    "no enabled control plugin with that name",
                    [("plugin", json!(plugin)), ("control", json!(control))],
                );
                return false;
            }
        };

        let descriptors = self.describe_controls(&entry);
        let Some(descriptor) = descriptors.iter().find(|d| d.name == control) else {
            self.log.debug(
                "runtime.control_unknown",
                "plugin does not expose that control",
                [("plugin", json!(plugin)), ("control", json!(control))],
            );
            return false;
        };
        if !descriptor.accepts(value) {
            self.log.warn(
                "runtime.control_rejected",
                "control value out of range",
                [
                    ("plugin", json!(plugin)),
                    ("control", json!(control)),
                    ("value", json!(value)),
                    ("min", json!(descriptor.min)),
                    ("max", json!(descriptor.max)),
                ],
            );
            return false;
        }

        let target = entry.clone();
        let control_name = control.to_string();
        let result = isolation::invoke(
            plugin.to_string(),
            LuHook::ApplyControl,
            self.config.hook_timeout(),
            async move {
                match target.plugin().capability() {
                    LuPluginCapability::Control(controls) => {
                        controls.apply_control(&control_name, value).await
                    }
                    _ => Ok(()),
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                self.log.info(
                    "runtime.control_applied",
                    "control applied",
                    [
                        ("plugin", json!(plugin)),
                        ("control", json!(control)),
                        ("value", json!(value)),
                    ],
                );
                true
            }
            Err(err) => {
                isolation::report(&self.log, "lifecycle.hook_failed", LuHook::ApplyControl, &err);
                false
            }
        }
    }

    /// Management view of every registered plugin.
    pub fn plugins(&self) -> Vec<LuPluginInfo> {
        self.registry.infos()
    }

    pub fn status(&self) -> LuRuntimeStatus {
        LuRuntimeStatus {
            total_plugins: self.registry.len(),
            enabled_plugins: self.registry.snapshot(LuRegistryView::Enabled).len(),
            processing: self.registry.count(LuPluginKind::Processing, LuRegistryView::All),
            interface: self.registry.count(LuPluginKind::Interface, LuRegistryView::All),
            control: self.registry.count(LuPluginKind::Control, LuRegistryView::All),
            frames_processed: self.dispatcher.frames_dispatched(),
            initialized: self.is_initialized(),
            device_ready: self.device.read().is_some(),
        }
    }

    pub fn performance_stats(&self) -> HashMap<String, LuPluginStats> {
        self.tracker.stats_all()
    }

    pub fn plugin_stats(&self, name: &str) -> LuPluginStats {
        self.tracker.stats_for(name)
    }

    /// Cancel outstanding frame work, tear every plugin down and return the
    /// runtime to its uninitialized state. Safe to call more than once.
    pub async fn shutdown(&self) -> LuPassReport {
        let mut gate = self.gate.lock().await;
        let grace = self.config.shutdown_grace();

        // no dispatch is running past this point
        *self.initialized.write() = false;
        let entries = self.registry.clear();
        self.dispatcher.cancel_outstanding();
        if !self.dispatcher.wait_idle(grace).await {
            self.log.warn(
                "shutdown.drain_timeout",
                "abandoning frame tasks still running after the grace period",
                [
                    ("in_flight", json!(self.dispatcher.in_flight())),
                    ("grace_ms", json!(self.config.shutdown_grace_ms)),
                ],
            );
        }

        let report = self.lifecycle.teardown_all(entries, grace).await;
        self.tracker.clear();
        self.dispatcher.reset();
        *self.device.write() = None;
        *gate = None;

        let failed: Vec<&str> = report.failed.iter().filter_map(|e| e.plugin()).collect();
        self.log.info(
            "shutdown.complete",
            "runtime shut down",
            [
                ("torn_down", json!(report.invoked)),
                ("failed", json!(failed)),
            ],
        );
        report
    }
}

impl fmt::Debug for LuRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuRuntime")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
