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

//! # Lifecycle Coordinator
//!
//! Fans a lifecycle hook out to a set of plugins, one task per plugin, and
//! joins them all before returning. A failing, panicking or timed-out hook is
//! logged under `lifecycle.hook_failed` and recorded in the pass report; it
//! never cancels or delays its siblings.
//!
//! The coordinator itself does not serialise passes. The runtime holds its
//! lifecycle gate around every call so two passes never interleave for the
//! same plugin.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde_json::json;

use crate::engine::isolation;
use crate::engine::registry::{LuPluginEntry, LuPluginState};
use crate::engine::runtime::LuRuntimeContext;
use crate::errors::LuError;
use crate::frame::LuDeviceHandle;
use crate::log::LuEventLog;
use crate::plugin::{LuHook, LuInterfaceEvent, LuPluginCapability, LuPluginKind};

/// Outcome of one fan-out pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LuPassReport {
    /// Hooks started in this pass.
    pub invoked: usize,
    pub failed: Vec<LuError>,
}

impl LuPassReport {
    pub fn succeeded(&self) -> usize {
        self.invoked - self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct LuLifecycleCoordinator {
    log: LuEventLog,
    hook_timeout: Option<Duration>,
}

impl LuLifecycleCoordinator {
    pub fn new(log: LuEventLog, hook_timeout: Option<Duration>) -> Self {
        LuLifecycleCoordinator { log, hook_timeout }
    }

    /// Run `initialize` on every entry, whether enabled or not.
    pub async fn initialize_all(
        &self,
        entries: Vec<Arc<LuPluginEntry>>,
        ctx: &LuRuntimeContext,
    ) -> LuPassReport {
        let log = self.log.clone();
        let ctx = ctx.clone();
        self.fan_out(
            LuHook::Initialize,
            entries,
            self.hook_timeout,
            Some(LuPluginState::Initialized),
            move |entry| {
                let plugin_ctx = ctx.plugin_context(entry.name(), &log);
                async move { entry.plugin().initialize(&plugin_ctx).await }
            },
        )
        .await
    }

    /// Run `on_device_ready` on the enabled entries.
    pub async fn notify_ready(
        &self,
        entries: Vec<Arc<LuPluginEntry>>,
        device: &LuDeviceHandle,
    ) -> LuPassReport {
        let device = device.clone();
        self.fan_out(
            LuHook::DeviceReady,
            enabled(entries),
            self.hook_timeout,
            Some(LuPluginState::Ready),
            move |entry| {
                let device = device.clone();
                async move { entry.plugin().on_device_ready(&device).await }
            },
        )
        .await
    }

    /// Run `on_device_released` on the enabled entries.
    pub async fn notify_released(
        &self,
        entries: Vec<Arc<LuPluginEntry>>,
        device: &LuDeviceHandle,
    ) -> LuPassReport {
        let device = device.clone();
        self.fan_out(
            LuHook::DeviceReleased,
            enabled(entries),
            self.hook_timeout,
            Some(LuPluginState::Released),
            move |entry| {
                let device = device.clone();
                async move { entry.plugin().on_device_released(&device).await }
            },
        )
        .await
    }

    /// Deliver `event` to the enabled Interface entries.
    pub async fn interface_event(
        &self,
        entries: Vec<Arc<LuPluginEntry>>,
        event: &LuInterfaceEvent,
    ) -> LuPassReport {
        let surfaces = enabled(entries)
            .into_iter()
            .filter(|e| e.kind() == LuPluginKind::Interface)
            .collect();
        let event = Arc::new(event.clone());
        self.fan_out(
            LuHook::InterfaceEvent,
            surfaces,
            self.hook_timeout,
            None,
            move |entry| {
                let event = event.clone();
                async move {
                    match entry.plugin().capability() {
                        LuPluginCapability::Interface(surface) => {
                            surface.on_interface_event(&event).await
                        }
                        _ => Ok(()),
                    }
                }
            },
        )
        .await
    }

    /// Run `teardown` on every entry, each bounded by `grace`.
    pub async fn teardown_all(
        &self,
        entries: Vec<Arc<LuPluginEntry>>,
        grace: Duration,
    ) -> LuPassReport {
        self.fan_out(
            LuHook::Teardown,
            entries,
            Some(grace),
            Some(LuPluginState::Released),
            |entry| async move { entry.plugin().teardown().await },
        )
        .await
    }

    async fn fan_out<F, Fut>(
        &self,
        hook: LuHook,
        entries: Vec<Arc<LuPluginEntry>>,
        timeout: Option<Duration>,
        next_state: Option<LuPluginState>,
        call: F,
    ) -> LuPassReport
    where
        F: Fn(Arc<LuPluginEntry>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let mut report = LuPassReport {
            invoked: entries.len(),
            failed: Vec::new(),
        };
        if entries.is_empty() {
            return report;
        }

        let tasks: Vec<_> = entries
            .iter()
            .map(|entry| {
                let fut = call(entry.clone());
                tokio::spawn(isolation::invoke(
                    entry.name().to_string(),
                    hook,
                    timeout,
                    fut,
                ))
            })
            .collect();

        for (entry, joined) in entries.iter().zip(join_all(tasks).await) {
            let outcome = joined.unwrap_or_else(|join_err| {
                Err(LuError::HookPanicked {
                    plugin: entry.name().to_string(),
                    hook: hook.as_str().to_string(),
                    message: join_err.to_string(),
                })
            });
            if let Err(err) = outcome {
                isolation::report(&self.log, "lifecycle.hook_failed", hook, &err);
                report.failed.push(err);
            }
            if let Some(state) = next_state {
                entry.advance(state);
            }
        }

        self.log.debug(
            "lifecycle.pass_complete",
            "lifecycle pass joined",
            [
                ("hook", json!(hook.as_str())),
                ("invoked", json!(report.invoked)),
                ("failed", json!(report.failed.len())),
            ],
        );
        report
    }
}

fn enabled(entries: Vec<Arc<LuPluginEntry>>) -> Vec<Arc<LuPluginEntry>> {
    entries.into_iter().filter(|e| e.is_enabled()).collect()
}
