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

//! # Plugin Contract
//!
//! A plugin is a named, independently enableable unit registered with the
//! runtime. Every plugin shares the lifecycle hooks of [`LuPlugin`] and
//! exposes exactly one capability, chosen from a closed set:
//!
//! - **Processing** ([`LuFrameProcessor`]): consumes captured frames.
//! - **Interface** ([`LuInterfaceSurface`]): owns a visual surface and reacts
//!   to interface events.
//! - **Control** ([`LuDeviceControls`]): exposes adjustable device parameters.
//!
//! The runtime never downcasts: it asks a plugin for its
//! [`LuPluginCapability`] and matches on the variant.
//!
//! # Example
//!
//! ```ignore
//! struct Histogram;
//!
//! #[async_trait]
//! impl LuFrameProcessor for Histogram {
//!     async fn process_frame(&self, frame: &LuFrame) -> anyhow::Result<()> {
//!         let _luma = frame.data().iter().map(|b| *b as u64).sum::<u64>();
//!         Ok(())
//!     }
//! }
//!
//! #[async_trait]
//! impl LuPlugin for Histogram {
//!     fn name(&self) -> &str { "histogram" }
//!     fn capability(&self) -> LuPluginCapability<'_> {
//!         LuPluginCapability::Processing(self)
//!     }
//! }
//! ```
//!
//! Hooks return `anyhow::Result<()>`. Errors and panics raised inside hooks
//! are contained by the runtime and only ever reach the log.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::frame::{LuDeviceHandle, LuFrame};
use crate::log::LuEventLog;
use crate::settings::LuScopedSettings;

/// Priority given to plugins that do not choose one. Lower runs earlier.
pub const DEFAULT_PRIORITY: i32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LuPluginKind {
    Processing,
    Interface,
    Control,
}

impl LuPluginKind {
    pub const ALL: [LuPluginKind; 3] = [
        LuPluginKind::Processing,
        LuPluginKind::Interface,
        LuPluginKind::Control,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LuPluginKind::Processing => "processing",
            LuPluginKind::Interface => "interface",
            LuPluginKind::Control => "control",
        }
    }
}

impl fmt::Display for LuPluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Plugin entry points the runtime calls, used to label logs and errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LuHook {
    /// Metadata accessors: `name`, `priority`, `kind`, `capability`.
    Describe,
    Initialize,
    DeviceReady,
    DeviceReleased,
    ProcessFrame,
    InterfaceEvent,
    DescribeControls,
    ApplyControl,
    Teardown,
}

impl LuHook {
    pub fn as_str(&self) -> &'static str {
        match self {
            LuHook::Describe => "describe",
            LuHook::Initialize => "initialize",
            LuHook::DeviceReady => "on_device_ready",
            LuHook::DeviceReleased => "on_device_released",
            LuHook::ProcessFrame => "process_frame",
            LuHook::InterfaceEvent => "on_interface_event",
            LuHook::DescribeControls => "controls",
            LuHook::ApplyControl => "apply_control",
            LuHook::Teardown => "teardown",
        }
    }
}

impl fmt::Display for LuHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a plugin receives when the runtime initializes it.
#[derive(Clone, Debug)]
pub struct LuPluginContext {
    plugin: String,
    application: String,
    settings: LuScopedSettings,
    log: LuEventLog,
}

impl LuPluginContext {
    pub(crate) fn new(
        plugin: impl Into<String>,
        application: impl Into<String>,
        settings: LuScopedSettings,
        log: LuEventLog,
    ) -> Self {
        LuPluginContext {
            plugin: plugin.into(),
            application: application.into(),
            settings,
            log,
        }
    }

    pub fn plugin_name(&self) -> &str {
        &self.plugin
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    /// Settings scoped to this plugin's name.
    pub fn settings(&self) -> &LuScopedSettings {
        &self.settings
    }

    /// The runtime's log sink, for plugins that want their records alongside
    /// the runtime's.
    pub fn log(&self) -> &LuEventLog {
        &self.log
    }
}

/// Lifecycle contract shared by every plugin variant.
#[async_trait]
pub trait LuPlugin: Send + Sync {
    /// Unique registry key. Must be stable for the life of the instance.
    fn name(&self) -> &str;

    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Initial value of the enabled flag when registered.
    fn enabled_by_default(&self) -> bool {
        true
    }

    fn capability(&self) -> LuPluginCapability<'_>;

    fn kind(&self) -> LuPluginKind {
        self.capability().kind()
    }

    /// Runs once, when the runtime is (or becomes) initialized.
    async fn initialize(&self, _ctx: &LuPluginContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_device_ready(&self, _device: &LuDeviceHandle) -> anyhow::Result<()> {
        Ok(())
    }

    async fn on_device_released(&self, _device: &LuDeviceHandle) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs when the plugin is unregistered, replaced, or the runtime shuts down.
    async fn teardown(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The one capability a plugin exposes.
pub enum LuPluginCapability<'a> {
    Processing(&'a dyn LuFrameProcessor),
    Interface(&'a dyn LuInterfaceSurface),
    Control(&'a dyn LuDeviceControls),
}

impl LuPluginCapability<'_> {
    pub fn kind(&self) -> LuPluginKind {
        match self {
            LuPluginCapability::Processing(_) => LuPluginKind::Processing,
            LuPluginCapability::Interface(_) => LuPluginKind::Interface,
            LuPluginCapability::Control(_) => LuPluginKind::Control,
        }
    }
}

#[async_trait]
pub trait LuFrameProcessor: Send + Sync {
    async fn process_frame(&self, frame: &LuFrame) -> anyhow::Result<()>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LuInterfaceEvent {
    OrientationChanged { degrees: u16 },
    SurfaceResized { width: u32, height: u32 },
    VisibilityChanged { visible: bool },
    Custom { name: String, payload: Value },
}

#[async_trait]
pub trait LuInterfaceSurface: Send + Sync {
    async fn on_interface_event(&self, event: &LuInterfaceEvent) -> anyhow::Result<()>;
}

/// One adjustable parameter exposed by a Control plugin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LuControlDescriptor {
    pub name: String,
    pub label: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default_value: f64,
}

impl LuControlDescriptor {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        let name = name.into();
        LuControlDescriptor {
            label: name.clone(),
            name,
            min,
            max,
            step: 0.0,
            default_value: min,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }

    pub fn default_value(mut self, value: f64) -> Self {
        self.default_value = value;
        self
    }

    pub fn accepts(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// Controls grouped under the plugin that exposes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LuPluginControls {
    pub plugin: String,
    pub controls: Vec<LuControlDescriptor>,
}

#[async_trait]
pub trait LuDeviceControls: Send + Sync {
    fn controls(&self) -> Vec<LuControlDescriptor>;

    async fn apply_control(&self, control: &str, value: f64) -> anyhow::Result<()>;
}
