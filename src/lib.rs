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

//! # Lumen Core Library
//!
//! Lumen is the plugin runtime and device-session coordinator embedded in a
//! camera application. It keeps a registry of independently authored plugins,
//! forwards device lifecycle transitions to them, fans captured frames out to
//! the processing plugins under a bounded-concurrency policy, and tracks how
//! long each plugin takes per frame.
//!
//! ## Module Overview
//!
//! - **plugin**: The plugin contract and its three capabilities (Processing,
//!   Interface, Control)
//! - **frame**: Frame and device handles passed through the runtime
//! - **engine**: Registry, lifecycle coordinator, frame dispatcher,
//!   performance tracker and the [`LuRuntime`] facade
//! - **settings**: Plugin-scoped settings store interface
//! - **log**: Structured log records and sinks
//! - **config**: Runtime configuration
//! - **errors**: Error taxonomy
//!
//! ## Feature Flags
//!
//! - `yaml` (default): Load [`LuRuntimeConfig`] from YAML documents
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use lumen::{LuDeviceHandle, LuFrame, LuPixelFormat, LuRuntime, LuRuntimeConfig, LuRuntimeContext};
//!
//! let runtime = LuRuntime::new(LuRuntimeConfig::default())?;
//! runtime.register_plugin(Arc::new(Histogram::default())).await?;
//! runtime.initialize(LuRuntimeContext::default()).await?;
//! runtime.notify_device_ready(&LuDeviceHandle::detached("back-0")).await;
//!
//! runtime.ingest_frame(LuFrame::new(640, 480, LuPixelFormat::Yuv420, pixels))?;
//!
//! println!("{:?}", runtime.performance_stats());
//! runtime.shutdown().await;
//! ```
//!
//! ## Error Handling
//!
//! Runtime API calls return `Result<T, LuError>` for misuse such as an empty
//! plugin name or ingesting frames before `initialize`. Failures inside
//! plugin hooks are isolated, logged and never returned to the caller.

pub mod config;
pub mod engine;
pub mod errors;
pub mod frame;
pub mod log;
pub mod plugin;
pub mod settings;

pub use config::{LuDispatchMode, LuRuntimeConfig};
pub use engine::{
    LuDispatchReport, LuFrameDispatcher, LuLifecycleCoordinator, LuPassReport,
    LuPerformanceSample, LuPerformanceTracker, LuPluginEntry, LuPluginInfo, LuPluginRegistry,
    LuPluginState, LuPluginStats, LuRegistryView, LuRuntime, LuRuntimeBuilder, LuRuntimeContext,
    LuRuntimeStatus,
};
pub use errors::{LuError, Result};
pub use frame::{LuDeviceHandle, LuFrame, LuPixelFormat};
pub use self::log::{
    LuEventLog, LuFacadeLogSink, LuLogConfig, LuLogLevel, LuLogRecord, LuLogSink, LuMemoryLogSink,
    LuTeeLogSink,
};
pub use plugin::{
    LuControlDescriptor, LuDeviceControls, LuFrameProcessor, LuHook, LuInterfaceEvent,
    LuInterfaceSurface, LuPlugin, LuPluginCapability, LuPluginContext, LuPluginControls,
    LuPluginKind, DEFAULT_PRIORITY,
};
pub use settings::{LuMemorySettings, LuScopedSettings, LuSettingsStore};

/// Re-exported so plugin crates can implement the async traits without a
/// direct dependency.
pub use async_trait::async_trait;
