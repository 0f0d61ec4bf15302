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

//! # Runtime Configuration
//!
//! [`LuRuntimeConfig`] collects the tunables of the plugin runtime. It can be
//! built fluently, deserialized from JSON, or (with the `yaml` feature) read
//! from a YAML document. Every field has a default, so partial documents are
//! accepted.
//!
//! ```yaml
//! dispatch_mode: bounded_parallel
//! max_workers: 4
//! frame_budget_ms: 33
//! stats_window: 100
//! shutdown_grace_ms: 2000
//! hook_timeout_ms: 500
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{LuError, Result};

/// Frame budget at 30 fps.
pub const DEFAULT_FRAME_BUDGET_MS: u64 = 33;
pub const DEFAULT_STATS_WINDOW: usize = 100;
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2_000;

/// How the frame dispatcher schedules Processing plugins for one frame.
///
/// Both modes enforce per-plugin single-flight: a plugin still busy with an
/// earlier frame is skipped for the new one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LuDispatchMode {
    /// One task per plugin; at most `max_workers` run at once.
    #[default]
    BoundedParallel,
    /// One task per frame that calls plugins in priority order.
    Sequential,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuRuntimeConfig {
    pub dispatch_mode: LuDispatchMode,
    /// Upper bound on concurrently running frame tasks.
    pub max_workers: usize,
    /// Dispatch bookkeeping slower than this logs `performance.slow_frame`.
    pub frame_budget_ms: u64,
    /// Samples kept per plugin by the performance tracker.
    pub stats_window: usize,
    /// How long shutdown waits for in-flight work and each teardown hook.
    pub shutdown_grace_ms: u64,
    /// Optional bound on lifecycle and interface hooks; `None` waits forever.
    pub hook_timeout_ms: Option<u64>,
}

impl Default for LuRuntimeConfig {
    fn default() -> Self {
        LuRuntimeConfig {
            dispatch_mode: LuDispatchMode::default(),
            max_workers: num_cpus::get().max(1),
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            stats_window: DEFAULT_STATS_WINDOW,
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
            hook_timeout_ms: None,
        }
    }
}

impl LuRuntimeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch_mode(mut self, mode: LuDispatchMode) -> Self {
        self.dispatch_mode = mode;
        self
    }

    pub fn max_workers(mut self, workers: usize) -> Self {
        self.max_workers = workers;
        self
    }

    pub fn frame_budget_ms(mut self, ms: u64) -> Self {
        self.frame_budget_ms = ms;
        self
    }

    pub fn stats_window(mut self, samples: usize) -> Self {
        self.stats_window = samples;
        self
    }

    pub fn shutdown_grace_ms(mut self, ms: u64) -> Self {
        self.shutdown_grace_ms = ms;
        self
    }

    pub fn hook_timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.hook_timeout_ms = ms;
        self
    }

    pub fn frame_budget(&self) -> Duration {
        Duration::from_millis(self.frame_budget_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn hook_timeout(&self) -> Option<Duration> {
        self.hook_timeout_ms.map(Duration::from_millis)
    }

    /// Reject values the runtime cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(LuError::config("max_workers must be at least 1"));
        }
        if self.stats_window == 0 {
            return Err(LuError::config("stats_window must be at least 1"));
        }
        if self.frame_budget_ms == 0 {
            return Err(LuError::config("frame_budget_ms must be positive"));
        }
        if self.hook_timeout_ms == Some(0) {
            return Err(LuError::config("hook_timeout_ms must be positive when set"));
        }
        Ok(())
    }

    pub fn from_json(value: &Value) -> Result<Self> {
        let config: LuRuntimeConfig = serde_json::from_value(value.clone())?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(document: &str) -> Result<Self> {
        let config: LuRuntimeConfig = serde_yaml::from_str(document)?;
        config.validate()?;
        Ok(config)
    }
}
