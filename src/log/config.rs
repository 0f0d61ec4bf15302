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

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::core::{LuLogLevel, LuLogRecord};

/// Filtering configuration applied by the retaining sinks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LuLogConfig {
    /// Records below this level are dropped.
    pub min_level: LuLogLevel,
    /// Maximum number of records a memory sink retains; oldest are evicted.
    pub capacity: usize,
    /// Category prefixes that are always dropped (e.g. `dispatch.frame_skipped`).
    pub muted_categories: HashSet<String>,
}

impl Default for LuLogConfig {
    fn default() -> Self {
        LuLogConfig {
            min_level: LuLogLevel::Debug,
            capacity: 10_000,
            muted_categories: HashSet::new(),
        }
    }
}

impl LuLogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_level(mut self, level: LuLogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn mute(mut self, category_prefix: &str) -> Self {
        self.muted_categories.insert(category_prefix.to_string());
        self
    }

    pub fn should_log(&self, record: &LuLogRecord) -> bool {
        if record.level < self.min_level {
            return false;
        }
        !self
            .muted_categories
            .iter()
            .any(|prefix| record.category.starts_with(prefix.as_str()))
    }

    /// Lenient JSON loader; malformed input yields the defaults.
    pub fn from_json(value: &Value) -> LuLogConfig {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }
}
