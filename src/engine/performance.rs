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

//! # Performance Tracker
//!
//! Keeps a sliding window of recent frame-processing durations per plugin
//! and derives count/mean/min/max on demand.
//!
//! Each plugin's window sits behind its own mutex; the outer map lock is only
//! taken to find or create a window, so contention stays scoped to a single
//! plugin's statistics.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_STATS_WINDOW;

/// One frame-processing measurement.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LuPerformanceSample {
    pub plugin: String,
    pub frame_sequence: u64,
    pub duration_ms: f64,
}

/// Aggregate view of a plugin's window plus lifetime counters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LuPluginStats {
    /// Samples currently in the window.
    pub count: usize,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub last_ms: f64,
    /// Frame hooks that returned an error, panicked or were abandoned.
    pub failures: u64,
    /// Frames dropped because the plugin was still busy.
    pub skipped: u64,
}

#[derive(Debug)]
struct LuSampleWindow {
    capacity: usize,
    samples: VecDeque<LuPerformanceSample>,
    failures: u64,
    skipped: u64,
}

impl LuSampleWindow {
    fn new(capacity: usize) -> Self {
        LuSampleWindow {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            failures: 0,
            skipped: 0,
        }
    }

    fn push(&mut self, sample: LuPerformanceSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    fn stats(&self) -> LuPluginStats {
        let mut stats = LuPluginStats {
            count: self.samples.len(),
            failures: self.failures,
            skipped: self.skipped,
            ..LuPluginStats::default()
        };
        if self.samples.is_empty() {
            return stats;
        }

        let mut total = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for sample in &self.samples {
            total += sample.duration_ms;
            min = min.min(sample.duration_ms);
            max = max.max(sample.duration_ms);
        }
        stats.mean_ms = total / self.samples.len() as f64;
        stats.min_ms = min;
        stats.max_ms = max;
        stats.last_ms = self.samples.back().map(|s| s.duration_ms).unwrap_or_default();
        stats
    }
}

#[derive(Debug)]
pub struct LuPerformanceTracker {
    capacity: usize,
    windows: RwLock<HashMap<String, Arc<Mutex<LuSampleWindow>>>>,
}

impl LuPerformanceTracker {
    /// A tracker keeping `capacity` samples per plugin (at least one).
    pub fn new(capacity: usize) -> Self {
        LuPerformanceTracker {
            capacity: capacity.max(1),
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn window(&self, plugin: &str) -> Arc<Mutex<LuSampleWindow>> {
        if let Some(window) = self.windows.read().get(plugin) {
            return window.clone();
        }
        self.windows
            .write()
            .entry(plugin.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(LuSampleWindow::new(self.capacity))))
            .clone()
    }

    pub fn record(&self, plugin: &str, frame_sequence: u64, duration_ms: f64) {
        let window = self.window(plugin);
        window.lock().push(LuPerformanceSample {
            plugin: plugin.to_string(),
            frame_sequence,
            duration_ms,
        });
    }

    pub fn record_failure(&self, plugin: &str) {
        self.window(plugin).lock().failures += 1;
    }

    pub fn record_skip(&self, plugin: &str) {
        self.window(plugin).lock().skipped += 1;
    }

    /// Zeroed stats for plugins the tracker has never seen.
    pub fn stats_for(&self, plugin: &str) -> LuPluginStats {
        let window = self.windows.read().get(plugin).cloned();
        match window {
            Some(window) => window.lock().stats(),
            None => LuPluginStats::default(),
        }
    }

    pub fn stats_all(&self) -> HashMap<String, LuPluginStats> {
        let windows: Vec<(String, Arc<Mutex<LuSampleWindow>>)> = self
            .windows
            .read()
            .iter()
            .map(|(name, window)| (name.clone(), window.clone()))
            .collect();
        windows
            .into_iter()
            .map(|(name, window)| {
                let stats = window.lock().stats();
                (name, stats)
            })
            .collect()
    }

    /// Copy of the current window, oldest first.
    pub fn samples(&self, plugin: &str) -> Vec<LuPerformanceSample> {
        let window = self.windows.read().get(plugin).cloned();
        window
            .map(|w| w.lock().samples.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Drop everything recorded for `plugin`.
    pub fn forget(&self, plugin: &str) -> bool {
        self.windows.write().remove(plugin).is_some()
    }

    pub fn clear(&self) {
        self.windows.write().clear();
    }

    pub fn as_json(&self) -> Value {
        serde_json::to_value(self.stats_all()).unwrap_or(Value::Null)
    }
}

impl Default for LuPerformanceTracker {
    fn default() -> Self {
        LuPerformanceTracker::new(DEFAULT_STATS_WINDOW)
    }
}
