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

use std::collections::VecDeque;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::Result;
use crate::log::config::LuLogConfig;
use crate::log::core::{LuLogLevel, LuLogRecord};
use crate::log::formatters::{LuJsonFormatter, LuTextFormatter};

/// Destination for runtime log records.
///
/// Implementations must not block for long and must never panic; the runtime
/// emits from frame-processing tasks and ignores sink failures.
pub trait LuLogSink: Send + Sync {
    fn emit(&self, record: &LuLogRecord);
}

/// Forwards records to the `log` crate under the `lumen` target.
#[derive(Debug, Default)]
pub struct LuFacadeLogSink {
    json: bool,
}

impl LuFacadeLogSink {
    pub fn new() -> Self {
        LuFacadeLogSink { json: false }
    }

    pub fn json() -> Self {
        LuFacadeLogSink { json: true }
    }
}

impl LuLogSink for LuFacadeLogSink {
    fn emit(&self, record: &LuLogRecord) {
        let level = record.level.to_facade();
        if !log::log_enabled!(target: "lumen", level) {
            return;
        }
        let line = if self.json {
            LuJsonFormatter::format(record)
        } else {
            LuTextFormatter::format(record)
        };
        log::log!(target: "lumen", level, "{}", line);
    }
}

/// Retains the most recent records in memory.
#[derive(Debug)]
pub struct LuMemoryLogSink {
    config: LuLogConfig,
    buffer: Mutex<VecDeque<LuLogRecord>>,
}

impl LuMemoryLogSink {
    pub fn new(config: LuLogConfig) -> Self {
        let capacity = config.capacity;
        LuMemoryLogSink {
            config,
            buffer: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    pub fn records(&self) -> Vec<LuLogRecord> {
        self.buffer.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Records at or above `min_level` whose category starts with `category_prefix`.
    pub fn filter(&self, min_level: LuLogLevel, category_prefix: &str) -> Vec<LuLogRecord> {
        self.buffer
            .lock()
            .iter()
            .filter(|r| r.level >= min_level && r.category.starts_with(category_prefix))
            .cloned()
            .collect()
    }

    /// Records of one category that mention `plugin` in their fields.
    pub fn for_plugin(&self, category: &str, plugin: &str) -> Vec<LuLogRecord> {
        self.buffer
            .lock()
            .iter()
            .filter(|r| r.category == category && r.field_str("plugin") == Some(plugin))
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.buffer.lock().clear();
    }

    /// Append the retained records to `path` as JSON lines.
    pub fn export_jsonl(&self, path: &Path) -> Result<usize> {
        let records = self.records();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = BufWriter::new(file);
        for record in &records {
            writeln!(writer, "{}", LuJsonFormatter::format(record))?;
        }
        writer.flush()?;
        Ok(records.len())
    }
}

impl Default for LuMemoryLogSink {
    fn default() -> Self {
        LuMemoryLogSink::new(LuLogConfig::default())
    }
}

impl LuLogSink for LuMemoryLogSink {
    fn emit(&self, record: &LuLogRecord) {
        if self.config.capacity == 0 || !self.config.should_log(record) {
            return;
        }
        let mut buffer = self.buffer.lock();
        if buffer.len() == self.config.capacity {
            buffer.pop_front();
        }
        buffer.push_back(record.clone());
    }
}

/// Sends every record to each wrapped sink in order.
#[derive(Default)]
pub struct LuTeeLogSink {
    sinks: Vec<Arc<dyn LuLogSink>>,
}

impl LuTeeLogSink {
    pub fn new(sinks: Vec<Arc<dyn LuLogSink>>) -> Self {
        LuTeeLogSink { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn LuLogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl LuLogSink for LuTeeLogSink {
    fn emit(&self, record: &LuLogRecord) {
        for sink in &self.sinks {
            sink.emit(record);
        }
    }
}
