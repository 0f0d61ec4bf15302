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

use std::fmt;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::log::handlers::{LuFacadeLogSink, LuLogSink};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LuLogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LuLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LuLogLevel::Debug => "DEBUG",
            LuLogLevel::Info => "INFO",
            LuLogLevel::Warning => "WARNING",
            LuLogLevel::Error => "ERROR",
        }
    }

    /// Lenient parse used by configuration; unknown names fall back to INFO.
    pub fn parse(s: &str) -> LuLogLevel {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" | "TRACE" => LuLogLevel::Debug,
            "WARN" | "WARNING" => LuLogLevel::Warning,
            "ERROR" => LuLogLevel::Error,
            _ => LuLogLevel::Info,
        }
    }

    pub(crate) fn to_facade(self) -> log::Level {
        match self {
            LuLogLevel::Debug => log::Level::Debug,
            LuLogLevel::Info => log::Level::Info,
            LuLogLevel::Warning => log::Level::Warn,
            LuLogLevel::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for LuLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug)]
pub struct LuLogRecord {
    pub level: LuLogLevel,
    /// Dotted category, e.g. `dispatch.frame_failed`.
    pub category: String,
    pub message: String,
    pub fields: Map<String, Value>,
    pub timestamp: SystemTime,
}

impl LuLogRecord {
    pub fn new(
        level: LuLogLevel,
        category: impl Into<String>,
        message: impl Into<String>,
        fields: Map<String, Value>,
    ) -> Self {
        LuLogRecord {
            level,
            category: category.into(),
            message: message.into(),
            fields,
            timestamp: SystemTime::now(),
        }
    }

    /// Field lookup as a string, for callers filtering on e.g. `plugin`.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn to_json(&self) -> Value {
        let ts = self
            .timestamp
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let rfc3339 = chrono::DateTime::<chrono::Utc>::from(self.timestamp).to_rfc3339();

        let mut data = Map::new();
        data.insert("level".into(), json!(self.level.as_str()));
        data.insert("category".into(), json!(self.category));
        data.insert("message".into(), json!(self.message));
        data.insert("timestamp_ms".into(), json!(ts));
        data.insert("timestamp".into(), json!(rfc3339));
        data.insert("fields".into(), Value::Object(self.fields.clone()));
        Value::Object(data)
    }
}

/// Build a field map from `(key, value)` pairs.
pub fn fields<I, K>(pairs: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Cheap handle the runtime components share to emit records.
#[derive(Clone)]
pub struct LuEventLog {
    sink: Arc<dyn LuLogSink>,
}

impl LuEventLog {
    pub fn new(sink: Arc<dyn LuLogSink>) -> Self {
        LuEventLog { sink }
    }

    pub fn sink(&self) -> &Arc<dyn LuLogSink> {
        &self.sink
    }

    pub fn emit<I, K>(&self, level: LuLogLevel, category: &str, message: &str, pairs: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.sink
            .emit(&LuLogRecord::new(level, category, message, fields(pairs)));
    }

    pub fn debug<I, K>(&self, category: &str, message: &str, pairs: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.emit(LuLogLevel::Debug, category, message, pairs);
    }

    pub fn info<I, K>(&self, category: &str, message: &str, pairs: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.emit(LuLogLevel::Info, category, message, pairs);
    }

    pub fn warn<I, K>(&self, category: &str, message: &str, pairs: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.emit(LuLogLevel::Warning, category, message, pairs);
    }

    pub fn error<I, K>(&self, category: &str, message: &str, pairs: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        self.emit(LuLogLevel::Error, category, message, pairs);
    }
}

impl Default for LuEventLog {
    fn default() -> Self {
        LuEventLog::new(Arc::new(LuFacadeLogSink::new()))
    }
}

impl fmt::Debug for LuEventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuEventLog").finish_non_exhaustive()
    }
}
