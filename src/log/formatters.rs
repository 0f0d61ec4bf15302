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

use serde_json::Value;

use crate::log::core::LuLogRecord;

pub struct LuJsonFormatter;

impl LuJsonFormatter {
    pub fn format(record: &LuLogRecord) -> String {
        record.to_json().to_string()
    }
}

/// `category: message - key=value, key=value`
pub struct LuTextFormatter;

impl LuTextFormatter {
    pub fn format(record: &LuLogRecord) -> String {
        if record.fields.is_empty() {
            return format!("{}: {}", record.category, record.message);
        }
        let pairs = record
            .fields
            .iter()
            .map(|(k, v)| match v {
                // Bare strings read better than quoted JSON in text logs.
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {} - {}", record.category, record.message, pairs)
    }
}
