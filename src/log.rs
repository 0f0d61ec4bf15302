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

//! # Structured Logging
//!
//! The runtime reports everything it observes about plugins (hook failures,
//! skipped frames, slow frames, shutdown summaries) as structured records:
//! a level, a dotted category such as `lifecycle.hook_failed`, a message and
//! a map of key/value fields. Records are handed to an [`LuLogSink`], which
//! is treated as fire-and-forget.
//!
//! - [`LuFacadeLogSink`] forwards to the `log` crate (the default).
//! - [`LuMemoryLogSink`] keeps a bounded window for inspection and export.
//! - [`LuTeeLogSink`] fans a record out to several sinks.

pub mod config;
pub mod core;
pub mod formatters;
pub mod handlers;

pub use self::config::LuLogConfig;
pub use self::core::{fields, LuEventLog, LuLogLevel, LuLogRecord};
pub use self::formatters::{LuJsonFormatter, LuTextFormatter};
pub use self::handlers::{LuFacadeLogSink, LuLogSink, LuMemoryLogSink, LuTeeLogSink};
