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

#![allow(non_snake_case)]

use std::fs;
use std::sync::Arc;

use lumen::log::{LuJsonFormatter, LuTextFormatter};
use lumen::{
    LuEventLog, LuFacadeLogSink, LuLogConfig, LuLogLevel, LuLogSink, LuMemoryLogSink,
    LuTeeLogSink,
};
use serde_json::{json, Value};
use tempfile::tempdir;

fn LuTLog() -> (LuEventLog, Arc<LuMemoryLogSink>) {
    let sink = Arc::new(LuMemoryLogSink::new(LuLogConfig::default()));
    (LuEventLog::new(sink.clone()), sink)
}

#[test]
fn LuFTLogFilterByLevelAndCategory() {
    let (log, sink) = LuTLog();
    log.debug("dispatch.frame_skipped", "busy", [("plugin", json!("a"))]);
    log.warn("performance.slow_frame", "slow", [("frame", json!(3))]);
    log.error("dispatch.frame_failed", "failed", [("plugin", json!("b"))]);

    assert_eq!(sink.len(), 3);
    assert_eq!(sink.filter(LuLogLevel::Warning, "").len(), 2);
    assert_eq!(sink.filter(LuLogLevel::Debug, "dispatch.").len(), 2);
    assert_eq!(sink.for_plugin("dispatch.frame_failed", "b").len(), 1);

    sink.clear();
    assert!(sink.is_empty());
}

#[test]
fn LuFTLogMemorySinkHonoursConfig() {
    let sink = Arc::new(LuMemoryLogSink::new(
        LuLogConfig::new()
            .min_level(LuLogLevel::Info)
            .mute("dispatch.frame_skipped"),
    ));
    let log = LuEventLog::new(sink.clone());

    log.debug("runtime.created", "ignored", [("a", json!(1))]);
    log.info("dispatch.frame_skipped", "muted", [("a", json!(1))]);
    log.info("registry.plugin_registered", "kept", [("plugin", json!("grid"))]);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].category, "registry.plugin_registered");
}

#[test]
fn LuFTLogExportJsonLines() {
    let (log, sink) = LuTLog();
    log.info("runtime.initialized", "ready", [("plugins", json!(2))]);
    log.error(
        "lifecycle.hook_failed",
        "plugin hook failed",
        [("plugin", json!("level")), ("hook", json!("teardown"))],
    );

    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("runtime.jsonl");
    let written = sink.export_jsonl(&path).expect("export");
    assert_eq!(written, 2);

    let contents = fs::read_to_string(&path).expect("read back");
    let lines: Vec<Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["category"], "runtime.initialized");
    assert_eq!(lines[1]["level"], "ERROR");
    assert_eq!(lines[1]["fields"]["hook"], "teardown");

    // exports append
    sink.export_jsonl(&path).expect("export again");
    assert_eq!(fs::read_to_string(&path).expect("read").lines().count(), 4);
}

#[test]
fn LuFTLogFormattersAndFacade() {
    let (log, sink) = LuTLog();
    log.warn(
        "performance.slow_frame",
        "frame dispatch exceeded its budget",
        [("frame", json!(9)), ("budget_ms", json!(33))],
    );
    let records = sink.records();
    let record = &records[0];

    let text = LuTextFormatter::format(record);
    assert!(text.starts_with("performance.slow_frame: frame dispatch exceeded its budget - "));
    assert!(text.contains("frame=9"));

    let parsed: Value = serde_json::from_str(&LuJsonFormatter::format(record)).expect("json");
    assert_eq!(parsed["fields"]["budget_ms"], 33);

    // without a logger installed the facade sink is a silent no-op
    let sinks: Vec<Arc<dyn LuLogSink>> = vec![Arc::new(LuFacadeLogSink::json()), sink.clone()];
    let tee = LuTeeLogSink::new(sinks);
    tee.emit(record);
    assert_eq!(sink.len(), 2);
}
