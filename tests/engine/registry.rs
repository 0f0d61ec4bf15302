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

mod support;

use std::sync::Arc;

use lumen::{
    LuEventLog, LuHook, LuLogConfig, LuMemoryLogSink, LuPerformanceTracker, LuPluginKind,
    LuPluginRegistry, LuPluginState, LuRegistryView,
};
use proptest::prelude::*;
use support::{LuTJournalNew, LuTProbe};

fn LuTRegistry() -> (LuPluginRegistry, Arc<LuPerformanceTracker>, Arc<LuMemoryLogSink>) {
    let tracker = Arc::new(LuPerformanceTracker::new(100));
    let sink = Arc::new(LuMemoryLogSink::new(LuLogConfig::default()));
    let registry = LuPluginRegistry::new(tracker.clone(), LuEventLog::new(sink.clone()), None);
    (registry, tracker, sink)
}

fn LuTPriorities(registry: &LuPluginRegistry, kind: LuPluginKind) -> Vec<i32> {
    registry
        .of_kind(kind, LuRegistryView::All)
        .iter()
        .map(|e| e.priority())
        .collect()
}

#[tokio::test]
async fn LuFTRegistryOrdersByPriority() {
    let (registry, _tracker, _sink) = LuTRegistry();
    for priority in [5, 1, 3] {
        let probe = LuTProbe::processing(&format!("p{}", priority)).priority(priority);
        registry.register(Arc::new(probe)).await.expect("register");
    }
    assert_eq!(LuTPriorities(&registry, LuPluginKind::Processing), vec![1, 3, 5]);

    registry
        .register(Arc::new(LuTProbe::processing("p2").priority(2)))
        .await
        .expect("register");
    assert_eq!(LuTPriorities(&registry, LuPluginKind::Processing), vec![1, 2, 3, 5]);
}

#[tokio::test]
async fn LuFTRegistrySequencesAreSeparatedByKind() {
    let (registry, _tracker, _sink) = LuTRegistry();
    registry
        .register(Arc::new(LuTProbe::control("zoom").priority(1)))
        .await
        .expect("register");
    registry
        .register(Arc::new(LuTProbe::interface("grid").priority(7)))
        .await
        .expect("register");
    registry
        .register(Arc::new(LuTProbe::processing("histogram").priority(9)))
        .await
        .expect("register");
    registry
        .register(Arc::new(LuTProbe::interface("level").priority(3)))
        .await
        .expect("register");

    let names: Vec<String> = registry
        .snapshot(LuRegistryView::All)
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    assert_eq!(names, vec!["histogram", "level", "grid", "zoom"]);
    assert_eq!(registry.count(LuPluginKind::Interface, LuRegistryView::All), 2);
    assert_eq!(registry.len(), 4);
}

#[tokio::test]
async fn LuFTRegistryReplaceTearsDownOnce() {
    let (registry, tracker, sink) = LuTRegistry();
    let journal = LuTJournalNew();
    let old = Arc::new(LuTProbe::processing("grid").priority(4).tag("v1").journal(&journal));
    let new = Arc::new(LuTProbe::interface("grid").priority(2).tag("v2").journal(&journal));

    registry.register(old.clone()).await.expect("register v1");
    tracker.record("grid", 1, 3.0);
    let entry = registry.register(new.clone()).await.expect("register v2");

    assert_eq!(old.count(LuHook::Teardown), 1);
    assert_eq!(new.count(LuHook::Teardown), 0);
    assert_eq!(tracker.stats_for("grid").count, 0);
    assert_eq!(registry.len(), 1);
    assert!(registry
        .of_kind(LuPluginKind::Processing, LuRegistryView::All)
        .is_empty());
    assert_eq!(entry.kind(), LuPluginKind::Interface);
    assert_eq!(entry.state(), LuPluginState::Registered);
    assert_eq!(sink.filter(lumen::LuLogLevel::Info, "registry.plugin_replaced").len(), 1);
    assert_eq!(*journal.lock(), vec!["v1:teardown".to_string()]);

    assert!(registry.unregister("grid").await);
    assert_eq!(new.count(LuHook::Teardown), 1);
    assert!(!registry.unregister("grid").await);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn LuFTRegistryTeardownFailuresAreLogged() {
    let (registry, _tracker, sink) = LuTRegistry();
    registry
        .register(Arc::new(LuTProbe::processing("cam").panicking(LuHook::Teardown)))
        .await
        .expect("register");

    assert!(registry.unregister("cam").await);
    let failures = sink.for_plugin("lifecycle.hook_failed", "cam");
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].field_str("hook"), Some("teardown"));
}

#[tokio::test]
async fn LuFTRegistryEnabledViewAndClear() {
    let (registry, _tracker, _sink) = LuTRegistry();
    registry
        .register(Arc::new(LuTProbe::processing("a").priority(1)))
        .await
        .expect("register");
    registry
        .register(Arc::new(LuTProbe::processing("b").priority(2).disabled()))
        .await
        .expect("register");

    let enabled: Vec<String> = registry
        .of_kind(LuPluginKind::Processing, LuRegistryView::Enabled)
        .iter()
        .map(|e| e.name().to_string())
        .collect();
    assert_eq!(enabled, vec!["a"]);

    assert!(registry.set_enabled("b", true));
    assert!(registry.set_enabled("a", false));
    let info = registry.infos();
    assert!(!info[0].enabled);
    assert!(info[1].enabled);

    let drained = registry.clear();
    assert_eq!(drained.len(), 2);
    assert!(registry.is_empty());
    assert!(registry.get("a").is_none());
}

proptest! {
    #[test]
    fn LuFTRegistrySequenceIsStablySorted(priorities in proptest::collection::vec(-5i32..5, 1..24)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let (registry, _tracker, _sink) = LuTRegistry();

        rt.block_on(async {
            for (index, priority) in priorities.iter().enumerate() {
                let probe = LuTProbe::processing(&format!("p{}", index)).priority(*priority);
                registry.register(Arc::new(probe)).await.expect("register");
            }
        });

        let mut expected: Vec<(i32, usize)> = priorities
            .iter()
            .enumerate()
            .map(|(index, priority)| (*priority, index))
            .collect();
        expected.sort();
        let expected: Vec<String> = expected.iter().map(|(_, index)| format!("p{}", index)).collect();

        let actual: Vec<String> = registry
            .of_kind(LuPluginKind::Processing, LuRegistryView::All)
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        prop_assert_eq!(actual, expected);
        prop_assert_eq!(registry.len(), priorities.len());
    }
}
