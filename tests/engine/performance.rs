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

use std::sync::Arc;
use std::thread;

use lumen::{LuPerformanceTracker, LuPluginStats};
use proptest::prelude::*;

#[test]
fn LuFTPerformanceWindowKeepsLastHundred() {
    let tracker = LuPerformanceTracker::default();
    for i in 0..150u64 {
        tracker.record("histogram", i + 1, i as f64);
    }

    let stats = tracker.stats_for("histogram");
    assert_eq!(stats.count, 100);
    assert_eq!(stats.min_ms, 50.0);
    assert_eq!(stats.max_ms, 149.0);
    assert_eq!(stats.last_ms, 149.0);
    assert!((stats.mean_ms - 99.5).abs() < 1e-9);

    let samples = tracker.samples("histogram");
    assert_eq!(samples.first().map(|s| s.frame_sequence), Some(51));
    assert_eq!(samples.last().map(|s| s.frame_sequence), Some(150));
}

#[test]
fn LuFTPerformanceForgetAndClear() {
    let tracker = LuPerformanceTracker::new(10);
    tracker.record("a", 1, 1.0);
    tracker.record("b", 1, 2.0);
    assert_eq!(tracker.stats_all().len(), 2);

    assert!(tracker.forget("a"));
    assert_eq!(tracker.stats_for("a"), LuPluginStats::default());
    assert_eq!(tracker.stats_all().len(), 1);

    tracker.clear();
    assert!(tracker.stats_all().is_empty());
    assert_eq!(tracker.as_json(), serde_json::json!({}));
}

#[test]
fn LuFTPerformanceConcurrentRecording() {
    let tracker = Arc::new(LuPerformanceTracker::new(1_000));
    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let tracker = tracker.clone();
            thread::spawn(move || {
                for seq in 0..50u64 {
                    tracker.record("shared", seq, 1.0);
                    tracker.record(&format!("own-{}", worker), seq, worker as f64);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker");
    }

    assert_eq!(tracker.stats_for("shared").count, 400);
    assert_eq!(tracker.stats_all().len(), 9);
    assert_eq!(tracker.stats_for("own-3").mean_ms, 3.0);
}

proptest! {
    #[test]
    fn LuFTPerformanceStatsMatchRecentWindow(
        capacity in 1usize..40,
        durations in proptest::collection::vec(0.0f64..500.0, 1..120),
    ) {
        let tracker = LuPerformanceTracker::new(capacity);
        for (seq, duration) in durations.iter().enumerate() {
            tracker.record("p", seq as u64, *duration);
        }

        let window = &durations[durations.len().saturating_sub(capacity)..];
        let stats = tracker.stats_for("p");
        let min = window.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = window.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let mean = window.iter().sum::<f64>() / window.len() as f64;

        prop_assert_eq!(stats.count, window.len());
        prop_assert_eq!(stats.min_ms, min);
        prop_assert_eq!(stats.max_ms, max);
        prop_assert!((stats.mean_ms - mean).abs() < 1e-6);
        prop_assert_eq!(stats.last_ms, *window.last().unwrap());
    }
}
