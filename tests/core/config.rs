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

use std::time::Duration;

use lumen::config::{DEFAULT_FRAME_BUDGET_MS, DEFAULT_SHUTDOWN_GRACE_MS, DEFAULT_STATS_WINDOW};
use lumen::{LuDispatchMode, LuError, LuRuntimeConfig};
use serde_json::json;

#[test]
fn LuFTConfigDefaults() {
    let config = LuRuntimeConfig::default();
    assert_eq!(config.dispatch_mode, LuDispatchMode::BoundedParallel);
    assert_eq!(config.max_workers, num_cpus::get().max(1));
    assert_eq!(config.frame_budget_ms, DEFAULT_FRAME_BUDGET_MS);
    assert_eq!(config.stats_window, DEFAULT_STATS_WINDOW);
    assert_eq!(config.shutdown_grace(), Duration::from_millis(DEFAULT_SHUTDOWN_GRACE_MS));
    assert_eq!(config.hook_timeout(), None);
}

#[test]
fn LuFTConfigFromJsonPartial() {
    let config = LuRuntimeConfig::from_json(&json!({
        "dispatch_mode": "sequential",
        "max_workers": 2,
        "hook_timeout_ms": 250
    }))
    .expect("config");

    assert_eq!(config.dispatch_mode, LuDispatchMode::Sequential);
    assert_eq!(config.max_workers, 2);
    assert_eq!(config.hook_timeout(), Some(Duration::from_millis(250)));
    assert_eq!(config.stats_window, DEFAULT_STATS_WINDOW);
}

#[test]
fn LuFTConfigFromJsonRejectsBadInput() {
    let err = LuRuntimeConfig::from_json(&json!({"dispatch_mode": "round_robin"})).unwrap_err();
    assert!(matches!(err, LuError::Serde(_)));

    let err = LuRuntimeConfig::from_json(&json!({"stats_window": 0})).unwrap_err();
    assert!(matches!(err, LuError::Config { .. }));

    let err = LuRuntimeConfig::from_json(&json!({"hook_timeout_ms": 0})).unwrap_err();
    assert!(matches!(err, LuError::Config { .. }));
}

#[cfg(feature = "yaml")]
#[test]
fn LuFTConfigFromYaml() {
    let document = "\
dispatch_mode: bounded_parallel
max_workers: 3
frame_budget_ms: 16
shutdown_grace_ms: 500
";
    let config = LuRuntimeConfig::from_yaml_str(document).expect("yaml config");
    assert_eq!(config.max_workers, 3);
    assert_eq!(config.frame_budget(), Duration::from_millis(16));
    assert_eq!(config.shutdown_grace(), Duration::from_millis(500));
    assert_eq!(config.hook_timeout_ms, None);

    let err = LuRuntimeConfig::from_yaml_str("max_workers: [1, 2]").unwrap_err();
    assert!(matches!(err, LuError::Serde(_)));
}

#[test]
fn LuFTConfigFluentSettersValidate() {
    let config = LuRuntimeConfig::new()
        .dispatch_mode(LuDispatchMode::Sequential)
        .max_workers(1)
        .frame_budget_ms(20)
        .stats_window(10)
        .shutdown_grace_ms(50)
        .hook_timeout_ms(Some(10));
    assert!(config.validate().is_ok());

    let roundtrip: LuRuntimeConfig =
        serde_json::from_value(serde_json::to_value(&config).expect("encode")).expect("decode");
    assert_eq!(roundtrip, config);

    assert!(LuRuntimeConfig::new().frame_budget_ms(0).validate().is_err());
}
