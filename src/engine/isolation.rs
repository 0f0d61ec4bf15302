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

//! Boundary between the runtime and plugin-authored code.
//!
//! Every hook call goes through [`invoke`] (async hooks) or [`call_sync`]
//! (plain methods such as `controls()`). Errors, panics and timeouts come back
//! as `LuError::Hook*` values; nothing raised by a plugin unwinds into the
//! runtime.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

use futures::FutureExt;
use serde_json::json;

use crate::errors::{LuError, Result};
use crate::log::LuEventLog;
use crate::plugin::LuHook;

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Await a plugin hook, converting errors, panics and an exceeded `timeout`
/// into hook failures.
pub(crate) async fn invoke<F>(
    plugin: String,
    hook: LuHook,
    timeout: Option<Duration>,
    fut: F,
) -> Result<()>
where
    F: Future<Output = anyhow::Result<()>>,
{
    let guarded = AssertUnwindSafe(fut).catch_unwind();
    let outcome = match timeout {
        Some(limit) => match tokio::time::timeout(limit, guarded).await {
            Ok(outcome) => outcome,
            Err(_) => {
                return Err(LuError::HookTimeout {
                    plugin,
                    hook: hook.as_str().to_string(),
                    timeout_ms: limit.as_millis() as u64,
                })
            }
        },
        None => guarded.await,
    };

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(LuError::hook(plugin, hook.as_str(), format!("{:#}", err))),
        Err(payload) => Err(LuError::HookPanicked {
            plugin,
            hook: hook.as_str().to_string(),
            message: panic_message(payload.as_ref()),
        }),
    }
}

/// Run a synchronous plugin method, catching a panic.
pub(crate) fn call_sync<T>(plugin: &str, hook: LuHook, f: impl FnOnce() -> T) -> Result<T> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| LuError::HookPanicked {
        plugin: plugin.to_string(),
        hook: hook.as_str().to_string(),
        message: panic_message(payload.as_ref()),
    })
}

/// Log a hook failure under `category`.
pub(crate) fn report(log: &LuEventLog, category: &str, hook: LuHook, err: &LuError) {
    let outcome = match err {
        LuError::HookTimeout { .. } => "timeout",
        LuError::HookPanicked { .. } => "panic",
        _ => "error",
    };
    log.error(
        category,
        "plugin hook failed",
        [
            ("plugin", json!(err.plugin().unwrap_or_default())),
            ("hook", json!(hook.as_str())),
            ("outcome", json!(outcome)),
            ("error", json!(err.to_string())),
        ],
    );
}
