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

//! # Lumen Error Module
//!
//! This module defines the error types used by the Lumen runtime for
//! consistent error handling and reporting.
//!
//! ## Error Handling Philosophy
//!
//! Lumen separates two failure domains:
//!
//! - **Runtime API misuse**: invalid arguments, ingesting frames before the
//!   runtime is initialized, malformed configuration. These are returned to
//!   the caller as `LuError`.
//! - **Plugin hook failures**: anything raised by plugin-authored code. These
//!   are captured at the isolation boundary, logged with the plugin and hook
//!   name, and never cross into caller-visible errors. The `Hook*` variants
//!   exist so those failures can be described uniformly in logs and in the
//!   shutdown summary.
//!
//! ## Error Categories
//!
//! - **Validation**: Invalid arguments to the runtime API
//! - **NotInitialized**: Runtime used before `initialize`
//! - **Config**: Invalid runtime configuration
//! - **Hook / HookTimeout / HookPanicked**: Isolated plugin failures
//! - **Io / Serde**: Export and configuration loading failures
//! - **Internal**: Unexpected internal failures

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Convenience result type used throughout Lumen.
pub type Result<T> = std::result::Result<T, LuError>;

/// Canonical error enumeration for Lumen.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq)]
pub enum LuError {
    /// Invalid arguments passed to the runtime API.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The runtime was used before `initialize` was called.
    #[error("runtime not initialized: {operation} requires initialize() first")]
    NotInitialized { operation: String },

    /// Runtime configuration is malformed or out of range.
    #[error("config error: {message}")]
    Config { message: String },

    /// A plugin hook returned an error.
    #[error("plugin '{plugin}' failed in {hook}: {message}")]
    Hook {
        plugin: String,
        hook: String,
        message: String,
    },

    /// A plugin hook did not complete within its allotted time.
    #[error("plugin '{plugin}' timed out in {hook} after {timeout_ms} ms")]
    HookTimeout {
        plugin: String,
        hook: String,
        timeout_ms: u64,
    },

    /// A plugin hook panicked.
    #[error("plugin '{plugin}' panicked in {hook}: {message}")]
    HookPanicked {
        plugin: String,
        hook: String,
        message: String,
    },

    /// Errors originating from filesystem IO.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapper for serde-style serialization issues.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Catch-all variant for unexpected situations.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<io::Error> for LuError {
    fn from(err: io::Error) -> Self {
        LuError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LuError {
    fn from(err: serde_json::Error) -> Self {
        LuError::Serde(err.to_string())
    }
}

#[cfg(feature = "yaml")]
impl From<serde_yaml::Error> for LuError {
    fn from(err: serde_yaml::Error) -> Self {
        LuError::Serde(err.to_string())
    }
}

impl LuError {
    /// Helper to construct simple validation errors.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        LuError::Validation {
            message: message.into(),
        }
    }

    /// Helper to construct not-initialized errors for a named operation.
    pub fn not_initialized<T: Into<String>>(operation: T) -> Self {
        LuError::NotInitialized {
            operation: operation.into(),
        }
    }

    /// Helper to construct config errors.
    pub fn config<T: Into<String>>(message: T) -> Self {
        LuError::Config {
            message: message.into(),
        }
    }

    /// Helper to construct hook errors.
    pub fn hook(
        plugin: impl Into<String>,
        hook: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        LuError::Hook {
            plugin: plugin.into(),
            hook: hook.into(),
            message: message.into(),
        }
    }

    /// Helper to construct internal errors.
    pub fn internal<T: Into<String>>(message: T) -> Self {
        LuError::Internal(message.into())
    }

    /// Name of the plugin involved, for the hook failure variants.
    pub fn plugin(&self) -> Option<&str> {
        match self {
            LuError::Hook { plugin, .. }
            | LuError::HookTimeout { plugin, .. }
            | LuError::HookPanicked { plugin, .. } => Some(plugin),
            _ => None,
        }
    }

    /// True for failures raised inside plugin-authored code.
    pub fn is_hook_failure(&self) -> bool {
        self.plugin().is_some()
    }
}
