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

//! Plugin-scoped settings.
//!
//! The runtime never reads settings itself. It hands each plugin a
//! [`LuScopedSettings`] view at initialization so the plugin can persist its
//! own named string values through the application's store.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Application settings store, keyed by `(scope, key)`.
pub trait LuSettingsStore: Send + Sync {
    fn get(&self, scope: &str, key: &str) -> Option<String>;
    fn set(&self, scope: &str, key: &str, value: String);
    fn remove(&self, scope: &str, key: &str) -> Option<String>;
    fn keys(&self, scope: &str) -> Vec<String>;
}

/// Non-persistent store used by tests and embedders without persistence.
#[derive(Debug, Default)]
pub struct LuMemorySettings {
    inner: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl LuMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LuSettingsStore for LuMemorySettings {
    fn get(&self, scope: &str, key: &str) -> Option<String> {
        self.inner.read().get(scope).and_then(|m| m.get(key).cloned())
    }

    fn set(&self, scope: &str, key: &str, value: String) {
        self.inner
            .write()
            .entry(scope.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn remove(&self, scope: &str, key: &str) -> Option<String> {
        self.inner.write().get_mut(scope).and_then(|m| m.remove(key))
    }

    fn keys(&self, scope: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .inner
            .read()
            .get(scope)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        keys
    }
}

/// A store view restricted to one plugin's scope.
#[derive(Clone)]
pub struct LuScopedSettings {
    scope: String,
    store: Arc<dyn LuSettingsStore>,
}

impl LuScopedSettings {
    pub fn new(scope: impl Into<String>, store: Arc<dyn LuSettingsStore>) -> Self {
        LuScopedSettings {
            scope: scope.into(),
            store,
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(&self.scope, key)
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).as_deref() {
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            _ => default,
        }
    }

    pub fn get_f64(&self, key: &str, default: f64) -> f64 {
        self.get(key)
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(default)
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        self.store.set(&self.scope, key, value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.store.remove(&self.scope, key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.store.keys(&self.scope)
    }
}

impl fmt::Debug for LuScopedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuScopedSettings").field("scope", &self.scope).finish()
    }
}
