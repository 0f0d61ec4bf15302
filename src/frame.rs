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

//! Frame and device handles passed through the runtime.
//!
//! Neither type is interpreted by the runtime: a [`LuFrame`] is handed to
//! Processing plugins as-is (only its sequence number is stamped on
//! ingestion), and a [`LuDeviceHandle`] is forwarded to lifecycle hooks.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LuPixelFormat {
    Yuv420,
    Nv21,
    Rgba8888,
    Jpeg,
    Raw,
}

/// One captured frame. Cloning shares the pixel buffer.
#[derive(Clone)]
pub struct LuFrame {
    sequence: u64,
    pub width: u32,
    pub height: u32,
    pub format: LuPixelFormat,
    pub timestamp: SystemTime,
    data: Arc<[u8]>,
}

impl LuFrame {
    pub fn new(width: u32, height: u32, format: LuPixelFormat, data: impl Into<Arc<[u8]>>) -> Self {
        LuFrame {
            sequence: 0,
            width,
            height,
            format,
            timestamp: SystemTime::now(),
            data: data.into(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: SystemTime) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sequence number assigned at ingestion; 0 until then.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub(crate) fn stamp(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for LuFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuFrame")
            .field("sequence", &self.sequence)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Opaque reference to a device session owned by the capture collaborator.
#[derive(Clone)]
pub struct LuDeviceHandle {
    id: String,
    session: Arc<dyn Any + Send + Sync>,
}

impl LuDeviceHandle {
    pub fn new<T: Any + Send + Sync>(id: impl Into<String>, session: T) -> Self {
        LuDeviceHandle {
            id: id.into(),
            session: Arc::new(session),
        }
    }

    /// A handle with no session payload, for collaborators that only need an id.
    pub fn detached(id: impl Into<String>) -> Self {
        LuDeviceHandle::new(id, ())
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Plugins that know the collaborator's session type may borrow it.
    pub fn session<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.session.downcast_ref::<T>()
    }
}

impl fmt::Debug for LuDeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LuDeviceHandle").field("id", &self.id).finish_non_exhaustive()
    }
}

impl PartialEq for LuDeviceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.session, &other.session)
    }
}
