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

pub mod dispatcher;
pub(crate) mod isolation;
pub mod lifecycle;
pub mod performance;
pub mod registry;
pub mod runtime;

pub use dispatcher::{LuDispatchReport, LuFrameDispatcher};
pub use lifecycle::{LuLifecycleCoordinator, LuPassReport};
pub use performance::{LuPerformanceSample, LuPerformanceTracker, LuPluginStats};
pub use registry::{LuPluginEntry, LuPluginInfo, LuPluginRegistry, LuPluginState, LuRegistryView};
pub use runtime::{LuRuntime, LuRuntimeBuilder, LuRuntimeContext, LuRuntimeStatus};
