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

//! # Frame Dispatcher
//!
//! Delivers each ingested frame to the enabled Processing plugins without
//! blocking the caller.
//!
//! ## Scheduling
//!
//! - Every plugin has a single-flight token. A plugin still working on an
//!   earlier frame is skipped for the new one (`dispatch.frame_skipped`).
//! - [`LuDispatchMode::BoundedParallel`] spawns one task per plugin; a
//!   semaphore caps how many run at once.
//! - [`LuDispatchMode::Sequential`] spawns one task per frame that visits the
//!   claimed plugins in priority order.
//!
//! Every task races the shutdown signal and is counted while alive, so
//! shutdown can cancel outstanding work and wait for it to drain. Entries
//! retired from the registry are never started, and a result that arrives
//! after retirement is discarded rather than recorded.

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify, Semaphore};

use crate::config::{LuDispatchMode, LuRuntimeConfig};
use crate::engine::isolation;
use crate::engine::performance::LuPerformanceTracker;
use crate::engine::registry::{LuFlightGuard, LuPluginEntry, LuPluginState};
use crate::frame::LuFrame;
use crate::log::LuEventLog;
use crate::plugin::{LuHook, LuPluginCapability, LuPluginKind};

/// What `dispatch` did with one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LuDispatchReport {
    pub sequence: u64,
    /// Plugins that claimed the frame.
    pub submitted: usize,
    /// Plugins skipped because they were still busy.
    pub skipped: usize,
}

/// Live task counter with a wake-up when it reaches zero.
#[derive(Debug, Default)]
struct LuInFlight {
    count: AtomicUsize,
    drained: Notify,
}

impl LuInFlight {
    fn enter(self: &Arc<Self>) -> LuInFlightGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        LuInFlightGuard(Arc::clone(self))
    }

    fn current(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    async fn idle(&self) {
        loop {
            let notified = self.drained.notified();
            if self.current() == 0 {
                return;
            }
            notified.await;
        }
    }
}

struct LuInFlightGuard(Arc<LuInFlight>);

impl Drop for LuInFlightGuard {
    fn drop(&mut self) {
        if self.0.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.drained.notify_waiters();
        }
    }
}

/// State shared with spawned frame tasks.
struct LuFrameWork {
    tracker: Arc<LuPerformanceTracker>,
    log: LuEventLog,
    permits: Arc<Semaphore>,
}

impl LuFrameWork {
    async fn process(&self, entry: &LuPluginEntry, frame: &LuFrame) {
        if entry.is_retired() {
            return;
        }
        let capability = isolation::call_sync(entry.name(), LuHook::Describe, move || {
            match entry.plugin().capability() {
                LuPluginCapability::Processing(processor) => Some(processor),
                _ => None,
            }
        });
        let processor = match capability {
            Ok(Some(processor)) => processor,
            Ok(None) => return,
            Err(err) => {
                self.tracker.record_failure(entry.name());
                isolation::report(&self.log, "dispatch.frame_failed", LuHook::Describe, &err);
                return;
            }
        };

        let started = Instant::now();
        let result = isolation::invoke(
            entry.name().to_string(),
            LuHook::ProcessFrame,
            None,
            processor.process_frame(frame),
        )
        .await;
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        if entry.is_retired() {
            self.log.debug(
                "dispatch.result_discarded",
                "plugin left the registry while processing",
                [("plugin", json!(entry.name())), ("frame", json!(frame.sequence()))],
            );
            return;
        }
        self.tracker.record(entry.name(), frame.sequence(), duration_ms);

        match result {
            Ok(()) => self.log.debug(
                "dispatch.frame_processed",
                "frame processed",
                [
                    ("plugin", json!(entry.name())),
                    ("frame", json!(frame.sequence())),
                    ("duration_ms", json!(duration_ms)),
                ],
            ),
            Err(err) => {
                self.tracker.record_failure(entry.name());
                isolation::report(&self.log, "dispatch.frame_failed", LuHook::ProcessFrame, &err);
            }
        }
    }

    async fn run_one(self: Arc<Self>, guard: LuFlightGuard, frame: LuFrame) {
        let Ok(_permit) = self.permits.clone().acquire_owned().await else {
            return;
        };
        self.process(guard.entry(), &frame).await;
    }

    async fn run_sequence(self: Arc<Self>, guards: Vec<LuFlightGuard>, frame: LuFrame) {
        let Ok(_permit) = self.permits.clone().acquire_owned().await else {
            return;
        };
        for guard in guards {
            if guard.entry().is_enabled() {
                self.process(guard.entry(), &frame).await;
            }
        }
    }
}

pub struct LuFrameDispatcher {
    handle: Handle,
    mode: LuDispatchMode,
    frame_budget: Duration,
    frames: AtomicU64,
    work: Arc<LuFrameWork>,
    in_flight: Arc<LuInFlight>,
    shutdown: watch::Sender<u64>,
}

impl LuFrameDispatcher {
    pub fn new(
        handle: Handle,
        config: &LuRuntimeConfig,
        tracker: Arc<LuPerformanceTracker>,
        log: LuEventLog,
    ) -> Self {
        let (shutdown, _) = watch::channel(0u64);
        LuFrameDispatcher {
            handle,
            mode: config.dispatch_mode,
            frame_budget: config.frame_budget(),
            frames: AtomicU64::new(0),
            work: Arc::new(LuFrameWork {
                tracker,
                log,
                permits: Arc::new(Semaphore::new(config.max_workers.max(1))),
            }),
            in_flight: Arc::new(LuInFlight::default()),
            shutdown,
        }
    }

    pub fn mode(&self) -> LuDispatchMode {
        self.mode
    }

    /// Stamp `frame` with the next sequence number and hand it to every
    /// eligible plugin in `plugins`. Returns once the work is submitted.
    /// A frame with no eligible plugin is dropped unnumbered.
    pub fn dispatch(&self, mut frame: LuFrame, plugins: Vec<Arc<LuPluginEntry>>) -> LuDispatchReport {
        let started = Instant::now();
        let eligible: Vec<Arc<LuPluginEntry>> = plugins
            .into_iter()
            .filter(|entry| {
                entry.kind() == LuPluginKind::Processing
                    && entry.is_enabled()
                    && !entry.is_retired()
                    && entry.state() != LuPluginState::Registered
            })
            .collect();
        if eligible.is_empty() {
            return LuDispatchReport::default();
        }

        let sequence = self.frames.fetch_add(1, Ordering::AcqRel) + 1;
        frame.stamp(sequence);

        let mut claimed = Vec::with_capacity(eligible.len());
        let mut skipped = 0usize;
        for entry in eligible {
            match entry.try_claim() {
                Some(guard) => claimed.push(guard),
                None => {
                    skipped += 1;
                    self.work.tracker.record_skip(entry.name());
                    self.work.log.debug(
                        "dispatch.frame_skipped",
                        "plugin still busy with an earlier frame",
                        [("plugin", json!(entry.name())), ("frame", json!(sequence))],
                    );
                }
            }
        }

        let submitted = claimed.len();
        match self.mode {
            LuDispatchMode::BoundedParallel => {
                for guard in claimed {
                    self.submit(self.work.clone().run_one(guard, frame.clone()));
                }
            }
            LuDispatchMode::Sequential => {
                if !claimed.is_empty() {
                    self.submit(self.work.clone().run_sequence(claimed, frame));
                }
            }
        }

        let elapsed = started.elapsed();
        if elapsed > self.frame_budget {
            self.work.log.warn(
                "performance.slow_frame",
                "frame dispatch exceeded its budget",
                [
                    ("frame", json!(sequence)),
                    ("elapsed_ms", json!(elapsed.as_secs_f64() * 1000.0)),
                    ("budget_ms", json!(self.frame_budget.as_millis() as u64)),
                ],
            );
        }

        LuDispatchReport {
            sequence,
            submitted,
            skipped,
        }
    }

    fn submit<F>(&self, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tracked = self.in_flight.enter();
        let mut shutdown = self.shutdown.subscribe();
        let log = self.work.log.clone();
        self.handle.spawn(async move {
            let _tracked = tracked;
            tokio::select! {
                _ = work => {}
                _ = shutdown.changed() => {
                    log.debug(
                        "dispatch.task_cancelled",
                        "frame task cancelled by shutdown",
                        [("reason", json!("shutdown"))],
                    );
                }
            }
        });
    }

    /// Signal every outstanding frame task to stop.
    pub fn cancel_outstanding(&self) {
        self.shutdown.send_modify(|epoch| *epoch += 1);
    }

    /// Wait up to `grace` for frame tasks to finish. `false` if some are
    /// still running when the grace period ends.
    pub async fn wait_idle(&self, grace: Duration) -> bool {
        tokio::time::timeout(grace, self.in_flight.idle()).await.is_ok()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.current()
    }

    /// Frames dispatched since construction or the last reset.
    pub fn frames_dispatched(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.frames.store(0, Ordering::Release);
    }
}

impl std::fmt::Debug for LuFrameDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LuFrameDispatcher")
            .field("mode", &self.mode)
            .field("frames", &self.frames_dispatched())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
