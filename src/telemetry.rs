//! Advisory stage telemetry
//!
//! Tracks how far the data clock drifts from the wall clock. The first
//! accepted item fixes `initial_offset_ms`; every later item overwrites
//! `data_vs_system_time_ms` with the drift relative to that offset.
//!
//! Values are plain overwrite counters: readers on other threads use a
//! relaxed load and may see a slightly stale value.

use crate::types::{Timestamp, TICKS_PER_MS};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

/// Wall-clock source returning Unix milliseconds
pub type ClockFn = Box<dyn Fn() -> i64 + Send + Sync>;

pub struct StageTelemetry {
    initial_offset_ms: AtomicI64,
    data_vs_system_time_ms: AtomicU64,
    items_seen: AtomicU64,
    started: AtomicBool,
    now_fn: ClockFn,
}

impl std::fmt::Debug for StageTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StageTelemetry")
            .field("initial_offset_ms", &self.initial_offset_ms())
            .field("data_vs_system_time_ms", &self.data_vs_system_time_ms())
            .field("items_seen", &self.items_seen())
            .finish()
    }
}

impl Default for StageTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTelemetry {
    pub fn new() -> Self {
        Self::new_with_clock(Box::new(|| chrono::Utc::now().timestamp_millis()))
    }

    /// Create telemetry with a custom wall clock
    ///
    /// # Arguments
    /// * `now_fn` - Function returning Unix milliseconds (for testing)
    pub fn new_with_clock(now_fn: ClockFn) -> Self {
        Self {
            initial_offset_ms: AtomicI64::new(0),
            data_vs_system_time_ms: AtomicU64::new(0),
            items_seen: AtomicU64::new(0),
            started: AtomicBool::new(false),
            now_fn,
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Record one accepted item with data time `time_start` (ticks)
    pub fn record(&self, time_start: Timestamp) {
        let system_ms = (self.now_fn)();
        let data_ms = i64::try_from(time_start / TICKS_PER_MS).unwrap_or(i64::MAX);

        if !self.started.swap(true, Ordering::Relaxed) {
            self.initial_offset_ms
                .store(system_ms.saturating_sub(data_ms), Ordering::Relaxed);
        }

        let offset = self.initial_offset_ms.load(Ordering::Relaxed);
        let drift = system_ms.saturating_sub(data_ms).saturating_sub(offset);
        self.data_vs_system_time_ms
            .store(drift.unsigned_abs(), Ordering::Relaxed);
        self.items_seen.fetch_add(1, Ordering::Relaxed);
    }

    /// Wall clock minus data clock at the first accepted item
    pub fn initial_offset_ms(&self) -> i64 {
        self.initial_offset_ms.load(Ordering::Relaxed)
    }

    /// Drift of the latest item from the initial offset
    pub fn data_vs_system_time_ms(&self) -> u64 {
        self.data_vs_system_time_ms.load(Ordering::Relaxed)
    }

    pub fn items_seen(&self) -> u64 {
        self.items_seen.load(Ordering::Relaxed)
    }
}
