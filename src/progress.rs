//! Shared progress counters for concurrent batch workers.
//!
//! Ownership model:
//! - One `ProgressTracker` is created per run before any worker starts and is
//!   passed to every worker by reference.
//! - Each counter sits behind its own lock; the leg and distance updates are
//!   independent of each other.
//! - Deciding whether to emit a notification reads both counters and updates
//!   `last_reported` inside one critical section, so two workers crossing the
//!   same boundary produce a single notification and reported percentages never
//!   go backwards.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::info;

use crate::constants::progress::{DEFAULT_STEP_PERCENT, NOTHING_REPORTED};
use crate::errors::TallyError;
use crate::utils::{percent_of, round_to_multiple};

/// One progress notification.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Processed legs as a percentage of all legs, rounded to the tracker step.
    pub percent_by_legs: u32,
    /// Processed distance as a percentage of the total distance (unrounded).
    pub percent_by_distance: f64,
    /// Legs processed when the event was produced.
    pub processed_legs: u64,
    /// Distance processed when the event was produced, in km.
    pub processed_distance: f64,
    /// `true` for the final flush, which is emitted even when the percentage did not change.
    pub forced: bool,
}

/// Receiver for progress notifications.
///
/// Called while the tracker holds its reporting lock, so events arrive in
/// order and implementations should return quickly.
pub trait ProgressSink: Send + Sync {
    /// Handle one notification.
    fn on_progress(&self, event: &ProgressEvent);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) + Send + Sync,
{
    fn on_progress(&self, event: &ProgressEvent) {
        self(event)
    }
}

/// Sink that forwards notifications to `tracing` at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_progress(&self, event: &ProgressEvent) {
        info!(
            percent_by_legs = event.percent_by_legs,
            percent_by_distance = event.percent_by_distance,
            processed_legs = event.processed_legs,
            forced = event.forced,
            "race progress"
        );
    }
}

/// Sink that keeps every notification in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingSink {
    /// Create an empty collecting sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of the notifications received so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        lock(&self.events).clone()
    }
}

impl ProgressSink for CollectingSink {
    fn on_progress(&self, event: &ProgressEvent) {
        lock(&self.events).push(event.clone());
    }
}

/// Concurrency-safe processed-leg and processed-distance counters.
pub struct ProgressTracker {
    total_legs: u64,
    total_distance: f64,
    step: u32,
    processed_legs: Mutex<u64>,
    processed_distance: Mutex<f64>,
    last_reported: Mutex<i64>,
    sink: Arc<dyn ProgressSink>,
}

impl ProgressTracker {
    /// Create a tracker that reports through `tracing`.
    ///
    /// Fails with `InvalidTotals` when either total is below 1.
    pub fn new(total_legs: u64, total_distance: f64) -> Result<Self, TallyError> {
        Self::with_sink(total_legs, total_distance, Arc::new(TracingSink))
    }

    /// Create a tracker that reports to `sink`.
    pub fn with_sink(
        total_legs: u64,
        total_distance: f64,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<Self, TallyError> {
        if total_legs < 1 || total_distance.is_nan() || total_distance < 1.0 {
            return Err(TallyError::InvalidTotals {
                total_legs,
                total_distance,
            });
        }
        Ok(Self {
            total_legs,
            total_distance,
            step: DEFAULT_STEP_PERCENT,
            processed_legs: Mutex::new(0),
            processed_distance: Mutex::new(0.0),
            last_reported: Mutex::new(NOTHING_REPORTED),
            sink,
        })
    }

    /// Override the rounding step used for leg percentages (clamped to at least 1).
    pub fn with_step(mut self, step: u32) -> Self {
        self.step = step.max(1);
        self
    }

    /// Add processed legs and distance, then emit a notification if the rounded
    /// leg percentage moved since the last one.
    ///
    /// Returns the emitted event, if any. A negative or NaN `distance` fails
    /// with `NegativeDelta` before any counter changes.
    pub fn advance(&self, legs: u64, distance: f64) -> Result<Option<ProgressEvent>, TallyError> {
        if distance.is_nan() || distance < 0.0 {
            return Err(TallyError::NegativeDelta { legs, distance });
        }
        *lock(&self.processed_legs) += legs;
        *lock(&self.processed_distance) += distance;
        Ok(self.report())
    }

    /// Emit a notification unconditionally; used once at the end of a run.
    pub fn flush(&self) -> ProgressEvent {
        let mut last = lock(&self.last_reported);
        let event = self.snapshot_event(true);
        *last = i64::from(event.percent_by_legs);
        self.sink.on_progress(&event);
        event
    }

    /// Legs processed so far.
    pub fn processed_legs(&self) -> u64 {
        *lock(&self.processed_legs)
    }

    /// Distance processed so far, in km.
    pub fn processed_distance(&self) -> f64 {
        *lock(&self.processed_distance)
    }

    /// Last reported leg percentage, or `None` before the first notification.
    pub fn last_reported(&self) -> Option<u32> {
        let last = *lock(&self.last_reported);
        u32::try_from(last).ok()
    }

    /// Total legs expected for the run.
    pub fn total_legs(&self) -> u64 {
        self.total_legs
    }

    /// Total distance expected for the run, in km.
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    fn report(&self) -> Option<ProgressEvent> {
        let mut last = lock(&self.last_reported);
        let event = self.snapshot_event(false);
        let percent = i64::from(event.percent_by_legs);
        if percent == *last {
            return None;
        }
        *last = percent;
        self.sink.on_progress(&event);
        Some(event)
    }

    /// Callers hold `last_reported` so reads are ordered with the reporting decision.
    fn snapshot_event(&self, forced: bool) -> ProgressEvent {
        let legs = *lock(&self.processed_legs);
        let distance = *lock(&self.processed_distance);
        let percent = round_to_multiple(percent_of(legs as f64, self.total_legs as f64), self.step);
        ProgressEvent {
            percent_by_legs: u32::try_from(percent.max(0)).unwrap_or(u32::MAX),
            percent_by_distance: percent_of(distance, self.total_distance),
            processed_legs: legs,
            processed_distance: distance,
            forced,
        }
    }
}

impl std::fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("total_legs", &self.total_legs)
            .field("total_distance", &self.total_distance)
            .field("step", &self.step)
            .field("processed_legs", &self.processed_legs())
            .field("processed_distance", &self.processed_distance())
            .field("last_reported", &self.last_reported())
            .finish()
    }
}

/// Counters stay meaningful after a panicking holder, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
