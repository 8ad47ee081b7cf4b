//! Per-run workload metrics.
//!
//! Tracks the pulse periods the scheduler armed, how often it polled, and
//! how many progress marks it emitted. Updates are allocation-free so they
//! can sit inside the polling loop.

use serde::Serialize;

/// Counters and period statistics for one workload run.
#[derive(Debug, Clone)]
pub struct WorkloadMetrics {
    /// Number of times a period was armed (initial arm plus every step).
    armed_count: u64,
    /// Number of step advances.
    step_count: u64,
    /// Number of polling loop iterations.
    poll_count: u64,
    /// Number of progress marks emitted.
    progress_marks: u64,
    /// Minimum armed period in microseconds.
    min_period_us: u32,
    /// Maximum armed period in microseconds.
    max_period_us: u32,
    /// Sum of armed periods for mean calculation.
    sum_period_us: u64,
    /// Most recently armed period.
    last_period_us: u32,
}

impl Default for WorkloadMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkloadMetrics {
    /// Create an empty metrics collector.
    #[must_use]
    pub fn new() -> Self {
        Self {
            armed_count: 0,
            step_count: 0,
            poll_count: 0,
            progress_marks: 0,
            min_period_us: u32::MAX,
            max_period_us: 0,
            sum_period_us: 0,
            last_period_us: 0,
        }
    }

    /// Record a period being armed on the pulse output.
    pub fn record_armed(&mut self, period_us: u32) {
        self.armed_count += 1;
        self.min_period_us = self.min_period_us.min(period_us);
        self.max_period_us = self.max_period_us.max(period_us);
        self.sum_period_us = self.sum_period_us.wrapping_add(u64::from(period_us));
        self.last_period_us = period_us;
    }

    /// Record a step advance that re-armed `period_us`.
    pub fn record_step(&mut self, period_us: u32) {
        self.step_count += 1;
        self.record_armed(period_us);
    }

    /// Record one polling loop iteration.
    #[inline]
    pub fn record_poll(&mut self) {
        self.poll_count += 1;
    }

    /// Record one emitted progress mark.
    pub fn record_progress_mark(&mut self) {
        self.progress_marks += 1;
    }

    /// Get number of step advances.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Get number of polling iterations.
    #[must_use]
    pub fn poll_count(&self) -> u64 {
        self.poll_count
    }

    /// Get number of progress marks.
    #[must_use]
    pub fn progress_marks(&self) -> u64 {
        self.progress_marks
    }

    /// Get minimum armed period.
    #[must_use]
    pub fn min_period_us(&self) -> Option<u32> {
        (self.armed_count > 0).then_some(self.min_period_us)
    }

    /// Get maximum armed period.
    #[must_use]
    pub fn max_period_us(&self) -> Option<u32> {
        (self.armed_count > 0).then_some(self.max_period_us)
    }

    /// Get mean armed period.
    #[must_use]
    pub fn mean_period_us(&self) -> Option<u64> {
        (self.armed_count > 0).then(|| self.sum_period_us / self.armed_count)
    }

    /// Get a snapshot of current metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            steps: self.step_count,
            polls: self.poll_count,
            progress_marks: self.progress_marks,
            min_period_us: self.min_period_us(),
            max_period_us: self.max_period_us(),
            mean_period_us: self.mean_period_us(),
            last_period_us: (self.armed_count > 0).then_some(self.last_period_us),
        }
    }

    /// Reset all metrics to initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Immutable snapshot of metrics for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Step advances.
    pub steps: u64,
    /// Polling iterations.
    pub polls: u64,
    /// Progress marks emitted.
    pub progress_marks: u64,
    /// Minimum armed period in microseconds.
    pub min_period_us: Option<u32>,
    /// Maximum armed period in microseconds.
    pub max_period_us: Option<u32>,
    /// Mean armed period in microseconds.
    pub mean_period_us: Option<u64>,
    /// Last armed period in microseconds.
    pub last_period_us: Option<u32>,
}
