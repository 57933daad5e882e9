// Run progress - planned/completed/failed counts and elapsed time

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::state::TestStatus;
use crate::time::Stopwatch;

/// Progress of one run
#[derive(Debug, Clone, Default)]
pub struct Progress {
    total: Option<usize>,
    completed: usize,
    failures: usize,
    errors: usize,
    suite_failures: usize,
    started_at: Option<DateTime<Utc>>,
    run: Stopwatch,
    case: Stopwatch,
}

/// Point-in-time copy of [`Progress`] for display and JSON output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub total: Option<usize>,
    pub completed: usize,
    pub failures: usize,
    pub errors: usize,
    /// Failures reported by suites outside any case
    pub suite_failures: usize,
    pub rate: f64,
    pub elapsed_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin timing the whole run
    pub fn start(&mut self, at: Instant) {
        self.started_at = Some(Utc::now());
        self.run.start(at);
    }

    /// Stop timing the whole run
    pub fn end(&mut self, at: Instant) {
        self.run.stop(at);
    }

    /// Set the plan size; only the first announcement counts
    pub fn initialize(&mut self, total: usize) {
        if self.total.is_none() {
            self.total = Some(total.max(self.completed));
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.total.is_some()
    }

    pub fn start_test_case(&mut self, at: Instant) {
        self.case.start(at);
    }

    /// Close the open case timer and return its span
    pub fn end_test_case(&mut self, at: Instant) -> Duration {
        if self.case.is_running() {
            self.case.stop(at)
        } else {
            Duration::ZERO
        }
    }

    /// Count a finished case
    pub fn mark_as_completed(&mut self, status: TestStatus) {
        self.completed += 1;
        match status {
            TestStatus::Failed => self.failures += 1,
            TestStatus::Errored => self.errors += 1,
            TestStatus::Pending | TestStatus::Passed => {}
        }
        // A runner that under-announced its plan still never reports >100%.
        if let Some(total) = self.total.as_mut() {
            *total = (*total).max(self.completed);
        }
    }

    pub fn total(&self) -> Option<usize> {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn failure_count(&self) -> usize {
        self.failures
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Suites that reported a failure of their own, e.g. a broken fixture
    pub fn suite_failure_count(&self) -> usize {
        self.suite_failures
    }

    /// Count a failure reported by a suite rather than a case.
    ///
    /// Kept apart from the case counts so that `failure_count() +
    /// error_count() <= completed()` holds however the report is shaped.
    pub fn mark_suite_failure(&mut self) {
        self.suite_failures += 1;
    }

    pub fn has_failures(&self) -> bool {
        self.failures + self.errors + self.suite_failures > 0
    }

    pub fn elapsed(&self) -> Duration {
        self.run.elapsed()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Percentage of the plan completed, 0 until initialized
    pub fn rate(&self) -> f64 {
        match self.total {
            Some(total) if total > 0 => (self.completed as f64 / total as f64) * 100.0,
            _ => 0.0,
        }
    }

    /// Mean run time per completed case
    pub fn average_time(&self) -> Duration {
        match u32::try_from(self.completed) {
            Ok(completed) if completed > 0 => self.elapsed() / completed,
            _ => Duration::ZERO,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            completed: self.completed,
            failures: self.failures,
            errors: self.errors,
            suite_failures: self.suite_failures,
            rate: self.rate(),
            elapsed_ms: self.elapsed().as_millis(),
            started_at: self.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uninitialized_progress() {
        let progress = Progress::new();
        assert!(!progress.is_initialized());
        assert_eq!(progress.total(), None);
        assert_eq!(progress.rate(), 0.0);
        assert!(!progress.has_failures());
    }

    #[test]
    fn test_initialize_is_set_once() {
        let mut progress = Progress::new();
        progress.initialize(4);
        progress.initialize(10);
        assert_eq!(progress.total(), Some(4));
    }

    #[test]
    fn test_counts_and_rate() {
        let mut progress = Progress::new();
        progress.initialize(4);
        progress.mark_as_completed(TestStatus::Passed);
        progress.mark_as_completed(TestStatus::Failed);
        progress.mark_as_completed(TestStatus::Errored);

        assert_eq!(progress.completed(), 3);
        assert_eq!(progress.failure_count(), 1);
        assert_eq!(progress.error_count(), 1);
        assert!(progress.has_failures());
        assert_eq!(progress.rate(), 75.0);
    }

    #[test]
    fn test_suite_failure_is_not_a_completed_case() {
        let mut progress = Progress::new();
        progress.initialize(1);
        progress.mark_suite_failure();

        assert!(progress.has_failures());
        assert_eq!(progress.suite_failure_count(), 1);
        assert_eq!(progress.completed(), 0);
        assert_eq!(progress.failure_count() + progress.error_count(), 0);
        assert_eq!(progress.snapshot().suite_failures, 1);
    }

    #[test]
    fn test_completed_never_exceeds_total() {
        let mut progress = Progress::new();
        progress.initialize(1);
        progress.mark_as_completed(TestStatus::Passed);
        progress.mark_as_completed(TestStatus::Passed);
        assert_eq!(progress.total(), Some(2));
        assert!(progress.completed() <= progress.total().unwrap_or(0));
    }

    #[test]
    fn test_case_timer_uses_event_instants() {
        let base = Instant::now();
        let mut progress = Progress::new();
        progress.start_test_case(base);
        let elapsed = progress.end_test_case(base + Duration::from_millis(40));
        assert_eq!(elapsed, Duration::from_millis(40));
        assert_eq!(progress.end_test_case(base + Duration::from_secs(5)), Duration::ZERO);
    }

    #[test]
    fn test_run_timer_frozen_after_end() {
        let base = Instant::now();
        let mut progress = Progress::new();
        progress.start(base);
        progress.end(base + Duration::from_secs(2));
        assert_eq!(progress.elapsed(), Duration::from_secs(2));
        assert!(progress.started_at().is_some());
    }
}
