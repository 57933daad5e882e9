// Time helpers - stopwatches driven by event timestamps

use std::time::{Duration, Instant};

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Measures the span between two instants supplied by the caller.
///
/// Events are stamped when the reader parses them, so timing follows the
/// report being written rather than the moment the events are applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
    stopped: Option<Instant>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) at `at`
    pub fn start(&mut self, at: Instant) {
        self.started = Some(at);
        self.stopped = None;
    }

    /// Stop at `at`, returning the measured span
    pub fn stop(&mut self, at: Instant) -> Duration {
        if self.started.is_some() && self.stopped.is_none() {
            self.stopped = Some(at);
        }
        self.elapsed_at(at)
    }

    pub fn is_running(&self) -> bool {
        self.started.is_some() && self.stopped.is_none()
    }

    /// Span so far; frozen once stopped
    pub fn elapsed(&self) -> Duration {
        self.elapsed_at(Instant::now())
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        match (self.started, self.stopped) {
            (Some(start), Some(stop)) => stop.saturating_duration_since(start),
            (Some(start), None) => now.saturating_duration_since(start),
            (None, _) => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unstarted_is_zero() {
        assert_eq!(Stopwatch::new().elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_stop_freezes_elapsed() {
        let base = Instant::now();
        let mut watch = Stopwatch::new();
        watch.start(base);
        let measured = watch.stop(base + Duration::from_millis(250));
        assert_eq!(measured, Duration::from_millis(250));
        assert_eq!(watch.elapsed(), Duration::from_millis(250));
        assert!(!watch.is_running());
    }

    #[test]
    fn test_second_stop_keeps_first_span() {
        let base = Instant::now();
        let mut watch = Stopwatch::new();
        watch.start(base);
        watch.stop(base + Duration::from_millis(10));
        watch.stop(base + Duration::from_millis(99));
        assert_eq!(watch.elapsed(), Duration::from_millis(10));
    }
}
