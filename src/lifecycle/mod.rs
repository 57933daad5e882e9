// Lifecycle module - orchestrates one test run
// Owns the report reader and applies its events to the run state

pub mod launch;

pub use launch::Launch;

use crossbeam_channel::Receiver;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::reader::{
    CaseStart, DEFAULT_POLL_INTERVAL, JunitXmlReader, ReaderMessage, ReportEvent, SuiteStart,
};
use crate::report::{RunObserver, RunSummary};
use crate::state::{
    FailureDetail, Failures, Progress, ResultId, ResultTree, TestCaseResult, TestStatus,
    TestSuiteResult, TestingTargets,
};

/// Errors from starting a run
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("test lifecycle was already started")]
    AlreadyStarted,

    #[error("failed to start report reader for {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where a run is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Running,
    Ended,
}

/// How the test runner process ended, as far as the caller can tell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessExit {
    /// No trustworthy exit status; rely on the report alone
    Unknown,
    Code(i32),
    /// Killed by a signal
    Signaled,
}

impl ProcessExit {
    pub fn is_abnormal(self) -> bool {
        match self {
            ProcessExit::Unknown | ProcessExit::Code(0) => false,
            ProcessExit::Code(_) | ProcessExit::Signaled => true,
        }
    }
}

impl From<ExitStatus> for ProcessExit {
    fn from(status: ExitStatus) -> Self {
        status.code().map_or(ProcessExit::Signaled, ProcessExit::Code)
    }
}

/// One test run, from launch to the end of its report.
///
/// The report is parsed on a background thread; its events queue up until
/// [`poll`](Self::poll) or [`end`](Self::end) applies them on the caller's
/// thread, so every getter sees a consistent state.
pub struct TestLifecycle {
    state: LifecycleState,
    poll_interval: Duration,
    launch: Option<Arc<Launch>>,
    reader: Option<JunitXmlReader>,
    events: Option<Receiver<ReaderMessage>>,
    observers: Vec<Box<dyn RunObserver>>,
    progress: Progress,
    failures: Failures,
    results: ResultTree,
    targets: TestingTargets,
    has_errors: bool,
    reader_finished: bool,
    finished_at: Option<Instant>,
    abort_reason: Option<String>,
    processed_files: Vec<String>,
    open_suites: Vec<ResultId>,
    current_case: Option<ResultId>,
}

impl Default for TestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLifecycle {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Lifecycle whose reader retries every `poll_interval`
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            state: LifecycleState::Idle,
            poll_interval,
            launch: None,
            reader: None,
            events: None,
            observers: Vec::new(),
            progress: Progress::new(),
            failures: Failures::new(),
            results: ResultTree::new(),
            targets: TestingTargets::new(),
            has_errors: false,
            reader_finished: false,
            finished_at: None,
            abort_reason: None,
            processed_files: Vec::new(),
            open_suites: Vec::new(),
            current_case: None,
        }
    }

    /// Begin following the launch's report
    pub fn start(
        &mut self,
        launch: Arc<Launch>,
        observers: Vec<Box<dyn RunObserver>>,
    ) -> Result<(), LifecycleError> {
        if self.state != LifecycleState::Idle {
            return Err(LifecycleError::AlreadyStarted);
        }

        let path = launch.junit_xml_file().to_path_buf();
        let mut reader = JunitXmlReader::new(&path, self.poll_interval);

        self.progress.start(Instant::now());
        let events = reader
            .spawn()
            .map_err(|source| LifecycleError::Spawn { path: path.clone(), source })?;

        for target in launch.targets() {
            self.targets.add(target.as_str());
        }
        info!("Following test report {} (launch {})", path.display(), launch.id());

        self.launch = Some(launch);
        self.reader = Some(reader);
        self.events = Some(events);
        self.observers = observers;
        self.state = LifecycleState::Running;
        Ok(())
    }

    /// Apply every event the reader has produced so far
    pub fn poll(&mut self) -> usize {
        let Some(events) = &self.events else {
            return 0;
        };
        let messages: Vec<ReaderMessage> = events.try_iter().collect();
        let count = messages.len();
        for message in messages {
            self.apply(message);
        }
        count
    }

    /// Finish the run once the runner process has terminated.
    ///
    /// Stops and joins the reader, applies what it read last and freezes the
    /// run timer. Calling it again does nothing.
    pub fn end(&mut self, exit: ProcessExit) {
        match self.state {
            LifecycleState::Idle => {
                self.state = LifecycleState::Ended;
                return;
            }
            LifecycleState::Ended => {
                debug!("Test lifecycle already ended");
                return;
            }
            LifecycleState::Running => {}
        }

        if exit.is_abnormal() {
            warn!("Test runner exited abnormally: {:?}", exit);
            self.has_errors = true;
        }

        if let Some(reader) = self.reader.as_mut() {
            reader.stop();
            if reader.join().is_err() {
                warn!("Report reader thread panicked for {}", reader.path().display());
            }
        }
        self.poll();

        self.progress.end(self.finished_at.unwrap_or_else(Instant::now));
        self.state = LifecycleState::Ended;
        info!(
            "Test run ended: {} completed, {} failed, errors: {}",
            self.progress.completed(),
            self.progress.failure_count() + self.progress.error_count(),
            self.has_errors
        );

        let summary = RunSummary::from_lifecycle(self);
        for observer in &self.observers {
            if let Err(err) = observer.on_run_end(&summary) {
                warn!("Failed to report run result: {:#}", err);
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn launch(&self) -> Option<&Arc<Launch>> {
        self.launch.as_ref()
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// The run aborted: malformed report or abnormal process exit
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Why reading stopped early, if it did
    pub fn abort_reason(&self) -> Option<&str> {
        self.abort_reason.as_deref()
    }

    /// Root suite, once the report has opened one
    pub fn result(&self) -> Option<&TestSuiteResult> {
        self.results.root()
    }

    pub fn results(&self) -> &ResultTree {
        &self.results
    }

    pub fn failures(&self) -> &Failures {
        &self.failures
    }

    pub fn has_failures(&self) -> bool {
        self.progress.has_failures()
    }

    pub fn is_progress_initialized(&self) -> bool {
        self.progress.is_initialized()
    }

    pub fn testing_targets(&self) -> &TestingTargets {
        &self.targets
    }

    /// The reader thread has nothing more to deliver
    pub fn is_reader_finished(&self) -> bool {
        self.reader_finished
    }

    /// Whether `launch` is the very handle this run was started with
    pub fn validate_launch_identity(&self, launch: &Launch) -> bool {
        self.launch
            .as_ref()
            .is_some_and(|own| std::ptr::eq(Arc::as_ptr(own), launch))
    }

    /// No completed case has named this case's file yet
    pub fn is_file_first_accessed(&self, case: &TestCaseResult) -> bool {
        match &case.file {
            Some(file) => !self.processed_files.contains(file),
            None => false,
        }
    }

    /// Files in the order their first case completed
    pub fn accessed_files(&self) -> &[String] {
        &self.processed_files
    }

    fn apply(&mut self, message: ReaderMessage) {
        match message {
            ReaderMessage::Event { at, event } => self.apply_event(at, event),
            ReaderMessage::Finished { at } => {
                debug!("Test report complete");
                self.reader_finished = true;
                self.finished_at = Some(at);
            }
            ReaderMessage::Aborted { error, .. } => {
                self.reader_finished = true;
                if error.is_malformed() {
                    // The runner died without closing its report.
                    warn!("{}", error);
                    self.has_errors = true;
                } else {
                    warn!("{}", error);
                }
                self.abort_reason = Some(error.to_string());
            }
        }
    }

    fn apply_event(&mut self, at: Instant, event: ReportEvent) {
        match event {
            ReportEvent::SuiteStart(suite) => self.start_test_suite(suite),
            ReportEvent::SuiteEnd => {
                if let Some(id) = self.open_suites.pop() {
                    self.failures.close_result(id);
                }
            }
            ReportEvent::CaseStart(case) => self.start_test_case(at, case),
            ReportEvent::Failure(detail) => self.start_failure(detail),
            ReportEvent::CaseEnd => self.end_test_case(at),
        }
    }

    fn start_test_suite(&mut self, start: SuiteStart) {
        let mut suite = TestSuiteResult::new(start.name);
        suite.file = start.file;
        suite.planned = start.tests;

        let id = self.results.add_suite(self.open_suites.last().copied(), suite);
        self.open_suites.push(id);
        self.failures.add_result(id);

        if let Some(total) = start.tests
            && !self.progress.is_initialized()
        {
            self.progress.initialize(total);
            for observer in &self.observers {
                observer.on_plan(total);
            }
        }

        if let Some(suite) = self.results.suite(id) {
            for observer in &self.observers {
                observer.on_suite_start(suite);
            }
        }
    }

    fn start_test_case(&mut self, at: Instant, start: CaseStart) {
        let Some(&parent) = self.open_suites.last() else {
            warn!("Test case {} outside any test suite, ignored", start.name);
            return;
        };

        let mut case = TestCaseResult::new(start.name);
        case.class_name = start.class_name;
        case.file = start.file;
        case.line = start.line;
        case.reported_time = start.time;

        let id = self.results.add_case(parent, case);
        self.failures.add_result(id);
        self.progress.start_test_case(at);
        self.current_case = Some(id);

        if let Some(case) = self.results.case(id) {
            for observer in &self.observers {
                observer.on_case_start(case);
            }
        }
    }

    fn start_failure(&mut self, detail: FailureDetail) {
        let Some(id) = self.failures.mark_current_result_as_failure() else {
            warn!("Failure reported outside any test, ignored");
            return;
        };
        if let Some(case) = self.results.case_mut(id) {
            case.mark_failed(detail);
        } else if let Some(suite) = self.results.suite_mut(id) {
            // e.g. a class-level setup that failed before any case ran
            if suite.failure.is_none() {
                self.progress.mark_suite_failure();
            }
            suite.mark_failed(detail);
        }
    }

    fn end_test_case(&mut self, at: Instant) {
        let Some(id) = self.current_case.take() else {
            return;
        };

        let time = self.progress.end_test_case(at);
        let Some(case) = self.results.case_mut(id) else {
            return;
        };
        case.time = time;
        if case.status == TestStatus::Pending {
            case.status = TestStatus::Passed;
        }
        let status = case.status;

        self.results.record_case_end(id);
        self.progress.mark_as_completed(status);
        self.failures.close_result(id);

        let Some(case) = self.results.case(id) else {
            return;
        };
        let first_access = self.is_file_first_accessed(case);
        if first_access && let Some(file) = &case.file {
            self.processed_files.push(file.clone());
        }

        for observer in &self.observers {
            observer.on_case_end(case, &self.progress);
            if first_access && let Some(file) = &case.file {
                observer.on_file_first_accessed(file);
            }
        }
    }
}

impl Drop for TestLifecycle {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.as_ref() {
            reader.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exit_classification() {
        assert!(!ProcessExit::Unknown.is_abnormal());
        assert!(!ProcessExit::Code(0).is_abnormal());
        assert!(ProcessExit::Code(255).is_abnormal());
        assert!(ProcessExit::Signaled.is_abnormal());
    }

    #[test]
    fn test_end_before_start() {
        let mut lifecycle = TestLifecycle::new();
        lifecycle.end(ProcessExit::Unknown);
        assert_eq!(lifecycle.state(), LifecycleState::Ended);
        assert!(!lifecycle.has_errors());
        assert!(lifecycle.result().is_none());
    }

    #[test]
    fn test_first_access_requires_file() {
        let lifecycle = TestLifecycle::new();
        assert!(!lifecycle.is_file_first_accessed(&TestCaseResult::new("noFile")));
        assert!(lifecycle.is_file_first_accessed(&TestCaseResult::new("a").with_file("A.php")));
    }

    #[test]
    fn test_events_build_result_tree() {
        let base = Instant::now();
        let mut lifecycle = TestLifecycle::new();
        lifecycle.apply_event(
            base,
            ReportEvent::SuiteStart(SuiteStart {
                name: "FooTest".to_string(),
                file: None,
                tests: Some(1),
            }),
        );
        lifecycle.apply_event(
            base,
            ReportEvent::CaseStart(CaseStart {
                name: "testA".to_string(),
                file: Some("FooTest.php".to_string()),
                ..CaseStart::default()
            }),
        );
        lifecycle.apply_event(base + Duration::from_millis(30), ReportEvent::CaseEnd);
        lifecycle.apply_event(base, ReportEvent::SuiteEnd);

        let root = lifecycle.result().expect("root suite");
        assert_eq!(root.tests(), 1);
        let (_, case) = lifecycle.results().cases().next().expect("one case");
        assert_eq!(case.status, TestStatus::Passed);
        assert_eq!(case.time, Duration::from_millis(30));
        assert_eq!(lifecycle.progress().completed(), 1);
        assert_eq!(lifecycle.accessed_files(), ["FooTest.php".to_string()]);
    }
}
