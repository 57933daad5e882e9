// Report module - observers of a run and its final summary

pub mod console;
pub mod json;
pub mod summary;

use crate::state::{Progress, TestCaseResult, TestSuiteResult};
use anyhow::Result;
pub use console::ConsoleReporter;
pub use json::JsonReporter;
pub use summary::{FailureEntry, RunStatus, RunSummary};

/// Receives run events on the thread that polls the lifecycle
pub trait RunObserver: Send {
    /// The report announced how many cases it will run
    fn on_plan(&self, _total: usize) {}

    fn on_suite_start(&self, _suite: &TestSuiteResult) {}

    fn on_case_start(&self, _case: &TestCaseResult) {}

    /// Called when a case finishes, with its final status and time
    fn on_case_end(&self, _case: &TestCaseResult, _progress: &Progress) {}

    /// A completed case is the first of this run from `file`
    fn on_file_first_accessed(&self, _file: &str) {}

    /// Called once the run has ended
    fn on_run_end(&self, summary: &RunSummary) -> Result<()>;
}
