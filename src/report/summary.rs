// Run summary - the final, serializable view of a run

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::lifecycle::TestLifecycle;
use crate::state::{ProgressSnapshot, ResultNode, ResultTree, TestStatus};

/// Overall outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    /// Completed with failing tests
    Failed,
    /// The runner died or the report never became well-formed
    Aborted,
}

/// One failing result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub time: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
    pub generated_at: String,
    pub status: RunStatus,
    pub has_errors: bool,
    pub has_failures: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abort_reason: Option<String>,
    pub progress: ProgressSnapshot,
    pub failures: Vec<FailureEntry>,
    pub uncovered_targets: Vec<String>,
    pub results: ResultTree,
}

impl RunSummary {
    pub fn from_lifecycle(lifecycle: &TestLifecycle) -> Self {
        let results = lifecycle.results();
        let status = if lifecycle.has_errors() {
            RunStatus::Aborted
        } else if lifecycle.has_failures() {
            RunStatus::Failed
        } else {
            RunStatus::Passed
        };

        let failures = lifecycle
            .failures()
            .iter()
            .filter_map(|id| results.get(id))
            .map(failure_entry)
            .collect();

        let uncovered_targets = lifecycle
            .testing_targets()
            .uncovered(results)
            .into_iter()
            .map(str::to_string)
            .collect();

        Self {
            launch_id: lifecycle.launch().map(|l| l.id()),
            report: lifecycle.launch().map(|l| l.junit_xml_file().to_path_buf()),
            generated_at: crate::time::now_rfc3339(),
            status,
            has_errors: lifecycle.has_errors(),
            has_failures: lifecycle.has_failures(),
            abort_reason: lifecycle.abort_reason().map(str::to_string),
            progress: lifecycle.progress().snapshot(),
            failures,
            uncovered_targets,
            results: results.clone(),
        }
    }
}

fn failure_entry(node: &ResultNode) -> FailureEntry {
    match node {
        ResultNode::Case(case) => FailureEntry {
            name: case.name.clone(),
            file: case.file.clone(),
            status: Some(case.status),
            message: case.failure.as_ref().and_then(|f| f.message.clone()),
            time: case.time,
        },
        ResultNode::Suite(suite) => FailureEntry {
            name: suite.name.clone(),
            file: suite.file.clone(),
            status: None,
            message: suite.failure.as_ref().and_then(|f| f.message.clone()),
            time: Duration::ZERO,
        },
    }
}
