// State module - run state owned by the lifecycle
// Results, progress, failures and the targets a run covers

pub mod failures;
pub mod progress;
pub mod result;
pub mod targets;

pub use failures::{Direction, Failures};
pub use progress::{Progress, ProgressSnapshot};
pub use result::{
    FailureDetail, FailureKind, ResultId, ResultNode, ResultTree, TestCaseResult, TestStatus,
    TestSuiteResult,
};
pub use targets::TestingTargets;
