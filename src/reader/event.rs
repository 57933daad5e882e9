// Reader events - one per element boundary, in document order

use std::time::{Duration, Instant};

use crate::reader::ReadError;
use crate::state::FailureDetail;

/// Attributes of a `<testsuite>` / `<testsuites>` start tag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuiteStart {
    pub name: String,
    pub file: Option<String>,
    /// Planned number of cases (`tests` attribute)
    pub tests: Option<usize>,
}

/// Attributes of a `<testcase>` start tag
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaseStart {
    pub name: String,
    pub class_name: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub time: Option<Duration>,
}

/// What the parser recognized
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    SuiteStart(SuiteStart),
    SuiteEnd,
    CaseStart(CaseStart),
    Failure(FailureDetail),
    CaseEnd,
}

/// Message sent from the reader thread to the lifecycle
#[derive(Debug)]
pub enum ReaderMessage {
    /// A parsed event, stamped with the moment it became readable
    Event { at: Instant, event: ReportEvent },
    /// The root element closed; nothing more will be read
    Finished { at: Instant },
    /// Reading gave up
    Aborted { at: Instant, error: ReadError },
}
