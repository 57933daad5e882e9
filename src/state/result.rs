// Test result structures
// Suites and cases of a streamed report, stored in document order

use serde::Serialize;
use std::time::Duration;

/// Position of a result inside a [`ResultTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResultId(usize);

impl ResultId {
    /// Document-order index of the result
    pub fn index(self) -> usize {
        self.0
    }
}

/// Test status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pending,
    Passed,
    Failed,
    Errored,
}

impl TestStatus {
    /// Failed or errored
    pub fn is_failure(self) -> bool {
        matches!(self, TestStatus::Failed | TestStatus::Errored)
    }
}

/// Which element reported the problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// `<failure>`: an assertion did not hold
    Failure,
    /// `<error>`: the test raised something unexpected
    Error,
}

impl FailureKind {
    pub fn status(self) -> TestStatus {
        match self {
            FailureKind::Failure => TestStatus::Failed,
            FailureKind::Error => TestStatus::Errored,
        }
    }
}

/// Content of a `<failure>` or `<error>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureDetail {
    pub kind: FailureKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl FailureDetail {
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            failure_type: None,
            message: None,
            file: None,
            line: None,
        }
    }
}

/// A single test case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    pub status: TestStatus,
    /// Time measured between the case's start and end elements
    pub time: Duration,
    /// Value of the `time` attribute, if the runner wrote one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_time: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
    #[serde(skip)]
    parent: Option<ResultId>,
}

impl TestCaseResult {
    /// Create a pending case
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: None,
            file: None,
            line: None,
            status: TestStatus::Pending,
            time: Duration::ZERO,
            reported_time: None,
            failure: None,
            parent: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn parent(&self) -> Option<ResultId> {
        self.parent
    }

    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Record a failure or error; the first one reported wins
    pub fn mark_failed(&mut self, detail: FailureDetail) {
        if self.failure.is_none() {
            self.status = detail.kind.status();
            self.failure = Some(detail);
        }
    }
}

/// A named group of cases and nested suites
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSuiteResult {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Value of the `tests` attribute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned: Option<usize>,
    children: Vec<ResultId>,
    tests: usize,
    failures: usize,
    errors: usize,
    /// Failure reported by the suite itself, outside any case
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureDetail>,
    #[serde(skip)]
    parent: Option<ResultId>,
}

impl TestSuiteResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file: None,
            planned: None,
            children: Vec::new(),
            tests: 0,
            failures: 0,
            errors: 0,
            failure: None,
            parent: None,
        }
    }

    /// Record a failure the suite reported outside its cases; the first one wins
    pub fn mark_failed(&mut self, detail: FailureDetail) {
        if self.failure.is_none() {
            self.failure = Some(detail);
        }
    }

    /// Direct children in document order
    pub fn children(&self) -> &[ResultId] {
        &self.children
    }

    /// Completed cases below this suite
    pub fn tests(&self) -> usize {
        self.tests
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn errors(&self) -> usize {
        self.errors
    }

    pub fn has_failures(&self) -> bool {
        self.failures + self.errors > 0 || self.failure.is_some()
    }

    pub fn parent(&self) -> Option<ResultId> {
        self.parent
    }
}

/// Either kind of result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultNode {
    Case(TestCaseResult),
    Suite(TestSuiteResult),
}

impl ResultNode {
    pub fn name(&self) -> &str {
        match self {
            ResultNode::Case(case) => &case.name,
            ResultNode::Suite(suite) => &suite.name,
        }
    }

    pub fn parent(&self) -> Option<ResultId> {
        match self {
            ResultNode::Case(case) => case.parent,
            ResultNode::Suite(suite) => suite.parent,
        }
    }

    pub fn as_case(&self) -> Option<&TestCaseResult> {
        match self {
            ResultNode::Case(case) => Some(case),
            ResultNode::Suite(_) => None,
        }
    }

    pub fn as_suite(&self) -> Option<&TestSuiteResult> {
        match self {
            ResultNode::Suite(suite) => Some(suite),
            ResultNode::Case(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        match self {
            ResultNode::Case(case) => case.is_failure(),
            ResultNode::Suite(suite) => suite.has_failures(),
        }
    }
}

/// Every result of a run; the first suite added is the root
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultTree {
    nodes: Vec<ResultNode>,
}

impl ResultTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The root suite, once the report has opened one
    pub fn root(&self) -> Option<&TestSuiteResult> {
        self.nodes.first().and_then(ResultNode::as_suite)
    }

    pub fn get(&self, id: ResultId) -> Option<&ResultNode> {
        self.nodes.get(id.0)
    }

    pub fn case(&self, id: ResultId) -> Option<&TestCaseResult> {
        self.get(id).and_then(ResultNode::as_case)
    }

    pub fn suite(&self, id: ResultId) -> Option<&TestSuiteResult> {
        self.get(id).and_then(ResultNode::as_suite)
    }

    pub fn case_mut(&mut self, id: ResultId) -> Option<&mut TestCaseResult> {
        match self.nodes.get_mut(id.0) {
            Some(ResultNode::Case(case)) => Some(case),
            _ => None,
        }
    }

    pub fn suite_mut(&mut self, id: ResultId) -> Option<&mut TestSuiteResult> {
        match self.nodes.get_mut(id.0) {
            Some(ResultNode::Suite(suite)) => Some(suite),
            _ => None,
        }
    }

    /// All cases in document order
    pub fn cases(&self) -> impl Iterator<Item = (ResultId, &TestCaseResult)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, node)| node.as_case().map(|case| (ResultId(index), case)))
    }

    /// Add a suite below `parent`, or as the root when `parent` is `None`
    pub fn add_suite(&mut self, parent: Option<ResultId>, mut suite: TestSuiteResult) -> ResultId {
        suite.parent = parent;
        self.push(parent, ResultNode::Suite(suite))
    }

    pub fn add_case(&mut self, parent: ResultId, mut case: TestCaseResult) -> ResultId {
        case.parent = Some(parent);
        self.push(Some(parent), ResultNode::Case(case))
    }

    /// Count a finished case in every enclosing suite
    pub fn record_case_end(&mut self, id: ResultId) {
        let Some(case) = self.case(id) else {
            return;
        };
        let status = case.status;
        let mut next = case.parent;

        while let Some(parent) = next {
            let Some(ResultNode::Suite(suite)) = self.nodes.get_mut(parent.0) else {
                break;
            };
            suite.tests += 1;
            match status {
                TestStatus::Failed => suite.failures += 1,
                TestStatus::Errored => suite.errors += 1,
                TestStatus::Pending | TestStatus::Passed => {}
            }
            next = suite.parent;
        }
    }

    fn push(&mut self, parent: Option<ResultId>, node: ResultNode) -> ResultId {
        let id = ResultId(self.nodes.len());
        self.nodes.push(node);
        if let Some(ResultNode::Suite(suite)) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            suite.children.push(id);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (ResultTree, ResultId, ResultId, ResultId) {
        let mut tree = ResultTree::new();
        let root = tree.add_suite(None, TestSuiteResult::new("all"));
        let nested = tree.add_suite(Some(root), TestSuiteResult::new("FooTest"));
        let case = tree.add_case(nested, TestCaseResult::new("testBar").with_file("/src/FooTest.php"));
        (tree, root, nested, case)
    }

    #[test]
    fn test_root_is_first_suite() {
        let (tree, root, nested, case) = sample_tree();
        assert_eq!(tree.root().map(|s| s.name.as_str()), Some("all"));
        assert_eq!(tree.suite(root).map(|s| s.children().to_vec()), Some(vec![nested]));
        assert_eq!(tree.suite(nested).map(|s| s.children().to_vec()), Some(vec![case]));
        assert_eq!(tree.case(case).and_then(|c| c.parent()), Some(nested));
    }

    #[test]
    fn test_empty_tree_has_no_root() {
        let tree = ResultTree::new();
        assert!(tree.root().is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_record_case_end_counts_all_ancestors() {
        let (mut tree, root, nested, case) = sample_tree();
        if let Some(c) = tree.case_mut(case) {
            c.mark_failed(FailureDetail::new(FailureKind::Error));
        }
        tree.record_case_end(case);

        for id in [root, nested] {
            let suite = tree.suite(id).expect("suite");
            assert_eq!(suite.tests(), 1);
            assert_eq!(suite.errors(), 1);
            assert_eq!(suite.failures(), 0);
            assert!(suite.has_failures());
        }
    }

    #[test]
    fn test_first_failure_wins() {
        let mut case = TestCaseResult::new("testBar");
        let mut first = FailureDetail::new(FailureKind::Failure);
        first.message = Some("first".to_string());
        case.mark_failed(first);
        case.mark_failed(FailureDetail::new(FailureKind::Error));

        assert_eq!(case.status, TestStatus::Failed);
        assert_eq!(
            case.failure.as_ref().and_then(|f| f.message.as_deref()),
            Some("first")
        );
    }

    #[test]
    fn test_cases_in_document_order() {
        let (mut tree, _, nested, first) = sample_tree();
        let second = tree.add_case(nested, TestCaseResult::new("testBaz"));
        let ids: Vec<ResultId> = tree.cases().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![first, second]);
    }
}
