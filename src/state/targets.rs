// Testing targets - what a run claims to cover

use serde::Serialize;

use crate::state::ResultTree;

/// Ordered, de-duplicated test identifiers (file paths or test names)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestingTargets {
    targets: Vec<String>,
}

impl TestingTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a target; returns false if it was already present
    pub fn add(&mut self, target: impl Into<String>) -> bool {
        let target = target.into();
        if self.contains(&target) {
            return false;
        }
        self.targets.push(target);
        true
    }

    pub fn contains(&self, target: &str) -> bool {
        self.targets.iter().any(|t| t == target)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(String::as_str)
    }

    /// Targets matched by at least one case, by file path or case name
    pub fn covered<'a>(&'a self, results: &ResultTree) -> Vec<&'a str> {
        self.iter()
            .filter(|target| {
                results.cases().any(|(_, case)| {
                    case.file.as_deref() == Some(*target) || case.name == *target
                })
            })
            .collect()
    }

    /// Targets no case reported on
    pub fn uncovered<'a>(&'a self, results: &ResultTree) -> Vec<&'a str> {
        let covered = self.covered(results);
        self.iter().filter(|t| !covered.contains(t)).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for TestingTargets {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut targets = Self::new();
        for target in iter {
            targets.add(target);
        }
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{TestCaseResult, TestSuiteResult};

    #[test]
    fn test_add_deduplicates() {
        let mut targets = TestingTargets::new();
        assert!(targets.add("tests/FooTest.php"));
        assert!(!targets.add("tests/FooTest.php"));
        assert_eq!(targets.len(), 1);
    }

    #[test]
    fn test_covered_and_uncovered() {
        let mut tree = ResultTree::new();
        let root = tree.add_suite(None, TestSuiteResult::new("root"));
        tree.add_case(root, TestCaseResult::new("testA").with_file("tests/FooTest.php"));

        let targets: TestingTargets = ["tests/FooTest.php", "tests/BarTest.php"]
            .into_iter()
            .collect();

        assert_eq!(targets.covered(&tree), vec!["tests/FooTest.php"]);
        assert_eq!(targets.uncovered(&tree), vec!["tests/BarTest.php"]);
    }
}
