// Failures - ordered list of failing results within a run

use crate::state::ResultId;

/// Search direction for [`Failures::find`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    id: ResultId,
    open: bool,
    failed: bool,
}

/// Results seen so far, and which of them failed.
///
/// Every suite and case is added when it starts; a failure event flags the
/// most recently added entry that has not ended yet. Nothing is ever removed.
#[derive(Debug, Clone, Default)]
pub struct Failures {
    entries: Vec<Entry>,
    failed: Vec<ResultId>,
}

impl Failures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_result(&mut self, id: ResultId) {
        self.entries.push(Entry {
            id,
            open: true,
            failed: false,
        });
    }

    /// The result ended; later failure events no longer apply to it
    pub fn close_result(&mut self, id: ResultId) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.id == id) {
            entry.open = false;
        }
    }

    /// Flag the current result; returns it, or `None` if nothing is open
    pub fn mark_current_result_as_failure(&mut self) -> Option<ResultId> {
        let entry = self.entries.iter_mut().rev().find(|e| e.open)?;
        if !entry.failed {
            entry.failed = true;
            self.failed.push(entry.id);
        }
        Some(entry.id)
    }

    pub fn len(&self) -> usize {
        self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn contains(&self, id: ResultId) -> bool {
        self.failed.contains(&id)
    }

    /// Failing results in the order they were flagged
    pub fn iter(&self) -> impl Iterator<Item = ResultId> + '_ {
        self.failed.iter().copied()
    }

    /// Nearest failing result before or after `from` in document order
    pub fn find(&self, from: ResultId, direction: Direction) -> Option<ResultId> {
        let position = self.entries.iter().position(|e| e.id == from)?;
        match direction {
            Direction::Next => self.entries[position + 1..]
                .iter()
                .find(|e| e.failed)
                .map(|e| e.id),
            Direction::Previous => self.entries[..position]
                .iter()
                .rev()
                .find(|e| e.failed)
                .map(|e| e.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ResultTree, TestCaseResult, TestSuiteResult};

    fn ids(count: usize) -> Vec<ResultId> {
        let mut tree = ResultTree::new();
        let root = tree.add_suite(None, TestSuiteResult::new("root"));
        let mut ids = vec![root];
        for i in 1..count {
            ids.push(tree.add_case(root, TestCaseResult::new(format!("case{i}"))));
        }
        ids
    }

    #[test]
    fn test_marks_most_recent_open_result() {
        let ids = ids(3);
        let mut failures = Failures::new();
        failures.add_result(ids[0]);
        failures.add_result(ids[1]);
        failures.close_result(ids[1]);
        failures.add_result(ids[2]);

        assert_eq!(failures.mark_current_result_as_failure(), Some(ids[2]));
        assert_eq!(failures.iter().collect::<Vec<_>>(), vec![ids[2]]);
    }

    #[test]
    fn test_falls_back_to_enclosing_suite() {
        let ids = ids(2);
        let mut failures = Failures::new();
        failures.add_result(ids[0]);
        failures.add_result(ids[1]);
        failures.close_result(ids[1]);

        assert_eq!(failures.mark_current_result_as_failure(), Some(ids[0]));
        assert!(failures.contains(ids[0]));
        assert!(!failures.contains(ids[1]));
    }

    #[test]
    fn test_repeated_failure_recorded_once() {
        let ids = ids(2);
        let mut failures = Failures::new();
        failures.add_result(ids[1]);
        failures.mark_current_result_as_failure();
        failures.mark_current_result_as_failure();
        assert_eq!(failures.len(), 1);
    }

    #[test]
    fn test_nothing_open() {
        let mut failures = Failures::new();
        assert_eq!(failures.mark_current_result_as_failure(), None);
        assert!(failures.is_empty());
    }

    #[test]
    fn test_find_previous_and_next() {
        let ids = ids(5);
        let mut failures = Failures::new();
        for (i, id) in ids.iter().enumerate() {
            failures.add_result(*id);
            if i == 1 || i == 3 {
                failures.mark_current_result_as_failure();
            }
            failures.close_result(*id);
        }

        assert_eq!(failures.find(ids[0], Direction::Next), Some(ids[1]));
        assert_eq!(failures.find(ids[1], Direction::Next), Some(ids[3]));
        assert_eq!(failures.find(ids[3], Direction::Next), None);
        assert_eq!(failures.find(ids[4], Direction::Previous), Some(ids[3]));
        assert_eq!(failures.find(ids[1], Direction::Previous), None);
    }
}
