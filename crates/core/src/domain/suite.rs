// Suite model - named collections of test cases, run in insertion order
//
// Collections and suites are explicit ordered sequences; there is no
// sentinel-terminated registration table to keep in sync.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestOutcome {
    Success,
    Failure,
    Skipped,
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestOutcome::Success => write!(f, "SUCCESS"),
            TestOutcome::Failure => write!(f, "FAILURE"),
            TestOutcome::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Test callback. `C` is the per-run context type the runner threads
/// through every callback.
pub type TestFn<C> = fn(&mut C) -> TestOutcome;

/// A single test case: a name plus a callback.
pub struct TestCase<C> {
    pub name: String,
    pub run: TestFn<C>,
}

/// Named, ordered group of test cases with optional collection-level
/// setup and teardown. Insertion order defines run order.
pub struct Collection<C> {
    pub name: String,
    pub setup: Option<TestFn<C>>,
    pub teardown: Option<TestFn<C>>,
    cases: Vec<TestCase<C>>,
}

impl<C> Collection<C> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            teardown: None,
            cases: Vec::new(),
        }
    }

    pub fn with_setup(mut self, setup: TestFn<C>) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn with_teardown(mut self, teardown: TestFn<C>) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Append a case; run order follows append order.
    pub fn case(mut self, name: impl Into<String>, run: TestFn<C>) -> Self {
        self.cases.push(TestCase {
            name: name.into(),
            run,
        });
        self
    }

    pub fn cases(&self) -> &[TestCase<C>] {
        &self.cases
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Ordered set of collections forming a whole run.
pub struct Suite<C> {
    collections: Vec<Collection<C>>,
}

impl<C> Suite<C> {
    pub fn new() -> Self {
        Self {
            collections: Vec::new(),
        }
    }

    /// Append a collection; run order follows append order.
    pub fn push(&mut self, collection: Collection<C>) {
        self.collections.push(collection);
    }

    pub fn collections(&self) -> &[Collection<C>] {
        &self.collections
    }
}

impl<C> Default for Suite<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ()) -> TestOutcome {
        TestOutcome::Success
    }

    #[test]
    fn collections_preserve_insertion_order() {
        let mut suite: Suite<()> = Suite::new();
        suite.push(Collection::new("first").case("a", noop).case("b", noop));
        suite.push(Collection::new("second").case("c", noop));

        let names: Vec<&str> = suite
            .collections()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "second"]);

        let case_names: Vec<&str> = suite.collections()[0]
            .cases()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(case_names, vec!["a", "b"]);
    }

    #[test]
    fn collection_builder_records_setup_and_teardown() {
        let collection: Collection<()> = Collection::new("fixture")
            .with_setup(noop)
            .with_teardown(noop)
            .case("only", noop);

        assert!(collection.setup.is_some());
        assert!(collection.teardown.is_some());
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn outcome_display_is_stable() {
        assert_eq!(TestOutcome::Success.to_string(), "SUCCESS");
        assert_eq!(TestOutcome::Failure.to_string(), "FAILURE");
        assert_eq!(TestOutcome::Skipped.to_string(), "SKIPPED");
    }
}
