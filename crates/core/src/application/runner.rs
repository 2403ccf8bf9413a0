// Suite runner - executes collections in insertion order

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::application::guard::{execute_guarded, PanicGuardResult};
use crate::application::pool::ServerPool;
use crate::domain::error::DomainError;
use crate::domain::report::{CaseReport, CollectionReport, RunReport};
use crate::domain::suite::{Collection, Suite, TestFn, TestOutcome};
use crate::port::TimeProvider;

/// Per-run context handed to every test callback.
pub struct TestContext {
    pub servers: ServerPool,
}

impl TestContext {
    pub fn new(servers: ServerPool) -> Self {
        Self { servers }
    }
}

/// Runner options
#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Run only the named collection.
    pub collection: Option<String>,
}

/// Sequential, single-threaded suite runner.
pub struct Runner {
    time_provider: Arc<dyn TimeProvider>,
}

impl Runner {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self { time_provider }
    }

    /// Run a suite in registration order.
    ///
    /// # Errors
    /// - DomainError::UnknownCollection when the filter names a
    ///   collection the suite does not have
    pub fn run<C>(
        &self,
        suite: &Suite<C>,
        context: &mut C,
        options: &RunnerOptions,
    ) -> Result<RunReport, DomainError> {
        if let Some(wanted) = &options.collection {
            if !suite.collections().iter().any(|c| c.name == *wanted) {
                return Err(DomainError::UnknownCollection(wanted.clone()));
            }
        }

        let mut report = RunReport::default();
        for collection in suite.collections() {
            if let Some(wanted) = &options.collection {
                if collection.name != *wanted {
                    continue;
                }
            }
            report
                .collections
                .push(self.run_collection(collection, context));
        }

        info!(
            total = report.total(),
            failed = report.count(TestOutcome::Failure),
            skipped = report.count(TestOutcome::Skipped),
            "Suite finished"
        );
        Ok(report)
    }

    fn run_collection<C>(&self, collection: &Collection<C>, context: &mut C) -> CollectionReport {
        info!(collection = %collection.name, "Running collection");

        let mut cases = Vec::new();

        if let Some(setup) = collection.setup {
            if run_callback(setup, context) != TestOutcome::Success {
                warn!(
                    collection = %collection.name,
                    "Setup did not succeed, skipping collection"
                );
                for case in collection.cases() {
                    cases.push(CaseReport {
                        name: case.name.clone(),
                        outcome: TestOutcome::Skipped,
                        duration_ms: 0,
                    });
                }
                return CollectionReport {
                    name: collection.name.clone(),
                    cases,
                };
            }
        }

        for case in collection.cases() {
            let started = self.time_provider.now_millis();
            let outcome = run_callback(case.run, context);
            let duration_ms = self.time_provider.now_millis() - started;

            match outcome {
                TestOutcome::Success => {
                    info!(collection = %collection.name, case = %case.name, duration_ms, "ok");
                }
                TestOutcome::Failure => {
                    error!(collection = %collection.name, case = %case.name, duration_ms, "failed");
                }
                TestOutcome::Skipped => {
                    info!(collection = %collection.name, case = %case.name, "skipped");
                }
            }

            cases.push(CaseReport {
                name: case.name.clone(),
                outcome,
                duration_ms,
            });
        }

        if let Some(teardown) = collection.teardown {
            if run_callback(teardown, context) != TestOutcome::Success {
                warn!(collection = %collection.name, "Teardown did not succeed");
            }
        }

        CollectionReport {
            name: collection.name.clone(),
            cases,
        }
    }
}

/// A panicking callback is recorded as a failure, not a crash of the
/// whole run.
fn run_callback<C>(callback: TestFn<C>, context: &mut C) -> TestOutcome {
    match execute_guarded(AssertUnwindSafe(|| callback(context))) {
        PanicGuardResult::Completed(outcome) => outcome,
        PanicGuardResult::Panicked(message) => {
            error!(panic_message = %message, "Test callback panicked");
            TestOutcome::Failure
        }
    }
}
