// Run reports - aggregated results produced by the runner

use serde::{Deserialize, Serialize};

use crate::domain::suite::TestOutcome;

/// Result of one executed (or skipped) test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,
    pub outcome: TestOutcome,
    pub duration_ms: i64,
}

/// Results of one collection, cases in run order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionReport {
    pub name: String,
    pub cases: Vec<CaseReport>,
}

impl CollectionReport {
    pub fn count(&self, outcome: TestOutcome) -> usize {
        self.cases.iter().filter(|c| c.outcome == outcome).count()
    }
}

/// Results of a whole run, collections in run order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunReport {
    pub collections: Vec<CollectionReport>,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.collections.iter().map(|c| c.cases.len()).sum()
    }

    pub fn count(&self, outcome: TestOutcome) -> usize {
        self.collections.iter().map(|c| c.count(outcome)).sum()
    }

    /// Skipped cases do not fail a run.
    pub fn all_passed(&self) -> bool {
        self.count(TestOutcome::Failure) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            collections: vec![CollectionReport {
                name: "smoke".to_string(),
                cases: vec![
                    CaseReport {
                        name: "ok".to_string(),
                        outcome: TestOutcome::Success,
                        duration_ms: 3,
                    },
                    CaseReport {
                        name: "missing binary".to_string(),
                        outcome: TestOutcome::Skipped,
                        duration_ms: 0,
                    },
                ],
            }],
        }
    }

    #[test]
    fn counts_by_outcome() {
        let report = report();
        assert_eq!(report.total(), 2);
        assert_eq!(report.count(TestOutcome::Success), 1);
        assert_eq!(report.count(TestOutcome::Skipped), 1);
        assert_eq!(report.count(TestOutcome::Failure), 0);
    }

    #[test]
    fn skipped_cases_do_not_fail_a_run() {
        assert!(report().all_passed());
    }
}
