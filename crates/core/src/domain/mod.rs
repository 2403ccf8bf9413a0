// Domain Layer - server descriptors and the suite model

pub mod descriptor;
pub mod error;
pub mod report;
pub mod suite;

// Re-exports
pub use descriptor::{Pid, ServerDescriptor};
pub use error::DomainError;
pub use report::{CaseReport, CollectionReport, RunReport};
pub use suite::{Collection, Suite, TestCase, TestFn, TestOutcome};
