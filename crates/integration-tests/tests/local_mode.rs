//! The local-mode predicate reads the environment lazily on every
//! call, so the built-in "local" collection can flip it back and
//! forth within one run.

use testbed_core::application::runner::RunnerOptions;
use testbed_core::domain::TestOutcome;
use testbed_harness::config::LOCAL_VAR;
use testbed_harness::{selftest, telemetry, Environment, Harness, HarnessConfig};

// One test owns the variable: it is process-wide state and parallel
// test threads must not fight over it.
#[test]
fn local_mode_round_trips_through_the_environment() {
    telemetry::init_logging();

    std::env::remove_var(LOCAL_VAR);
    assert!(!Environment::is_local());

    std::env::set_var(LOCAL_VAR, "1");
    assert!(Environment::is_local());
    // Repeated sets stay truthy
    std::env::set_var(LOCAL_VAR, "1");
    assert!(Environment::is_local());

    std::env::remove_var(LOCAL_VAR);
    assert!(!Environment::is_local());
    std::env::remove_var(LOCAL_VAR);
    assert!(!Environment::is_local());

    // The built-in "local" collection performs the same dance through
    // the runner and must come out green.
    let suite = selftest::suite();
    let options = RunnerOptions {
        collection: Some("local".to_string()),
    };
    let report = Harness::new(&HarnessConfig::default())
        .run(&suite, &options)
        .expect("run");

    assert_eq!(report.total(), 2);
    assert_eq!(report.count(TestOutcome::Success), 2);

    // The collection leaves the flag unset
    assert!(!Environment::is_local());
}
