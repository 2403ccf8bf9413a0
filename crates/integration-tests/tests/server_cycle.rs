//! Startup/shutdown smoke tests against real server binaries.
//!
//! Each test bails out early (without failing) when its binary is not
//! installed, mirroring how the self-test suite skips those cases.

use testbed_core::application::runner::RunnerOptions;
use testbed_core::domain::TestOutcome;
use testbed_harness::config::{GEARMAND_BINARY_VAR, MEMCACHED_BINARY_VAR};
use testbed_harness::{selftest, server_startup, telemetry, Harness, HarnessConfig};
use testbed_infra_process::resolve_executable;

// Away from the self-test suite's fixed ports: these tests may run in
// parallel threads with the full-suite test below.
const MEMCACHED_PORT: u16 = 19998;
const GEARMAND_PORT: u16 = 19999;

#[test]
fn memcached_cycle() {
    telemetry::init_logging();

    if resolve_executable("memcached", MEMCACHED_BINARY_VAR).is_none() {
        eprintln!("memcached not installed, skipping");
        return;
    }

    let mut harness = Harness::new(&HarnessConfig::default());
    let args = vec!["cycle_memcached".to_string()];

    assert!(server_startup(
        &mut harness.context_mut().servers,
        "memcached",
        MEMCACHED_PORT,
        &args
    ));
    assert_eq!(harness.context_mut().servers.count(), 1);

    harness.context_mut().servers.shutdown_all();
    assert!(harness.context_mut().servers.is_empty());
}

#[test]
fn gearmand_cycle() {
    telemetry::init_logging();

    if resolve_executable("gearmand", GEARMAND_BINARY_VAR).is_none() {
        eprintln!("gearmand not installed, skipping");
        return;
    }

    let mut harness = Harness::new(&HarnessConfig::default());
    let args = vec!["cycle_gearmand".to_string()];

    assert!(server_startup(
        &mut harness.context_mut().servers,
        "gearmand",
        GEARMAND_PORT,
        &args
    ));

    harness.context_mut().servers.shutdown_all();
}

/// The whole built-in suite must come out without failures whether or
/// not the server binaries exist: cycle cases either pass or skip.
#[test]
fn selftest_suite_has_no_failures() {
    telemetry::init_logging();

    let suite = selftest::suite();
    let mut harness = Harness::new(&HarnessConfig::default());
    let report = harness
        .run(&suite, &RunnerOptions::default())
        .expect("run");

    assert!(report.all_passed());
    assert_eq!(report.collections.len(), 4);

    for kind in ["memcached", "gearmand"] {
        let collection = report
            .collections
            .iter()
            .find(|c| c.name == kind)
            .expect("cycle collection present");
        let outcome = collection.cases[0].outcome;
        assert!(
            outcome == TestOutcome::Success || outcome == TestOutcome::Skipped,
            "{} cycle reported {}",
            kind,
            outcome
        );
    }
}
