//! Runner behavior through the fully wired harness: ordering, panic
//! isolation, setup gating, and collection filtering.

use testbed_core::application::runner::{RunnerOptions, TestContext};
use testbed_core::domain::{Collection, Suite, TestOutcome};
use testbed_harness::{telemetry, Harness, HarnessConfig};

fn harness() -> Harness {
    telemetry::init_logging();
    Harness::new(&HarnessConfig::default())
}

fn succeeds(_: &mut TestContext) -> TestOutcome {
    TestOutcome::Success
}

fn fails(_: &mut TestContext) -> TestOutcome {
    TestOutcome::Failure
}

fn skips(_: &mut TestContext) -> TestOutcome {
    TestOutcome::Skipped
}

fn panics(_: &mut TestContext) -> TestOutcome {
    panic!("deliberate panic inside a test case");
}

fn failing_setup(_: &mut TestContext) -> TestOutcome {
    TestOutcome::Failure
}

#[test]
fn outcomes_are_counted_per_kind() {
    let mut suite: Suite<TestContext> = Suite::new();
    suite.push(
        Collection::new("outcomes")
            .case("succeeds", succeeds)
            .case("fails", fails)
            .case("skips", skips),
    );

    let report = harness()
        .run(&suite, &RunnerOptions::default())
        .expect("run");

    assert_eq!(report.total(), 3);
    assert_eq!(report.count(TestOutcome::Success), 1);
    assert_eq!(report.count(TestOutcome::Failure), 1);
    assert_eq!(report.count(TestOutcome::Skipped), 1);
    assert!(!report.all_passed());
}

#[test]
fn a_panicking_case_does_not_abort_the_suite() {
    let mut suite: Suite<TestContext> = Suite::new();
    suite.push(Collection::new("explosive").case("panics", panics));
    suite.push(Collection::new("calm").case("succeeds", succeeds));

    let report = harness()
        .run(&suite, &RunnerOptions::default())
        .expect("run");

    assert_eq!(report.collections.len(), 2);
    assert_eq!(report.collections[0].cases[0].outcome, TestOutcome::Failure);
    assert_eq!(report.collections[1].cases[0].outcome, TestOutcome::Success);
}

#[test]
fn failed_setup_skips_the_whole_collection() {
    let mut suite: Suite<TestContext> = Suite::new();
    suite.push(
        Collection::new("gated")
            .with_setup(failing_setup)
            .case("never runs", fails)
            .case("never runs either", fails),
    );

    let report = harness()
        .run(&suite, &RunnerOptions::default())
        .expect("run");

    assert_eq!(report.count(TestOutcome::Skipped), 2);
    assert_eq!(report.count(TestOutcome::Failure), 0);
    assert!(report.all_passed());
}

#[test]
fn collection_filter_runs_exactly_one_collection() {
    let mut suite: Suite<TestContext> = Suite::new();
    suite.push(Collection::new("first").case("fails", fails));
    suite.push(Collection::new("second").case("succeeds", succeeds));

    let options = RunnerOptions {
        collection: Some("second".to_string()),
    };
    let report = harness().run(&suite, &options).expect("run");

    assert_eq!(report.collections.len(), 1);
    assert_eq!(report.collections[0].name, "second");
    assert!(report.all_passed());
}

#[test]
fn an_unknown_collection_filter_is_refused() {
    let suite: Suite<TestContext> = Suite::new();
    let options = RunnerOptions {
        collection: Some("missing".to_string()),
    };

    assert!(harness().run(&suite, &options).is_err());
}
