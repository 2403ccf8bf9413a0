//! Built-in self-test suite
//!
//! Exercises the harness's own collection mechanism, the lazy
//! environment predicate, and one startup/shutdown cycle per
//! supported server. Cycle cases skip cleanly when a binary is not
//! installed.

use tracing::info;

use testbed_core::application::runner::TestContext;
use testbed_core::domain::{Collection, Suite, TestOutcome};
use testbed_infra_process::resolve_executable;

use crate::config::{Environment, GEARMAND_BINARY_VAR, LOCAL_VAR, MEMCACHED_BINARY_VAR};
use crate::server_startup;

/// Fixed ports for the cycle smoke cases.
const GEARMAND_CYCLE_PORT: u16 = 9999;
const MEMCACHED_CYCLE_PORT: u16 = 9998;

fn always_succeeds(_: &mut TestContext) -> TestOutcome {
    TestOutcome::Success
}

fn local_mode_on(_: &mut TestContext) -> TestOutcome {
    std::env::set_var(LOCAL_VAR, "1");

    if !Environment::is_local() {
        return TestOutcome::Failure;
    }

    TestOutcome::Success
}

fn local_mode_off(_: &mut TestContext) -> TestOutcome {
    std::env::remove_var(LOCAL_VAR);

    if Environment::is_local() {
        return TestOutcome::Failure;
    }

    TestOutcome::Success
}

fn gearmand_cycle(context: &mut TestContext) -> TestOutcome {
    if resolve_executable("gearmand", GEARMAND_BINARY_VAR).is_none() {
        info!("gearmand binary not found, skipping cycle");
        return TestOutcome::Skipped;
    }

    let args = vec!["cycle_gearmand".to_string()];
    if server_startup(&mut context.servers, "gearmand", GEARMAND_CYCLE_PORT, &args) {
        TestOutcome::Success
    } else {
        TestOutcome::Failure
    }
}

fn memcached_cycle(context: &mut TestContext) -> TestOutcome {
    if resolve_executable("memcached", MEMCACHED_BINARY_VAR).is_none() {
        info!("memcached binary not found, skipping cycle");
        return TestOutcome::Skipped;
    }

    let args = vec!["cycle_memcached".to_string()];
    if server_startup(
        &mut context.servers,
        "memcached",
        MEMCACHED_CYCLE_PORT,
        &args,
    ) {
        TestOutcome::Success
    } else {
        TestOutcome::Failure
    }
}

/// The built-in suite; collection order is run order.
pub fn suite() -> Suite<TestContext> {
    let mut suite = Suite::new();

    suite.push(Collection::new("return values").case("always succeeds", always_succeeds));

    suite.push(
        Collection::new("local")
            .case("local mode on", local_mode_on)
            .case("local mode off", local_mode_off),
    );

    suite.push(Collection::new("gearmand").case("gearmand startup-shutdown", gearmand_cycle));

    suite.push(Collection::new("memcached").case("memcached startup-shutdown", memcached_cycle));

    suite
}
