//! Testbed harness - composition root
//!
//! Wires the concrete process and server adapters into the core
//! supervision and runner machinery, and exposes the facade test
//! suites use: a wired [`Harness`], the [`server_startup`] free
//! function, and the built-in self-test suite.

pub mod config;
pub mod selftest;
pub mod telemetry;

use std::sync::Arc;

use testbed_core::application::pool::ServerPool;
use testbed_core::application::runner::{Runner, RunnerOptions, TestContext};
use testbed_core::domain::{RunReport, Suite};
use testbed_core::port::server_driver::ServerDriver;
use testbed_core::port::time_provider::SystemTimeProvider;
use testbed_core::Result;
use testbed_infra_process::{resolve_executable, UnixProcessControl};
use testbed_infra_servers::{GearmandDriver, MemcachedDriver};

pub use config::{Environment, HarnessConfig};

/// Build a memcached driver for one instance.
///
/// Ownership transfers to the pool, which manages the driver's
/// lifetime alongside the process it supervises. An unresolvable
/// binary falls back to the bare name so the spawn failure surfaces
/// through the usual startup path.
pub fn build_memcached(host: &str, port: u16) -> Box<dyn ServerDriver> {
    let executable = resolve_executable("memcached", config::MEMCACHED_BINARY_VAR)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "memcached".to_string());
    Box::new(MemcachedDriver::new(host, port, executable))
}

/// Build a gearmand driver for one instance.
pub fn build_gearmand(host: &str, port: u16) -> Box<dyn ServerDriver> {
    let executable = resolve_executable("gearmand", config::GEARMAND_BINARY_VAR)
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "gearmand".to_string());
    Box::new(GearmandDriver::new(host, port, executable))
}

/// Build a driver for a registered server kind without starting it.
/// Used by one-off probes against already-running servers.
pub fn driver_for(kind: &str, host: &str, port: u16) -> Option<Box<dyn ServerDriver>> {
    match kind {
        "memcached" => Some(build_memcached(host, port)),
        "gearmand" => Some(build_gearmand(host, port)),
        _ => None,
    }
}

/// Fully wired harness: a server pool plus the suite runner.
pub struct Harness {
    context: TestContext,
    runner: Runner,
}

impl Harness {
    pub fn new(config: &HarnessConfig) -> Self {
        let time_provider = Arc::new(SystemTimeProvider);
        let control = Arc::new(UnixProcessControl::new(time_provider.clone()));

        let mut pool = ServerPool::new(control, config.launch_options());
        pool.register("memcached", build_memcached);
        pool.register("gearmand", build_gearmand);

        Self {
            context: TestContext::new(pool),
            runner: Runner::new(time_provider),
        }
    }

    pub fn context_mut(&mut self) -> &mut TestContext {
        &mut self.context
    }

    /// Run a suite against this harness's context.
    pub fn run(
        &mut self,
        suite: &Suite<TestContext>,
        options: &RunnerOptions,
    ) -> Result<RunReport> {
        let report = self.runner.run(suite, &mut self.context, options)?;
        Ok(report)
    }
}

/// Start one server instance in the pool.
///
/// `args` is argv-style: the first element is a synthetic label for
/// the instance, the rest are extra command-line arguments. Success is
/// defined purely as "startup succeeded".
pub fn server_startup(pool: &mut ServerPool, kind: &str, port: u16, args: &[String]) -> bool {
    pool.startup(kind, port, args)
}
