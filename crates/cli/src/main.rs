//! Testbed CLI - run the built-in self-test suite and one-off server
//! smoke checks.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tabled::{Table, Tabled};

use testbed_core::application::runner::RunnerOptions;
use testbed_core::domain::{RunReport, TestOutcome};
use testbed_core::port::ServerDriver;
use testbed_harness::{driver_for, selftest, server_startup, telemetry, Harness, HarnessConfig};
use testbed_infra_process::pick_unused_port;

#[derive(Parser)]
#[command(name = "testbed")]
#[command(about = "Integration-test harness for external server processes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the built-in self-test suite
    Selftest {
        /// Run only the named collection
        #[arg(short, long)]
        collection: Option<String>,

        /// List collections and cases without running anything
        #[arg(long)]
        list: bool,
    },

    /// Start one server instance, wait for readiness, stop it again
    Cycle {
        /// Server kind (memcached or gearmand)
        #[arg(short, long)]
        server: String,

        /// TCP port for the instance (0 picks an unused one)
        #[arg(short, long, default_value = "0")]
        port: u16,

        /// Extra arguments appended to the server command line
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        extra: Vec<String>,
    },

    /// Probe an already-running server
    Probe {
        /// Server kind (memcached or gearmand)
        #[arg(short, long)]
        server: String,

        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(short, long)]
        port: u16,
    },
}

#[derive(Tabled)]
struct SummaryRow {
    collection: String,
    passed: usize,
    failed: usize,
    skipped: usize,
}

fn main() -> Result<()> {
    telemetry::init_logging();

    let cli = Cli::parse();
    let config = HarnessConfig::load().context("loading harness configuration")?;

    match cli.command {
        Commands::Selftest { collection, list } => run_selftest(&config, collection, list),
        Commands::Cycle {
            server,
            port,
            extra,
        } => run_cycle(&config, &server, port, extra),
        Commands::Probe { server, host, port } => run_probe(&server, &host, port),
    }
}

fn run_selftest(config: &HarnessConfig, collection: Option<String>, list: bool) -> Result<()> {
    let suite = selftest::suite();

    if list {
        for collection in suite.collections() {
            println!("{}", collection.name.bold());
            for case in collection.cases() {
                println!("  {}", case.name);
            }
        }
        return Ok(());
    }

    let mut harness = Harness::new(config);
    let options = RunnerOptions { collection };
    let report = harness.run(&suite, &options)?;

    print_report(&report);

    let failed = report.count(TestOutcome::Failure);
    if failed > 0 {
        bail!("{} case(s) failed", failed);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    for collection in &report.collections {
        for case in &collection.cases {
            let outcome = match case.outcome {
                TestOutcome::Success => "PASS".green(),
                TestOutcome::Failure => "FAIL".red(),
                TestOutcome::Skipped => "SKIP".yellow(),
            };
            println!("[{}] {} / {}", outcome, collection.name, case.name);
        }
    }

    let rows: Vec<SummaryRow> = report
        .collections
        .iter()
        .map(|collection| SummaryRow {
            collection: collection.name.clone(),
            passed: collection.count(TestOutcome::Success),
            failed: collection.count(TestOutcome::Failure),
            skipped: collection.count(TestOutcome::Skipped),
        })
        .collect();

    println!("{}", Table::new(rows));
}

fn run_cycle(config: &HarnessConfig, server: &str, port: u16, extra: Vec<String>) -> Result<()> {
    let port = match port {
        0 => pick_unused_port().context("no unused port found on localhost")?,
        explicit => explicit,
    };

    let mut harness = Harness::new(config);

    // argv-style: leading label, then the real extras
    let mut args = vec![format!("cycle_{}", server)];
    args.extend(extra);

    if !server_startup(&mut harness.context_mut().servers, server, port, &args) {
        bail!("{} failed to start on port {}", server, port);
    }
    println!("[{}] {} on port {}", "UP".green(), server, port);

    harness.context_mut().servers.shutdown_all();
    println!("[{}] {} cycle complete", "DOWN".green(), server);

    Ok(())
}

fn run_probe(server: &str, host: &str, port: u16) -> Result<()> {
    let driver = match driver_for(server, host, port) {
        Some(driver) => driver,
        None => bail!("unknown server kind: {}", server),
    };

    let reachable = driver.ping();
    let pid = driver.probe_pid();

    let status = if reachable {
        "REACHABLE".green()
    } else {
        "UNREACHABLE".red()
    };
    println!("[{}] {} at {}:{}", status, server, host, port);

    if pid > 0 {
        println!("pid {}", pid);
    } else {
        println!("pid unknown");
    }

    if !reachable {
        bail!("{} did not answer at {}:{}", server, host, port);
    }
    Ok(())
}
