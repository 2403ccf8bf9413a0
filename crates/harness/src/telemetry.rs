//! Logging setup for harness runs

use std::sync::Once;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize the tracing stack once per process.
///
/// # Environment Variables
///
/// - `TESTBED_LOG_FORMAT`: `pretty` (default) or `json`
/// - `TESTBED_LOG_DIR`: adds a daily-rolling plain-text file layer
/// - `RUST_LOG`: standard filter directives (default `info`)
///
/// Safe to call from every entry point; later calls are no-ops, and a
/// subscriber installed by someone else wins quietly.
pub fn init_logging() {
    INIT.call_once(|| {
        let log_format =
            std::env::var("TESTBED_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let file_layer = std::env::var("TESTBED_LOG_DIR").ok().map(|dir| {
            let appender = tracing_appender::rolling::daily(dir, "testbed.log");
            fmt::layer().with_ansi(false).with_writer(appender)
        });

        let registry = tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer);

        match log_format.as_str() {
            "json" => {
                let _ = registry.with(fmt::layer().json()).try_init();
            }
            _ => {
                let _ = registry.with(fmt::layer().pretty()).try_init();
            }
        }
    });
}
