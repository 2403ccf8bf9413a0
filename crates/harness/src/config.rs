// Harness configuration
// Built-in defaults layered under an optional testbed.toml and
// TESTBED_ environment overrides.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use testbed_core::application::supervise::LaunchOptions;
use testbed_core::application::wait::WaitPolicy;
use testbed_core::{HarnessError, Result};

/// Environment variable toggling local-only mode.
pub const LOCAL_VAR: &str = "TESTBED_LOCAL";

/// Override for the memcached executable path.
pub const MEMCACHED_BINARY_VAR: &str = "TESTBED_MEMCACHED_BINARY";

/// Override for the gearmand executable path.
pub const GEARMAND_BINARY_VAR: &str = "TESTBED_GEARMAND_BINARY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory for pidfiles and other per-run scratch files.
    pub scratch_dir: String,

    /// Directory for server-side log files; unset disables capture.
    pub log_dir: Option<String>,

    /// Overall readiness/pidfile wait timeout in milliseconds.
    pub wait_timeout_ms: u64,

    /// First delay of the readiness backoff in milliseconds.
    pub wait_initial_delay_ms: u64,

    /// Ceiling of the readiness backoff in milliseconds.
    pub wait_max_interval_ms: u64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let wait = WaitPolicy::default();
        Self {
            scratch_dir: default_scratch_dir(),
            log_dir: None,
            wait_timeout_ms: wait.timeout.as_millis() as u64,
            wait_initial_delay_ms: wait.initial_delay.as_millis() as u64,
            wait_max_interval_ms: wait.max_interval.as_millis() as u64,
        }
    }
}

impl HarnessConfig {
    /// Load defaults, an optional `testbed.toml` in the working
    /// directory, and `TESTBED_` environment overrides, in that order.
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&HarnessConfig::default())
            .map_err(|e| HarnessError::Config(e.to_string()))?;

        let merged = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name("testbed").required(false))
            .add_source(config::Environment::with_prefix("TESTBED"))
            .build()
            .map_err(|e| HarnessError::Config(e.to_string()))?;

        merged
            .try_deserialize()
            .map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Launch options for the supervision layer, with paths
    /// tilde-expanded.
    pub fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            scratch_dir: PathBuf::from(shellexpand::tilde(&self.scratch_dir).into_owned()),
            log_dir: self
                .log_dir
                .as_ref()
                .map(|dir| PathBuf::from(shellexpand::tilde(dir).into_owned())),
            wait: WaitPolicy {
                timeout: Duration::from_millis(self.wait_timeout_ms),
                initial_delay: Duration::from_millis(self.wait_initial_delay_ms),
                max_interval: Duration::from_millis(self.wait_max_interval_ms),
            },
        }
    }
}

fn default_scratch_dir() -> String {
    ProjectDirs::from("", "", "testbed")
        .map(|dirs| dirs.cache_dir().join("run").display().to_string())
        .unwrap_or_else(|| std::env::temp_dir().join("testbed").display().to_string())
}

/// Process-environment accessor.
///
/// Flags are read on every call, never cached, so a test can set a
/// variable and observe the predicate flip immediately.
pub struct Environment;

impl Environment {
    /// Local-only mode: `TESTBED_LOCAL` set to anything but empty,
    /// `0`, or `false`.
    pub fn is_local() -> bool {
        Self::truthy(LOCAL_VAR)
    }

    fn truthy(var: &str) -> bool {
        match std::env::var(var) {
            Ok(value) => {
                let value = value.trim();
                !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_the_wait_policy() {
        let config = HarnessConfig::default();
        let options = config.launch_options();

        assert_eq!(options.wait.timeout, WaitPolicy::default().timeout);
        assert!(options.log_dir.is_none());
        assert!(!config.scratch_dir.is_empty());
    }

    #[test]
    fn launch_options_expand_tildes() {
        let config = HarnessConfig {
            scratch_dir: "~/testbed-scratch".to_string(),
            ..HarnessConfig::default()
        };

        let options = config.launch_options();
        assert!(!options.scratch_dir.display().to_string().contains('~'));
    }

    // Set/unset assertions share one test: the variable is process
    // state and the predicate must track it immediately either way.
    #[test]
    fn local_mode_tracks_the_environment_lazily() {
        std::env::remove_var(LOCAL_VAR);
        assert!(!Environment::is_local());

        std::env::set_var(LOCAL_VAR, "1");
        assert!(Environment::is_local());

        std::env::set_var(LOCAL_VAR, "0");
        assert!(!Environment::is_local());

        std::env::set_var(LOCAL_VAR, "false");
        assert!(!Environment::is_local());

        std::env::set_var(LOCAL_VAR, "yes");
        assert!(Environment::is_local());

        std::env::remove_var(LOCAL_VAR);
        assert!(!Environment::is_local());
    }
}
