// Supervision - launch one external server and own it until shutdown
//
// The drivers supply constants and probes; everything process-shaped
// goes through the ProcessControl port.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::wait::{Wait, WaitPolicy};
use crate::domain::Pid;
use crate::port::process_control::{ProcessControl, SpawnSpec, SuperviseError};
use crate::port::server_driver::ServerDriver;

/// Per-launch knobs fed from the harness configuration.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Directory receiving pidfiles and other per-instance scratch
    /// files; created on demand.
    pub scratch_dir: PathBuf,
    /// Directory receiving server log files, for binaries that support
    /// one. `None` disables server-side log capture.
    pub log_dir: Option<PathBuf>,
    /// Bounded-wait policy for readiness probing.
    pub wait: WaitPolicy,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("testbed"),
            log_dir: None,
            wait: WaitPolicy::default(),
        }
    }
}

/// Append `option value`, honoring the option's joining convention: a
/// trailing `=` glues the value on, otherwise it becomes a separate
/// argument.
fn push_option(args: &mut Vec<String>, option: &str, value: &str) {
    if let Some(prefix) = option.strip_suffix('=') {
        args.push(format!("{}={}", prefix, value));
    } else {
        args.push(option.to_string());
        args.push(value.to_string());
    }
}

/// Parse a pidfile: trimmed integer, positive or nothing.
pub fn read_pid_file(path: &Path) -> Option<Pid> {
    let contents = std::fs::read_to_string(path).ok()?;
    let pid = contents.trim().parse::<Pid>().ok()?;
    (pid > 0).then_some(pid)
}

/// Spawn one server and block until it is ready (or provably not).
///
/// Readiness rules:
/// - a driver with a broken pidfile is ready only once the pidfile
///   exists AND a live ping succeeds (the driver's ping blocks on the
///   pidfile first);
/// - a driver with a trusted pidfile is ready when the pidfile names a
///   live process with the right executable, with ping retries as the
///   fallback.
///
/// On readiness failure the spawned process is killed best-effort
/// before the error is returned.
pub fn launch(
    mut driver: Box<dyn ServerDriver>,
    control: Arc<dyn ProcessControl>,
    options: &LaunchOptions,
    extra_args: &[String],
) -> Result<RunningServer, SuperviseError> {
    let descriptor = driver.descriptor().clone();
    let port = driver.port();

    std::fs::create_dir_all(&options.scratch_dir)
        .map_err(|e| SuperviseError::Io(format!("scratch dir: {}", e)))?;

    let mut args: Vec<String> = Vec::new();
    if let Some(daemon) = &descriptor.daemon_option {
        args.push(daemon.clone());
    }
    push_option(&mut args, &descriptor.port_option, &port.to_string());

    if let Some(option) = &descriptor.pid_file_option {
        let pid_file = options
            .scratch_dir
            .join(format!("{}-{}.pid", descriptor.name, Uuid::new_v4()));
        push_option(&mut args, option, &pid_file.display().to_string());
        driver.set_pid_file(pid_file);
    }

    if let (Some(option), Some(log_dir)) = (&descriptor.log_file_option, &options.log_dir) {
        std::fs::create_dir_all(log_dir)
            .map_err(|e| SuperviseError::Io(format!("log dir: {}", e)))?;
        let log_file = log_dir.join(format!("{}-{}.log", descriptor.name, port));
        push_option(&mut args, option, &log_file.display().to_string());
    }

    args.extend(driver.build_args(extra_args));

    debug!(
        server = %descriptor.name,
        executable = %descriptor.executable,
        is_libtool = descriptor.is_libtool,
        args = ?args,
        "Assembled server command line"
    );

    let spec = SpawnSpec {
        program: descriptor.executable.clone(),
        args,
        working_dir: None,
    };
    let spawn_pid = control.spawn(&spec)?;

    let ready = if descriptor.broken_pid_file {
        Wait::new(options.wait.clone()).until(|| driver.ping())
    } else {
        let pid = driver.probe_pid();
        if pid > 0 && control.is_alive(pid) && control.matches_name(pid, &descriptor.name) {
            true
        } else {
            Wait::new(options.wait.clone()).until(|| driver.ping())
        }
    };

    if !ready {
        error!(
            server = %descriptor.name,
            port = %port,
            "Server never became ready"
        );
        let _ = control.kill(spawn_pid);
        if let Some(pid) = driver.pid_file().and_then(read_pid_file) {
            let _ = control.kill(pid);
        }
        return Err(SuperviseError::NeverReady {
            name: descriptor.name.clone(),
            port,
        });
    }

    let pid = driver
        .pid_file()
        .and_then(read_pid_file)
        .filter(|pid| control.is_alive(*pid))
        .or_else(|| {
            let probed = driver.probe_pid();
            (probed > 0).then_some(probed)
        })
        .unwrap_or(spawn_pid);

    info!(
        server = %descriptor.name,
        port = %port,
        pid = %pid,
        "Server is up"
    );

    Ok(RunningServer {
        driver,
        control,
        pid,
        shut_down: false,
    })
}

/// One supervised server instance.
///
/// Dropping a running server shuts it down best-effort, so a
/// panicking test cannot leak processes.
pub struct RunningServer {
    driver: Box<dyn ServerDriver>,
    control: Arc<dyn ProcessControl>,
    pid: Pid,
    shut_down: bool,
}

impl RunningServer {
    pub fn name(&self) -> &str {
        &self.driver.descriptor().name
    }

    pub fn port(&self) -> u16 {
        self.driver.port()
    }

    /// Pid recorded at launch. Liveness checks re-derive the current
    /// pid instead of trusting this one.
    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn ping(&self) -> bool {
        self.driver.ping()
    }

    /// Stop the server: current pid from the pidfile when it still
    /// names a live process, else the launch-time pid; then a graceful
    /// kill and pidfile cleanup.
    pub fn shutdown(&mut self) -> Result<(), SuperviseError> {
        if self.shut_down {
            return Ok(());
        }

        let pid = self
            .driver
            .pid_file()
            .and_then(read_pid_file)
            .filter(|pid| self.control.is_alive(*pid))
            .unwrap_or(self.pid);

        info!(server = %self.name(), pid = %pid, "Stopping server");
        let result = self.control.kill(pid);

        if let Some(path) = self.driver.pid_file() {
            let _ = std::fs::remove_file(path);
        }

        self.shut_down = true;
        result
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if !self.shut_down {
            if let Err(e) = self.shutdown() {
                warn!(server = %self.name(), error = %e, "Shutdown on drop failed");
            }
        }
    }
}
