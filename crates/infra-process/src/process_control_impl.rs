// Process control implementation
// Blocking signals-and-process-table adapter for the ProcessControl
// port.

use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use sysinfo::System;
use tracing::{info, warn};

use testbed_core::application::constants::{GRACEFUL_SHUTDOWN_TIMEOUT_MS, KILL_POLL_INTERVAL};
use testbed_core::domain::Pid;
use testbed_core::port::process_control::{ProcessControl, SpawnSpec, SuperviseError};
use testbed_core::port::TimeProvider;

/// Process control backed by Unix signals, with a sysinfo process
/// table for name corroboration.
pub struct UnixProcessControl {
    time_provider: Arc<dyn TimeProvider>,
    system: Mutex<System>,
}

impl UnixProcessControl {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            time_provider,
            system: Mutex::new(System::new()),
        }
    }

    /// SIGTERM first, then SIGKILL once the graceful window closes.
    #[cfg(unix)]
    fn kill_graceful(&self, pid: Pid) -> Result<(), SuperviseError> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid as NixPid;

        info!(pid = %pid, "Sending SIGTERM for graceful shutdown");
        if let Err(e) = kill(NixPid::from_raw(pid), Signal::SIGTERM) {
            if e == Errno::ESRCH {
                // Already gone
                return Ok(());
            }
            return Err(SuperviseError::KillFailed {
                pid,
                message: format!("SIGTERM failed: {}", e),
            });
        }

        let start_time = self.time_provider.now_millis();
        loop {
            std::thread::sleep(KILL_POLL_INTERVAL);

            // Signal 0 checks existence without sending anything
            if kill(NixPid::from_raw(pid), None).is_err() {
                info!(pid = %pid, "Process exited after SIGTERM");
                return Ok(());
            }

            if self.time_provider.now_millis() - start_time > GRACEFUL_SHUTDOWN_TIMEOUT_MS {
                warn!(pid = %pid, "Process did not exit after SIGTERM, sending SIGKILL");
                kill(NixPid::from_raw(pid), Signal::SIGKILL).map_err(|e| {
                    SuperviseError::KillFailed {
                        pid,
                        message: format!("SIGKILL failed: {}", e),
                    }
                })?;
                return Ok(());
            }
        }
    }

    #[cfg(windows)]
    fn kill_graceful(&self, pid: Pid) -> Result<(), SuperviseError> {
        info!(pid = %pid, "Killing process on Windows");
        let output = Command::new("taskkill")
            .args(["/F", "/PID", &pid.to_string()])
            .output()
            .map_err(|e| SuperviseError::KillFailed {
                pid,
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SuperviseError::KillFailed {
                pid,
                message: format!(
                    "taskkill failed: {}",
                    String::from_utf8_lossy(&output.stderr)
                ),
            });
        }

        Ok(())
    }
}

impl ProcessControl for UnixProcessControl {
    fn spawn(&self, spec: &SpawnSpec) -> Result<Pid, SuperviseError> {
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| SuperviseError::SpawnFailed {
            program: spec.program.clone(),
            message: e.to_string(),
        })?;
        let pid = child.id() as Pid;

        // Servers run with their daemon flag, so the immediate child
        // exits once the server has detached. Reap it here and surface
        // a non-zero exit as a spawn failure.
        let status = child
            .wait()
            .map_err(|e| SuperviseError::Io(e.to_string()))?;
        if !status.success() {
            return Err(SuperviseError::SpawnFailed {
                program: spec.program.clone(),
                message: format!("immediate child exited with {}", status),
            });
        }

        info!(program = %spec.program, pid = %pid, "Server process detached");
        Ok(pid)
    }

    fn kill(&self, pid: Pid) -> Result<(), SuperviseError> {
        self.kill_graceful(pid)
    }

    fn is_alive(&self, pid: Pid) -> bool {
        // pid 0 would address our own process group
        if pid <= 0 {
            return false;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::kill;
            use nix::unistd::Pid as NixPid;

            kill(NixPid::from_raw(pid), None).is_ok()
        }

        #[cfg(windows)]
        {
            let output = Command::new("tasklist")
                .args(["/FI", &format!("PID eq {}", pid), "/NH"])
                .output();

            match output {
                Ok(output) => {
                    String::from_utf8_lossy(&output.stdout).contains(&pid.to_string())
                }
                Err(_) => false,
            }
        }
    }

    fn matches_name(&self, pid: Pid, name: &str) -> bool {
        if pid <= 0 {
            return false;
        }

        let mut system = self.system.lock().unwrap();
        system.refresh_processes();

        match system.process(sysinfo::Pid::from_u32(pid as u32)) {
            Some(process) => {
                let process_name = process.name();
                // /proc comm truncates long names
                process_name == name || name.starts_with(process_name)
            }
            None => false,
        }
    }
}
