// Memcached driver
//
// Memcached writes its pidfile before the listener is up, so the
// pidfile is marked broken and readiness additionally requires a live
// ping.

use std::path::{Path, PathBuf};

use tracing::error;

use testbed_core::application::wait::{Wait, WaitPolicy};
use testbed_core::domain::{Pid, ServerDescriptor};
use testbed_core::port::server_driver::{ServerDriver, NO_PID};

use crate::control::{ControlClient, ProbeError};

pub struct MemcachedDriver {
    descriptor: ServerDescriptor,
    host: String,
    port: u16,
    pid_file: Option<PathBuf>,
    wait_policy: WaitPolicy,
}

impl MemcachedDriver {
    pub fn new(host: impl Into<String>, port: u16, executable: impl Into<String>) -> Self {
        Self {
            descriptor: ServerDescriptor {
                name: "memcached".to_string(),
                executable: executable.into(),
                port_option: "-p".to_string(),
                pid_file_option: Some("-P".to_string()),
                daemon_option: Some("-d".to_string()),
                log_file_option: None,
                is_libtool: false,
                broken_pid_file: true,
            },
            host: host.into(),
            port,
            pid_file: None,
            wait_policy: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = policy;
        self
    }

    fn client(&self) -> ControlClient {
        ControlClient::new(self.host.clone(), self.port)
    }

    /// Memcached is slow to start; until the pidfile exists a probe is
    /// not worth attempting.
    fn await_pid_file(&self) -> bool {
        let Some(path) = &self.pid_file else {
            return true;
        };

        if Wait::new(self.wait_policy.clone()).until(|| path.exists()) {
            return true;
        }

        error!(pid_file = %path.display(), "Pidfile was not found");
        false
    }

    /// `stats` carries the daemon's own pid as `STAT pid N`.
    fn query_pid(&self) -> Result<Pid, ProbeError> {
        let lines = self.client().query_until("stats", "END")?;

        for line in &lines {
            let mut parts = line.split_whitespace();
            if parts.next() == Some("STAT") && parts.next() == Some("pid") {
                if let Some(pid) = parts.next().and_then(|v| v.parse::<Pid>().ok()) {
                    if pid > 0 {
                        return Ok(pid);
                    }
                }
            }
        }

        Err(ProbeError::Protocol {
            addr: format!("{}:{}", self.host, self.port),
            response: "stats response carried no pid".to_string(),
        })
    }
}

impl ServerDriver for MemcachedDriver {
    fn descriptor(&self) -> &ServerDescriptor {
        &self.descriptor
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn pid_file(&self) -> Option<&Path> {
        self.pid_file.as_deref()
    }

    fn set_pid_file(&mut self, path: PathBuf) {
        self.pid_file = Some(path);
    }

    fn probe_pid(&self) -> Pid {
        if !self.await_pid_file() {
            return NO_PID;
        }

        match self.query_pid() {
            Ok(pid) => pid,
            Err(e) => {
                error!(
                    server = "memcached",
                    host = %self.host,
                    port = %self.port,
                    error = %e,
                    "Pid query failed"
                );
                NO_PID
            }
        }
    }

    fn ping(&self) -> bool {
        if !self.await_pid_file() {
            return false;
        }

        match self.client().query_line("version") {
            Ok(line) if line.starts_with("VERSION") => true,
            Ok(line) => {
                error!(server = "memcached", response = %line, "Unexpected version response");
                false
            }
            Err(e) => {
                error!(
                    server = "memcached",
                    host = %self.host,
                    port = %self.port,
                    error = %e,
                    "Ping failed"
                );
                false
            }
        }
    }

    fn build_args(&self, extra: &[String]) -> Vec<String> {
        let mut args = Vec::new();

        // memcached refuses to run as root without an explicit
        // run-as user
        if running_as_root() {
            args.push("-u".to_string());
            args.push("root".to_string());
        }

        args.extend(extra.iter().cloned());
        args
    }
}

#[cfg(unix)]
fn running_as_root() -> bool {
    nix::unistd::getuid().is_root() || nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
fn running_as_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixture::serve;
    use std::time::Duration;

    fn driver(port: u16) -> MemcachedDriver {
        MemcachedDriver::new("127.0.0.1", port, "/usr/bin/memcached")
            .with_wait_policy(WaitPolicy::with_timeout(Duration::from_millis(100)))
    }

    #[test]
    fn descriptor_carries_the_memcached_vocabulary() {
        let driver = driver(9998);
        let descriptor = driver.descriptor();

        assert_eq!(descriptor.name, "memcached");
        assert_eq!(descriptor.port_option, "-p");
        assert_eq!(descriptor.pid_file_option.as_deref(), Some("-P"));
        assert_eq!(descriptor.daemon_option.as_deref(), Some("-d"));
        assert!(descriptor.log_file_option.is_none());
        assert!(!descriptor.is_libtool);
        assert!(descriptor.broken_pid_file);
    }

    #[test]
    fn build_args_appends_extra_verbatim() {
        let driver = driver(9998);
        let extra = vec!["-m".to_string(), "64".to_string()];

        let args = driver.build_args(&extra);

        if running_as_root() {
            assert_eq!(args, vec!["-u", "root", "-m", "64"]);
        } else {
            assert_eq!(args, extra);
        }
    }

    #[test]
    fn build_args_without_extras_only_carries_the_root_quirk() {
        let driver = driver(9998);
        let args = driver.build_args(&[]);

        if running_as_root() {
            assert_eq!(args, vec!["-u", "root"]);
        } else {
            assert!(args.is_empty());
        }
    }

    #[test]
    fn probe_pid_parses_the_stats_line() {
        let (port, handle) = serve(1, |command| {
            assert_eq!(command, "stats");
            "STAT uptime 3\r\nSTAT pid 31337\r\nSTAT version 1.6.21\r\nEND\r\n".to_string()
        });

        assert_eq!(driver(port).probe_pid(), 31337);
        handle.join().unwrap();
    }

    #[test]
    fn probe_pid_without_a_pid_line_is_the_sentinel() {
        let (port, handle) = serve(1, |_| "STAT uptime 3\r\nEND\r\n".to_string());

        assert_eq!(driver(port).probe_pid(), NO_PID);
        handle.join().unwrap();
    }

    #[test]
    fn ping_accepts_a_version_banner() {
        let (port, handle) = serve(1, |command| {
            assert_eq!(command, "version");
            "VERSION 1.6.21\r\n".to_string()
        });

        assert!(driver(port).ping());
        handle.join().unwrap();
    }

    #[test]
    fn ping_rejects_a_dead_port() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        assert!(!driver(port).ping());
    }

    #[test]
    fn a_missing_pidfile_fails_the_probe_before_any_io() {
        let mut driver = driver(9998);
        driver.set_pid_file(PathBuf::from("/nonexistent/testbed-missing.pid"));

        assert_eq!(driver.probe_pid(), NO_PID);
        assert!(!driver.ping());
    }
}
