// Gearmand driver
//
// Gearmand's admin channel answers `getpid` and `version` directly,
// and its pidfile is dependable, so readiness can lean on it.

use std::path::{Path, PathBuf};

use tracing::error;

use testbed_core::domain::{Pid, ServerDescriptor};
use testbed_core::port::server_driver::{ServerDriver, NO_PID};

use crate::control::{ControlClient, PidCapture};

pub struct GearmandDriver {
    descriptor: ServerDescriptor,
    host: String,
    port: u16,
    pid_file: Option<PathBuf>,
}

impl GearmandDriver {
    pub fn new(host: impl Into<String>, port: u16, executable: impl Into<String>) -> Self {
        Self {
            descriptor: ServerDescriptor {
                name: "gearmand".to_string(),
                executable: executable.into(),
                port_option: "--port=".to_string(),
                pid_file_option: Some("--pid-file=".to_string()),
                daemon_option: Some("--daemon".to_string()),
                log_file_option: Some("--log-file=".to_string()),
                is_libtool: true,
                broken_pid_file: false,
            },
            host: host.into(),
            port,
            pid_file: None,
        }
    }

    fn client(&self) -> ControlClient {
        ControlClient::new(self.host.clone(), self.port)
    }
}

impl ServerDriver for GearmandDriver {
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
        let mut capture = PidCapture::new();

        if let Err(e) = self.client().roundtrip("getpid", &mut capture) {
            error!(
                server = "gearmand",
                host = %self.host,
                port = %self.port,
                error = %e,
                "Pid query failed"
            );
        }

        capture.pid()
    }

    fn ping(&self) -> bool {
        match self.client().query_line("version") {
            Ok(line) if line.starts_with("OK") => true,
            Ok(line) => {
                error!(server = "gearmand", response = %line, "Unexpected version response");
                false
            }
            Err(e) => {
                error!(
                    server = "gearmand",
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
        extra.to_vec()
    }
}
