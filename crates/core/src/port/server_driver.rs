// Server driver port
// The polymorphic surface the supervision layer uses to identify,
// probe, and argue with one kind of external server binary.

use std::path::{Path, PathBuf};

use crate::domain::{Pid, ServerDescriptor};

/// Sentinel returned by `probe_pid` when no valid pid could be
/// obtained.
pub const NO_PID: Pid = -1;

/// Per-binary adapter consumed by the supervision layer.
///
/// Probe failures are reported to the logging sink and signaled
/// through the sentinel/boolean returns; drivers never panic and never
/// return errors across this boundary.
pub trait ServerDriver: Send + Sync {
    /// Identifying constants for the binary.
    fn descriptor(&self) -> &ServerDescriptor;

    fn host(&self) -> &str;

    fn port(&self) -> u16;

    /// Pidfile path assigned by the supervision layer at launch.
    fn pid_file(&self) -> Option<&Path>;

    fn set_pid_file(&mut self, path: PathBuf);

    /// Query the live service for its process id.
    ///
    /// Returns [`NO_PID`] when the pidfile never appeared or the
    /// service query failed; the failure classification is logged.
    fn probe_pid(&self) -> Pid;

    /// Liveness probe against host:port.
    fn ping(&self) -> bool;

    /// Extra command-line arguments appended at spawn.
    ///
    /// Always succeeds; caller-supplied arguments are passed through
    /// verbatim, in order, after any driver-injected quirk flags.
    fn build_args(&self, extra: &[String]) -> Vec<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted driver for supervision and pool tests.
    ///
    /// The descriptor carries no pidfile option so tests stay off the
    /// filesystem; readiness is driven entirely by the ping script.
    pub struct MockServerDriver {
        descriptor: ServerDescriptor,
        host: String,
        port: u16,
        pid_file: Option<PathBuf>,
        ping_script: Mutex<VecDeque<bool>>,
        ping_default: bool,
        ping_calls: AtomicUsize,
        pid: Pid,
    }

    impl MockServerDriver {
        pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
            let name = name.into();
            Self {
                descriptor: ServerDescriptor {
                    executable: format!("/usr/bin/{}", name),
                    name,
                    port_option: "--port=".to_string(),
                    pid_file_option: None,
                    daemon_option: Some("--daemon".to_string()),
                    log_file_option: None,
                    is_libtool: false,
                    broken_pid_file: true,
                },
                host: host.into(),
                port,
                pid_file: None,
                ping_script: Mutex::new(VecDeque::new()),
                ping_default: true,
                ping_calls: AtomicUsize::new(0),
                pid: NO_PID,
            }
        }

        /// Scripted ping results consumed one per call; once drained,
        /// every further call answers `default`.
        pub fn with_ping_script(mut self, script: Vec<bool>, default: bool) -> Self {
            self.ping_script = Mutex::new(script.into());
            self.ping_default = default;
            self
        }

        pub fn with_pid(mut self, pid: Pid) -> Self {
            self.pid = pid;
            self
        }

        pub fn ping_calls(&self) -> usize {
            self.ping_calls.load(Ordering::SeqCst)
        }
    }

    impl ServerDriver for MockServerDriver {
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
            self.pid
        }

        fn ping(&self) -> bool {
            self.ping_calls.fetch_add(1, Ordering::SeqCst);
            self.ping_script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.ping_default)
        }

        fn build_args(&self, extra: &[String]) -> Vec<String> {
            extra.to_vec()
        }
    }
}
