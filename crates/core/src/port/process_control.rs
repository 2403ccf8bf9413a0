// Process control port
// Abstraction over spawning, probing, and killing external processes.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::Pid;

/// What to spawn: program plus argv, optional working directory.
///
/// Servers are always launched with their daemon flag, so the
/// immediate child is expected to exit once the server has detached.
#[derive(Debug, Clone, Default)]
pub struct SpawnSpec {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

/// Supervision errors
#[derive(Error, Debug)]
pub enum SuperviseError {
    #[error("Spawn failed for {program}: {message}")]
    SpawnFailed { program: String, message: String },

    #[error("Kill failed for pid {pid}: {message}")]
    KillFailed { pid: Pid, message: String },

    #[error("Server {name} never became ready on port {port}")]
    NeverReady { name: String, port: u16 },

    #[error("IO error: {0}")]
    Io(String),
}

/// Process control trait
///
/// Implementations:
/// - UnixProcessControl: signals and the process table
/// - mocks::MockProcessControl: scripted, for tests
pub trait ProcessControl: Send + Sync {
    /// Spawn a detached server and return the immediate child's pid.
    ///
    /// For daemonizing servers the authoritative pid comes from the
    /// pidfile or a service query afterwards, not from this value.
    ///
    /// # Errors
    /// - SuperviseError::SpawnFailed if the process cannot be started
    ///   or its immediate child exits non-zero
    fn spawn(&self, spec: &SpawnSpec) -> Result<Pid, SuperviseError>;

    /// Terminate gracefully, then forcefully after a bounded wait.
    ///
    /// # Errors
    /// - SuperviseError::KillFailed if neither step lands
    fn kill(&self, pid: Pid) -> Result<(), SuperviseError>;

    /// Check whether a process with this pid currently exists.
    fn is_alive(&self, pid: Pid) -> bool;

    /// Process-table corroboration: does `pid` name a process whose
    /// executable matches `name`? Guards against a stale pidfile
    /// pointing at a reused pid.
    fn matches_name(&self, pid: Pid, name: &str) -> bool;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Mock process control for supervision and pool tests.
    ///
    /// Spawns hand out sequential pids and are recorded together with
    /// their specs; kills remove pids from the alive set.
    pub struct MockProcessControl {
        next_pid: Mutex<Pid>,
        spawned: Mutex<Vec<SpawnSpec>>,
        killed: Mutex<Vec<Pid>>,
        alive: Mutex<HashSet<Pid>>,
        spawn_failure: Option<String>,
    }

    impl MockProcessControl {
        pub fn new() -> Self {
            Self {
                next_pid: Mutex::new(1000),
                spawned: Mutex::new(Vec::new()),
                killed: Mutex::new(Vec::new()),
                alive: Mutex::new(HashSet::new()),
                spawn_failure: None,
            }
        }

        /// Every spawn fails with this message.
        pub fn new_failing(message: impl Into<String>) -> Self {
            Self {
                spawn_failure: Some(message.into()),
                ..Self::new()
            }
        }

        pub fn spawned(&self) -> Vec<SpawnSpec> {
            self.spawned.lock().unwrap().clone()
        }

        pub fn killed(&self) -> Vec<Pid> {
            self.killed.lock().unwrap().clone()
        }

        pub fn mark_alive(&self, pid: Pid) {
            self.alive.lock().unwrap().insert(pid);
        }
    }

    impl Default for MockProcessControl {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProcessControl for MockProcessControl {
        fn spawn(&self, spec: &SpawnSpec) -> Result<Pid, SuperviseError> {
            if let Some(message) = &self.spawn_failure {
                return Err(SuperviseError::SpawnFailed {
                    program: spec.program.clone(),
                    message: message.clone(),
                });
            }

            let mut next = self.next_pid.lock().unwrap();
            let pid = *next;
            *next += 1;

            self.spawned.lock().unwrap().push(spec.clone());
            self.alive.lock().unwrap().insert(pid);
            Ok(pid)
        }

        fn kill(&self, pid: Pid) -> Result<(), SuperviseError> {
            self.killed.lock().unwrap().push(pid);
            self.alive.lock().unwrap().remove(&pid);
            Ok(())
        }

        fn is_alive(&self, pid: Pid) -> bool {
            self.alive.lock().unwrap().contains(&pid)
        }

        fn matches_name(&self, pid: Pid, _name: &str) -> bool {
            self.is_alive(pid)
        }
    }
}
