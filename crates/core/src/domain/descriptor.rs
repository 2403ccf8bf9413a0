// Server descriptor - identifying constants for one external binary

use serde::{Deserialize, Serialize};

/// OS process id.
///
/// Wire-level captures use `-1` as the "no pid" sentinel; everything
/// above that layer carries `Option<Pid>` instead. A pid is transient
/// and re-derived on each liveness check, never cached beyond a single
/// call.
pub type Pid = i32;

/// Identifying constants and start-up quirks for one external server
/// binary.
///
/// Constructed once per driver; owns no process state. Actual spawning
/// and monitoring goes through the supervision layer.
///
/// Option strings carry their own joining convention: a trailing `=`
/// means the value is glued on (`--port=9998`), otherwise the value
/// becomes a separate argument (`-p 9998`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDescriptor {
    /// Binary name, also the key used to register its driver factory.
    pub name: String,

    /// Executable path resolved at driver construction.
    pub executable: String,

    /// Option passing the listen port.
    pub port_option: String,

    /// Option passing the pidfile path; `None` means the binary cannot
    /// write one.
    pub pid_file_option: Option<String>,

    /// Option switching the binary into daemon mode.
    pub daemon_option: Option<String>,

    /// Option passing a log-file path; `None` means unsupported.
    pub log_file_option: Option<String>,

    /// Binary is a libtool wrapper script rather than a real ELF.
    pub is_libtool: bool,

    /// The pidfile cannot be trusted as a readiness signal and must be
    /// corroborated by a live probe.
    pub broken_pid_file: bool,
}
