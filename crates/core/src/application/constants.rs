// Harness constants (no magic values inline)
use std::time::Duration;

/// Overall bound on waiting for a pidfile or readiness probe (5s)
pub const READINESS_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// First delay in the bounded-wait backoff loop (10ms)
pub const WAIT_INITIAL_DELAY: Duration = Duration::from_millis(10);

/// Ceiling for the bounded-wait backoff interval (500ms)
pub const WAIT_MAX_INTERVAL: Duration = Duration::from_millis(500);

/// Graceful process shutdown timeout before escalating to a hard kill
/// (5 seconds)
pub const GRACEFUL_SHUTDOWN_TIMEOUT_MS: i64 = 5000;

/// Poll interval while waiting for a terminated process to exit (100ms)
pub const KILL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Connect/read timeout for liveness and pid probes (2s)
pub const PROBE_IO_TIMEOUT: Duration = Duration::from_secs(2);
