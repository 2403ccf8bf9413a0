// Bounded waiting
//
// Every wait in the harness is capped by a policy timeout; nothing
// here blocks forever. Used for pidfile appearance and readiness
// probing.

use std::time::{Duration, Instant};

use crate::application::constants::{
    READINESS_WAIT_TIMEOUT, WAIT_INITIAL_DELAY, WAIT_MAX_INTERVAL,
};

/// Retry/backoff policy for bounded waits.
#[derive(Debug, Clone)]
pub struct WaitPolicy {
    /// Overall cap on the wait.
    pub timeout: Duration,
    /// First sleep between probes.
    pub initial_delay: Duration,
    /// Ceiling the doubling backoff converges to.
    pub max_interval: Duration,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: READINESS_WAIT_TIMEOUT,
            initial_delay: WAIT_INITIAL_DELAY,
            max_interval: WAIT_MAX_INTERVAL,
        }
    }
}

impl WaitPolicy {
    /// Policy with a different overall timeout, keeping the backoff
    /// shape.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Blocking bounded wait with exponential backoff.
pub struct Wait {
    policy: WaitPolicy,
}

impl Wait {
    pub fn new(policy: WaitPolicy) -> Self {
        Self { policy }
    }

    /// Poll `probe` until it reports true or the policy timeout runs
    /// out. The interval doubles up to the policy ceiling, with a
    /// small deterministic jitter (seeded from the attempt counter) so
    /// several waiters do not poll in lockstep.
    pub fn until(&self, mut probe: impl FnMut() -> bool) -> bool {
        let started = Instant::now();
        let mut interval = self.policy.initial_delay;
        let mut attempt: u32 = 0;

        loop {
            if probe() {
                return true;
            }

            let remaining = self.policy.timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                return false;
            }

            // ±10% jitter
            let jitter_factor = 0.9 + f64::from(attempt % 21) / 100.0;
            let sleep_for = interval.mul_f64(jitter_factor).min(remaining);
            std::thread::sleep(sleep_for);

            interval = (interval * 2).min(self.policy.max_interval);
            attempt += 1;
        }
    }
}
