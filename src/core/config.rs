//! # Supervisor configuration.
//!
//! [`SupervisorConfig`] holds the knobs of the restart loop and the memory
//! watchdog. It is usually derived from the environment by
//! [`Config::supervisor`](crate::Config::supervisor), but can be built by hand.
//!
//! ## Sentinel values
//! - `max_restarts = 0` → no restart ceiling, never cool down
//! - `memory_limit = 0` → memory watchdog disabled
//! - `memory_interval = 0s` → memory watchdog disabled

use std::time::Duration;

use crate::memory::MemoryScope;
use crate::policies::{BackoffPolicy, RestartPolicy};

/// Configuration for the supervisor loop.
///
/// ## Field semantics
/// - `grace`: maximum wait for the worker to exit after a shutdown kill
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `max_restarts`: starts allowed before a cooldown (`0` = unlimited)
/// - `restart`: when to restart after an exit
/// - `backoff`: delay growth between restarts; `backoff.max` is also the cooldown
/// - `memory_limit`: resident bytes above which the worker is restarted (`0` = off)
/// - `memory_interval`: sampling period of the watchdog (`0s` = off)
/// - `memory_scope`: which process is measured
/// - `handle_signals`: listen for SIGINT/SIGTERM/SIGQUIT in `run()`
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum time to wait for the worker to exit during shutdown.
    ///
    /// Exceeding it makes `run()` return `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Number of starts before the crash-loop cooldown kicks in.
    pub max_restarts: u32,

    /// Restart policy for the worker.
    pub restart: RestartPolicy,

    /// Backoff policy for restarts.
    pub backoff: BackoffPolicy,

    /// Memory limit in bytes.
    pub memory_limit: u64,

    /// Memory sampling period.
    pub memory_interval: Duration,

    /// Process measured by the watchdog.
    pub memory_scope: MemoryScope,

    /// Whether `run()` installs OS signal handlers.
    pub handle_signals: bool,
}

impl SupervisorConfig {
    /// Restart ceiling as an `Option` (`None` = unlimited).
    #[inline]
    pub fn restart_ceiling(&self) -> Option<u32> {
        if self.max_restarts == 0 {
            None
        } else {
            Some(self.max_restarts)
        }
    }

    /// Length of the crash-loop cooldown: the backoff cap.
    #[inline]
    pub fn cooldown(&self) -> Duration {
        self.backoff.max
    }

    /// Watchdog settings as `(limit_bytes, period)`, or `None` when disabled.
    #[inline]
    pub fn memory_watch(&self) -> Option<(u64, Duration)> {
        if self.memory_limit == 0 || self.memory_interval.is_zero() {
            None
        } else {
            Some((self.memory_limit, self.memory_interval))
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for SupervisorConfig {
    /// Classic launcher defaults:
    ///
    /// - `grace = 10s`
    /// - `bus_capacity = 1024`
    /// - `max_restarts = 10`
    /// - `restart = RestartPolicy::OnFailure`
    /// - `backoff = BackoffPolicy::default()` (5s doubling up to 120s)
    /// - `memory_limit = 1500 MiB`, sampled every 10s on the worker
    /// - `handle_signals = true`
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            max_restarts: 10,
            restart: RestartPolicy::default(),
            backoff: BackoffPolicy::default(),
            memory_limit: 1500 * 1024 * 1024,
            memory_interval: Duration::from_secs(10),
            memory_scope: MemoryScope::default(),
            handle_signals: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        let mut cfg = SupervisorConfig::default();
        assert_eq!(cfg.restart_ceiling(), Some(10));
        assert_eq!(cfg.cooldown(), Duration::from_secs(120));
        assert_eq!(
            cfg.memory_watch(),
            Some((1500 * 1024 * 1024, Duration::from_secs(10)))
        );

        cfg.max_restarts = 0;
        cfg.memory_limit = 0;
        cfg.bus_capacity = 0;
        assert_eq!(cfg.restart_ceiling(), None);
        assert_eq!(cfg.memory_watch(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
