//! # Restart bookkeeping.
//!
//! [`RestartState`] is the supervisor's private counter pair: how many starts
//! happened since the last reset, and the last backoff delay. It turns worker
//! exits into a [`Decision`].
//!
//! ```text
//! before start:  cooldown()?  ──► Some(cfg.cooldown()) → sleep, reset()
//!                begin_attempt() → count += 1
//! after exit:    on_exit(exit)  ──► Stop | Restart { delay }
//! spawn error:   on_spawn_failure() (same as a crash)
//! ```
//!
//! ## Rules
//! - `count` resets on a pulled update and after a cooldown; the delay does not.
//! - Delays grow by `backoff.factor` per failed attempt and never exceed `backoff.max`.
//! - A clean exit stops under `OnFailure`/`Never`; under `Always` it restarts
//!   after `backoff.first` and restarts the delay sequence.

use std::time::Duration;

use crate::core::config::SupervisorConfig;
use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::workers::ChildExit;

/// What to do after an attempt ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Do not start the worker again.
    Stop,
    /// Start again after `delay` (before jitter).
    Restart {
        /// Backoff delay.
        delay: Duration,
    },
}

/// Restart counter and backoff memory of the supervisor loop.
#[derive(Clone, Debug)]
pub struct RestartState {
    restart: RestartPolicy,
    backoff: BackoffPolicy,
    ceiling: Option<u32>,
    cooldown: Duration,
    count: u32,
    prev_delay: Option<Duration>,
}

impl RestartState {
    /// Fresh state for the given configuration.
    pub fn new(cfg: &SupervisorConfig) -> Self {
        Self {
            restart: cfg.restart,
            backoff: cfg.backoff,
            ceiling: cfg.restart_ceiling(),
            cooldown: cfg.cooldown(),
            count: 0,
            prev_delay: None,
        }
    }

    /// Starts since the last reset.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Last backoff delay handed out, if any.
    pub fn delay(&self) -> Option<Duration> {
        self.prev_delay
    }

    /// Resets the start counter.
    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Cooldown to observe before the next start, if the ceiling was reached.
    pub fn cooldown(&self) -> Option<Duration> {
        match self.ceiling {
            Some(max) if self.count >= max => Some(self.cooldown),
            _ => None,
        }
    }

    /// Records a start and returns its 1-based number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.count = self.count.saturating_add(1);
        self.count
    }

    /// Decides what follows an exit.
    pub fn on_exit(&mut self, exit: ChildExit) -> Decision {
        let clean = exit.is_clean();
        if !self.restart.restarts_after(clean) {
            return Decision::Stop;
        }
        if clean {
            self.prev_delay = None;
            return Decision::Restart {
                delay: self.backoff.next(None),
            };
        }
        self.fail()
    }

    /// Decides what follows a spawn error; treated like a crash.
    pub fn on_spawn_failure(&mut self) -> Decision {
        if !self.restart.restarts_after(false) {
            return Decision::Stop;
        }
        self.fail()
    }

    fn fail(&mut self) -> Decision {
        let delay = self.backoff.next(self.prev_delay);
        self.prev_delay = Some(delay);
        Decision::Restart { delay }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(max_restarts: u32) -> RestartState {
        RestartState::new(&SupervisorConfig {
            max_restarts,
            ..SupervisorConfig::default()
        })
    }

    fn secs(n: u64) -> Decision {
        Decision::Restart {
            delay: Duration::from_secs(n),
        }
    }

    #[test]
    fn test_crash_schedules_restart_with_doubling_delay() {
        let mut st = state(0);
        let mut seen = Vec::new();
        for _ in 0..7 {
            st.begin_attempt();
            seen.push(st.on_exit(ChildExit::code(1)));
        }
        assert_eq!(seen, vec![secs(5), secs(10), secs(20), secs(40), secs(80), secs(120), secs(120)]);
        assert_eq!(st.cooldown(), None);
    }

    #[test]
    fn test_clean_exit_is_terminal() {
        let mut st = state(10);
        st.begin_attempt();
        assert_eq!(st.on_exit(ChildExit::code(0)), Decision::Stop);
    }

    #[test]
    fn test_signal_counts_as_crash() {
        let mut st = state(10);
        st.begin_attempt();
        assert_eq!(st.on_exit(ChildExit::signal(9)), secs(5));
    }

    #[test]
    fn test_ceiling_triggers_cooldown_after_tenth_start() {
        let mut st = state(10);
        for _ in 0..9 {
            st.begin_attempt();
            st.on_exit(ChildExit::code(1));
        }
        assert_eq!(st.count(), 9);
        assert_eq!(st.cooldown(), None);

        // Tenth start goes through, its crash still schedules a restart...
        assert_eq!(st.begin_attempt(), 10);
        assert_eq!(st.on_exit(ChildExit::code(1)), secs(120));

        // ...and the start after it waits out the cooldown first.
        assert_eq!(st.cooldown(), Some(Duration::from_secs(120)));
        st.reset();
        assert_eq!(st.cooldown(), None);
        assert_eq!(st.begin_attempt(), 1);
    }

    #[test]
    fn test_reset_keeps_delay() {
        let mut st = state(10);
        st.begin_attempt();
        st.on_exit(ChildExit::code(1));
        st.begin_attempt();
        st.on_exit(ChildExit::code(1));
        st.reset();
        assert_eq!(st.count(), 0);
        assert_eq!(st.delay(), Some(Duration::from_secs(10)));
        st.begin_attempt();
        assert_eq!(st.on_exit(ChildExit::code(2)), secs(20));
    }

    #[test]
    fn test_spawn_failure_uses_backoff() {
        let mut st = state(10);
        st.begin_attempt();
        assert_eq!(st.on_spawn_failure(), secs(5));
        st.begin_attempt();
        assert_eq!(st.on_spawn_failure(), secs(10));
        assert_eq!(st.count(), 2);
    }

    #[test]
    fn test_policies() {
        let mut never = RestartState::new(&SupervisorConfig {
            restart: RestartPolicy::Never,
            ..SupervisorConfig::default()
        });
        assert_eq!(never.on_exit(ChildExit::code(1)), Decision::Stop);
        assert_eq!(never.on_spawn_failure(), Decision::Stop);

        let mut always = RestartState::new(&SupervisorConfig {
            restart: RestartPolicy::Always,
            ..SupervisorConfig::default()
        });
        assert_eq!(always.on_exit(ChildExit::code(1)), secs(5));
        assert_eq!(always.on_exit(ChildExit::code(1)), secs(10));
        assert_eq!(always.on_exit(ChildExit::code(0)), secs(5));
        assert_eq!(always.on_exit(ChildExit::code(1)), secs(5));
    }
}
