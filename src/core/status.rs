//! # Status board shared with the health server.
//!
//! The supervisor loop is the only writer; HTTP handlers read copies.
//!
//! ```text
//! Supervisor loop ──update()──► StatusBoard (RwLock<StatusSnapshot>) ◄──snapshot()── /health, /status
//! ```

use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Where the supervisor loop currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Not started yet.
    #[default]
    Idle,
    /// Pulling updates / spawning.
    Starting,
    /// Worker process is alive.
    Running,
    /// Waiting out the crash-loop cooldown.
    Cooldown,
    /// Waiting before the next restart.
    Backoff,
    /// No more restarts (clean exit, policy, or shutdown).
    Stopped,
}

/// Point-in-time copy of the supervisor status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Current phase.
    pub phase: Phase,
    /// Starts since the last reset (what `/health` reports as `restarts`).
    pub restarts: u32,
    /// Starts since the launcher came up; never reset.
    pub attempts_total: u64,
    /// Pid of the running worker.
    pub child_pid: Option<u32>,
    /// Exit code of the last finished attempt.
    pub last_exit_code: Option<i32>,
    /// Delay of the pending restart or cooldown, in ms.
    pub restart_delay_ms: Option<u64>,
}

/// Lock-protected [`StatusSnapshot`] plus the launcher start time.
#[derive(Debug)]
pub struct StatusBoard {
    started: Instant,
    inner: RwLock<StatusSnapshot>,
}

impl StatusBoard {
    /// Creates a board in the `Idle` phase; uptime starts now.
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            inner: RwLock::new(StatusSnapshot::default()),
        }
    }

    /// Time since the board was created.
    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }

    /// Copy of the current status.
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mutates the status in place.
    pub fn update(&self, f: impl FnOnce(&mut StatusSnapshot)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    /// Shorthand for a phase change.
    pub fn set_phase(&self, phase: Phase) {
        self.update(|s| s.phase = phase);
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_and_serialize() {
        let board = StatusBoard::new();
        board.update(|s| {
            s.phase = Phase::Running;
            s.restarts = 2;
            s.attempts_total = 5;
            s.child_pid = Some(42);
        });
        let snap = board.snapshot();
        assert_eq!(snap.restarts, 2);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "running");
        assert_eq!(json["attemptsTotal"], 5);
        assert_eq!(json["childPid"], 42);
        assert!(json["lastExitCode"].is_null());
    }
}
