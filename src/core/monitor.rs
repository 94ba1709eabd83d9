//! # Watch one running worker until it exits.
//!
//! [`Monitor::watch`] is the body of the `Running` phase. It waits for the
//! worker to exit while a memory timer ticks and the shutdown token is armed.
//!
//! ```text
//! loop select! {
//!   child.wait()      → Exited(status)                       → return
//!   ticker.tick()     → sample memory
//!                         ├─ under limit → MemorySampled
//!                         └─ over limit  → MemoryLimitExceeded
//!                                          → backup snapshot (BackupCreated/BackupFailed)
//!                                          → child.kill(), stop ticking
//!   token.cancelled() → kill, wait up to grace               → return
//! }
//! ```
//!
//! ## Rules
//! - The timer lives inside this call, so it can never outlive its child.
//! - The backup completes **before** the kill is sent.
//! - Sampling failures are reported and skipped for that tick.
//! - The first sample is taken one full period after the spawn.

use std::time::Duration;

use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::backup::BackupSet;
use crate::core::config::SupervisorConfig;
use crate::error::{ChildError, ProbeError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::memory::{MemoryProbe, MemoryScope};
use crate::workers::{ChildExit, RunningWorker};

/// How watching ended.
pub(crate) enum Outcome {
    /// The worker exited on its own or after a memory kill.
    Exited(Result<ChildExit, ChildError>),
    /// Shutdown was requested; the worker was killed.
    Shutdown(Result<(), RuntimeError>),
}

enum Step {
    Exited(Result<ChildExit, ChildError>),
    Tick,
    Shutdown,
}

/// Borrowed view of what watching a worker needs.
pub(crate) struct Monitor<'a> {
    pub cfg: &'a SupervisorConfig,
    pub bus: &'a Bus,
    pub probe: &'a dyn MemoryProbe,
    pub backup: Option<&'a BackupSet>,
    pub token: &'a CancellationToken,
}

impl Monitor<'_> {
    /// Watches `child` until it exits or shutdown is requested.
    pub async fn watch(&self, child: &mut dyn RunningWorker) -> Outcome {
        let watch = self.cfg.memory_watch();
        let mut ticker = watch.map(|(_, period)| ticker(period));
        let mut killing = false;

        loop {
            let step = tokio::select! {
                res = child.wait() => Step::Exited(res),
                _ = tick(&mut ticker), if !killing => Step::Tick,
                _ = self.token.cancelled() => Step::Shutdown,
            };

            match step {
                Step::Exited(res) => return Outcome::Exited(res),
                Step::Tick => {
                    if let Some((limit, _)) = watch {
                        killing = self.check_memory(child, limit).await;
                    }
                }
                Step::Shutdown => return Outcome::Shutdown(self.stop(child).await),
            }
        }
    }

    /// Samples memory once; returns true when the worker was killed for exceeding `limit`.
    async fn check_memory(&self, child: &mut dyn RunningWorker, limit: u64) -> bool {
        let target = match self.cfg.memory_scope {
            MemoryScope::Launcher => None,
            MemoryScope::Child => match child.pid() {
                Some(pid) => Some(pid),
                None => {
                    self.sample_failed(&ProbeError::NoPid);
                    return false;
                }
            },
        };

        let usage = match self.probe.sample(target) {
            Ok(usage) => usage,
            Err(err) => {
                self.sample_failed(&err);
                return false;
            }
        };

        if usage.rss <= limit {
            self.bus.publish(
                Event::new(EventKind::MemorySampled)
                    .with_pid(target)
                    .with_memory(usage.rss, limit),
            );
            return false;
        }

        self.bus.publish(
            Event::new(EventKind::MemoryLimitExceeded)
                .with_pid(target)
                .with_memory(usage.rss, limit),
        );
        self.take_backup().await;
        if let Err(err) = child.kill() {
            warn!(tag = "MEMORY ERROR", error = err.as_label(), "kill failed: {err}");
        }
        true
    }

    async fn take_backup(&self) {
        let Some(backup) = self.backup else {
            return;
        };
        match backup.snapshot().await {
            Ok(snap) => self.bus.publish(
                Event::new(EventKind::BackupCreated)
                    .with_path(snap.dir.display().to_string())
                    .with_attempt(snap.copied.len() as u32),
            ),
            Err(err) => self
                .bus
                .publish(Event::new(EventKind::BackupFailed).with_reason(err.to_string())),
        }
    }

    fn sample_failed(&self, err: &ProbeError) {
        self.bus
            .publish(Event::new(EventKind::MemorySampleFailed).with_reason(err.to_string()));
    }

    /// Kills the worker and waits up to `grace` for it to go away.
    async fn stop(&self, child: &mut dyn RunningWorker) -> Result<(), RuntimeError> {
        let pid = child.pid();
        if let Err(err) = child.kill() {
            warn!(tag = "ERROR", error = err.as_label(), "kill failed: {err}");
        }

        let grace = self.cfg.grace;
        match time::timeout(grace, child.wait()).await {
            Ok(_) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_pid(pid));
                Err(RuntimeError::GraceExceeded { grace, pid })
            }
        }
    }
}

fn ticker(period: Duration) -> Interval {
    let mut t = time::interval_at(Instant::now() + period, period);
    t.set_missed_tick_behavior(MissedTickBehavior::Delay);
    t
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending().await,
    }
}
