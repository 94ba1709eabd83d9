//! # Supervisor: keeps one worker instance alive.
//!
//! The [`Supervisor`] owns the event bus, the [`SubscriberSet`], the status
//! board and the restart loop. It starts the worker, watches it, and decides
//! whether and when to start it again.
//!
//! ## Loop
//! ```text
//! loop {
//!   ├─► updater.pull()            fresh code → reset count, UpdateApplied
//!   ├─► count ≥ max_restarts?     CooldownStarted → sleep(backoff.max) → reset count
//!   ├─► count += 1, ChildStarting
//!   ├─► worker.spawn()
//!   │     ├─ Ok  → ChildSpawned → Monitor::watch() ─► ChildExited
//!   │     └─ Err → ChildSpawnFailed
//!   ├─► RestartState decides
//!   │     ├─ Stop              → ChildStopped, return Ok
//!   │     └─ Restart { delay } → BackoffScheduled → sleep(jittered delay)
//! }
//! ```
//!
//! ## Shutdown path
//! ```text
//! wait_for_shutdown_signal() or Supervisor::shutdown()
//!   └─► Bus.publish(ShutdownRequested)
//!   └─► token.cancel()
//!         ├─ worker running     → kill, wait up to grace → AllStoppedWithin | GraceExceeded
//!         └─ sleeping/updating  → AllStoppedWithin
//! ```
//!
//! Every event is fanned out to subscribers on their own workers; `run()`
//! drains them before returning so the last log lines and alerts go out.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use botvisor::{CommandWorker, LogWriter, Supervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), botvisor::RuntimeError> {
//!     let worker = CommandWorker::new("cyber").with_cwd(".");
//!     let sup = Supervisor::builder(SupervisorConfig::default(), Arc::new(worker))
//!         .with_subscribers(vec![Arc::new(LogWriter::new())])
//!         .build();
//!     sup.run().await
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::backup::BackupSet;
use crate::core::{
    builder::SupervisorBuilder,
    config::SupervisorConfig,
    monitor::{Monitor, Outcome},
    shutdown,
    state::{Decision, RestartState},
    status::{Phase, StatusBoard},
};
use crate::error::RuntimeError;
use crate::events::{Bus, Event, EventKind};
use crate::memory::MemoryProbe;
use crate::subscribers::SubscriberSet;
use crate::updater::Update;
use crate::workers::{ChildExit, Worker};

/// Restart loop, event fan-out and shutdown handling for one worker.
pub struct Supervisor {
    pub(super) cfg: SupervisorConfig,
    pub(super) bus: Bus,
    pub(super) subs: Arc<SubscriberSet>,
    pub(super) status: Arc<StatusBoard>,
    pub(super) worker: Arc<dyn Worker>,
    pub(super) updater: Arc<dyn Update>,
    pub(super) probe: Arc<dyn MemoryProbe>,
    pub(super) backup: Option<BackupSet>,
    pub(super) token: CancellationToken,
}

impl Supervisor {
    /// Starts building a supervisor for `worker`.
    pub fn builder(cfg: SupervisorConfig, worker: Arc<dyn Worker>) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg, worker)
    }

    /// Shared status board (read by the health server).
    pub fn status(&self) -> Arc<StatusBoard> {
        Arc::clone(&self.status)
    }

    /// Memory probe used by the watchdog.
    pub fn probe(&self) -> Arc<dyn MemoryProbe> {
        Arc::clone(&self.probe)
    }

    /// Runtime token; cancelled on shutdown.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Event bus, for extra publishers or receivers.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Requests shutdown: kills the worker and ends `run()`.
    pub fn shutdown(&self) {
        if !self.token.is_cancelled() {
            self.bus.publish(Event::new(EventKind::ShutdownRequested));
            self.token.cancel();
        }
    }

    /// Runs the restart loop until the worker stops for good or shutdown is requested.
    ///
    /// Returns `Err(RuntimeError::GraceExceeded)` only when the worker
    /// survived a shutdown kill for longer than `grace`.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let done = CancellationToken::new();
        let listener = self.subscriber_listener(done.clone());
        if self.cfg.handle_signals {
            self.signal_listener();
        }

        let res = self.drive().await;
        self.status.update(|s| {
            s.phase = Phase::Stopped;
            s.child_pid = None;
            s.restart_delay_ms = None;
        });

        done.cancel();
        let _ = listener.await;
        self.subs.shutdown().await;
        res
    }

    /// Forwards bus events to the subscriber set until `done`, then drains what is left.
    fn subscriber_listener(&self, done: CancellationToken) -> JoinHandle<()> {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => return,
                    },
                    _ = done.cancelled() => break,
                }
            }
            loop {
                match rx.try_recv() {
                    Ok(ev) => set.emit(&ev),
                    Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => return,
                }
            }
        })
    }

    /// Turns OS termination signals into a shutdown request.
    fn signal_listener(&self) {
        let bus = self.bus.clone();
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                res = shutdown::wait_for_shutdown_signal() => {
                    if let Err(err) = res {
                        warn!(tag = "ERROR", "cannot install signal handlers: {err}");
                        return;
                    }
                    bus.publish(Event::new(EventKind::ShutdownRequested));
                    token.cancel();
                }
                _ = token.cancelled() => {}
            }
        });
    }

    async fn drive(&self) -> Result<(), RuntimeError> {
        let mut state = RestartState::new(&self.cfg);
        let name = self.worker.name().to_string();
        let monitor = Monitor {
            cfg: &self.cfg,
            bus: &self.bus,
            probe: self.probe.as_ref(),
            backup: self.backup.as_ref(),
            token: &self.token,
        };

        loop {
            self.status.set_phase(Phase::Starting);
            let updated = tokio::select! {
                updated = self.updater.pull() => updated,
                _ = self.token.cancelled() => return self.stopped_idle(),
            };
            if updated {
                state.reset();
                self.status.update(|s| s.restarts = 0);
                self.bus.publish(Event::new(EventKind::UpdateApplied));
            }

            if let Some(cooldown) = state.cooldown() {
                self.bus.publish(
                    Event::new(EventKind::CooldownStarted)
                        .with_attempt(state.count())
                        .with_delay(cooldown),
                );
                self.status.update(|s| {
                    s.phase = Phase::Cooldown;
                    s.restart_delay_ms = Some(cooldown.as_millis() as u64);
                });
                if !self.pause(cooldown).await {
                    return self.stopped_idle();
                }
                state.reset();
            }

            let attempt = state.begin_attempt();
            self.status.update(|s| {
                s.phase = Phase::Starting;
                s.restarts = attempt;
                s.attempts_total += 1;
                s.restart_delay_ms = None;
            });
            self.bus.publish(
                Event::new(EventKind::ChildStarting)
                    .with_name(name.as_str())
                    .with_attempt(attempt),
            );

            let (decision, last_code) = match self.worker.spawn() {
                Ok(mut child) => {
                    let pid = child.pid();
                    self.bus.publish(
                        Event::new(EventKind::ChildSpawned)
                            .with_name(name.as_str())
                            .with_attempt(attempt)
                            .with_pid(pid),
                    );
                    self.status.update(|s| {
                        s.phase = Phase::Running;
                        s.child_pid = pid;
                    });

                    let exit = match monitor.watch(child.as_mut()).await {
                        Outcome::Shutdown(res) => return res,
                        Outcome::Exited(Ok(exit)) => exit,
                        Outcome::Exited(Err(err)) => {
                            warn!(tag = "ERROR", error = err.as_label(), "lost track of bot: {err}");
                            let _ = child.kill();
                            ChildExit {
                                code: None,
                                signal: None,
                            }
                        }
                    };

                    self.bus.publish(
                        Event::new(EventKind::ChildExited)
                            .with_name(name.as_str())
                            .with_attempt(attempt)
                            .with_pid(pid)
                            .with_exit_code(exit.code)
                            .with_reason(exit.to_string()),
                    );
                    self.status.update(|s| {
                        s.child_pid = None;
                        s.last_exit_code = exit.code;
                    });
                    (state.on_exit(exit), exit.code)
                }
                Err(err) => {
                    self.bus.publish(
                        Event::new(EventKind::ChildSpawnFailed)
                            .with_name(name.as_str())
                            .with_attempt(attempt)
                            .with_reason(err.to_string()),
                    );
                    (state.on_spawn_failure(), None)
                }
            };

            match decision {
                Decision::Stop => {
                    self.bus.publish(
                        Event::new(EventKind::ChildStopped)
                            .with_name(name.as_str())
                            .with_attempt(attempt)
                            .with_exit_code(last_code),
                    );
                    return Ok(());
                }
                Decision::Restart { delay } => {
                    let delay = self.cfg.backoff.jittered(delay);
                    self.bus.publish(
                        Event::new(EventKind::BackoffScheduled)
                            .with_name(name.as_str())
                            .with_attempt(attempt)
                            .with_delay(delay),
                    );
                    self.status.update(|s| {
                        s.phase = Phase::Backoff;
                        s.restart_delay_ms = Some(delay.as_millis() as u64);
                    });
                    if !self.pause(delay).await {
                        return self.stopped_idle();
                    }
                }
            }
        }
    }

    /// Sleeps for `d`; false if shutdown interrupted the sleep.
    async fn pause(&self, d: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(d) => true,
            _ = self.token.cancelled() => false,
        }
    }

    /// Shutdown while no worker was running.
    fn stopped_idle(&self) -> Result<(), RuntimeError> {
        self.bus.publish(Event::new(EventKind::AllStoppedWithin));
        Ok(())
    }
}
