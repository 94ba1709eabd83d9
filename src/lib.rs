//! # botvisor
//!
//! **Botvisor** launches a chat bot process and keeps it alive: it restarts
//! the bot on crash with exponential backoff, cools down when the bot keeps
//! crashing, restarts it when it uses too much memory, pulls git updates
//! before every start and reports its health over HTTP.
//!
//! ## Architecture
//! ```text
//!   Config (env) ──► SupervisorConfig
//!                          │
//! ┌────────────────────────▼──────────────────────────────────────────┐
//! │  Supervisor                                                        │
//! │  - Update (git pull before each start)                             │
//! │  - Worker (spawns the bot)  ──► Monitor (exit | memory tick | stop)│
//! │  - RestartState (count, backoff, cooldown)                         │
//! │  - StatusBoard ─────────────────────────────► HealthServer (axum)  │
//! └────────────────────────┬──────────────────────────────────────────┘
//!                          │ publishes
//!                          ▼
//!             ┌────────────────────────┐
//!             │ Bus (broadcast channel)│
//!             └───────────┬────────────┘
//!                         ▼
//!                   SubscriberSet
//!                  (per-sub queues)
//!                   ┌─────┴─────┐
//!                   ▼           ▼
//!               LogWriter   AlertWriter ──► Alerter (webhook)
//! ```
//!
//! ## Features
//! | Area              | Description                                          | Key types / traits                          |
//! |-------------------|------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Restart loop, cooldown, memory watchdog, shutdown    | [`Supervisor`], [`SupervisorConfig`]        |
//! | **Policies**      | Restart and backoff strategies                       | [`RestartPolicy`], [`BackoffPolicy`]        |
//! | **Seams**         | Process, update and memory backends                  | [`Worker`], [`Update`], [`MemoryProbe`]     |
//! | **Subscribers**   | React to lifecycle events                            | [`Subscribe`], [`LogWriter`], [`AlertWriter`]|
//! | **Side effects**  | Backups, webhook alerts                              | [`BackupSet`], [`Alerter`]                  |
//! | **HTTP**          | `/`, `/health`, `/status`                            | [`HealthServer`]                            |
//! | **Configuration** | Environment variables                                | [`Config`]                                  |
//! | **Demo bot**      | Fuzzy keyword chat responder                         | [`Responder`]                               |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use botvisor::{CommandWorker, GitUpdater, LogWriter, Supervisor, SupervisorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), botvisor::RuntimeError> {
//!     let worker = CommandWorker::new("cyber").with_cwd("/srv/bot");
//!     let sup = Supervisor::builder(SupervisorConfig::default(), Arc::new(worker))
//!         .with_updater(Arc::new(GitUpdater::new("/srv/bot")))
//!         .with_subscribers(vec![Arc::new(LogWriter::new())])
//!         .build();
//!     sup.run().await
//! }
//! ```
mod alert;
mod backup;
mod config;
mod core;
mod error;
mod events;
mod health;
mod memory;
mod policies;
mod responder;
mod subscribers;
mod updater;
mod workers;

pub mod telemetry;

// ---- Public re-exports ----

pub use alert::Alerter;
pub use backup::{BackupSet, Snapshot};
pub use config::{Config, EnvMsDuration, FileList};
pub use crate::core::{
    Decision, Phase, RestartState, StatusBoard, StatusSnapshot, Supervisor, SupervisorBuilder,
    SupervisorConfig,
};
pub use error::{
    AlertError, BackupError, CalcError, ChildError, ProbeError, RuntimeError, UpdateError,
};
pub use events::{Bus, Event, EventKind};
pub use health::{router, HealthServer, HealthState};
pub use memory::{MemoryProbe, MemoryScope, MemoryUsage, ParseScopeError, SysinfoProbe};
pub use policies::{BackoffPolicy, JitterPolicy, ParseJitterError, ParseRestartError, RestartPolicy};
pub use responder::{
    calculate, detect_emotion, is_match, normalize, Emotion, Responder, Topic, TopicCache,
};
pub use subscribers::{AlertWriter, LogWriter, Subscribe, SubscriberSet};
pub use updater::{GitUpdater, NoUpdates, ParseDetectionError, Update, UpdateDetection};
pub use workers::{ChildExit, CommandWorker, RunningWorker, Worker};
