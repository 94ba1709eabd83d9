use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::{config::SupervisorConfig, status::StatusBoard, supervisor::Supervisor};
use crate::{
    backup::BackupSet,
    events::Bus,
    memory::{MemoryProbe, SysinfoProbe},
    subscribers::{Subscribe, SubscriberSet},
    updater::{NoUpdates, Update},
    workers::Worker,
};

/// Builder for a [`Supervisor`].
///
/// Only the config and the worker are required. Defaults:
/// - updater: [`NoUpdates`]
/// - probe: [`SysinfoProbe`]
/// - backup: none (memory kills skip the snapshot)
/// - subscribers: none
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    worker: Arc<dyn Worker>,
    updater: Arc<dyn Update>,
    probe: Arc<dyn MemoryProbe>,
    backup: Option<BackupSet>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a builder for `worker` with the given configuration.
    pub fn new(cfg: SupervisorConfig, worker: Arc<dyn Worker>) -> Self {
        Self {
            cfg,
            worker,
            updater: Arc::new(NoUpdates),
            probe: Arc::new(SysinfoProbe::new()),
            backup: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets the updater consulted before every start.
    pub fn with_updater(mut self, updater: Arc<dyn Update>) -> Self {
        self.updater = updater;
        self
    }

    /// Sets the memory probe used by the watchdog.
    pub fn with_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Sets the files snapshotted before a memory kill.
    pub fn with_backup(mut self, backup: BackupSet) -> Self {
        self.backup = Some(backup);
        self
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets its own worker task and bounded queue.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor. Must be called inside a tokio runtime
    /// (subscriber workers are spawned here).
    pub fn build(self) -> Arc<Supervisor> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));

        Arc::new(Supervisor {
            cfg: self.cfg,
            bus,
            subs,
            status: Arc::new(StatusBoard::new()),
            worker: self.worker,
            updater: self.updater,
            probe: self.probe,
            backup: self.backup,
            token: CancellationToken::new(),
        })
    }
}
