//! # LogWriter: launcher events as tagged `tracing` lines.
//!
//! Every line carries a `tag` field so the log file reads like the classic
//! launcher output:
//!
//! ```text
//! INFO  tag="START" attempt=3 pid=4242 bot started
//! WARN  tag="EXIT" attempt=3 code=1 bot exited: exit code 1
//! INFO  tag="COOLDOWN" delay_ms=120000 restart ceiling reached, cooling down
//! WARN  tag="MEMORY" rss_mb=1612 limit_mb=1500 memory limit exceeded, restarting bot
//! INFO  tag="BACKUP" path="./backup-2024-..." files=2 backup created
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const MB: u64 = 1024 * 1024;

/// Writes launcher events to the `tracing` pipeline.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::UpdateApplied => {
                info!(tag = "UPDATE", "new code pulled, restart count reset");
            }
            EventKind::CooldownStarted => {
                info!(
                    tag = "COOLDOWN",
                    restarts = e.attempt,
                    delay_ms = e.delay_ms,
                    "restart ceiling reached, cooling down"
                );
            }
            EventKind::ChildStarting => {
                info!(tag = "START", bot = e.name.as_deref(), attempt = e.attempt, "starting bot");
            }
            EventKind::ChildSpawned => {
                info!(tag = "START", attempt = e.attempt, pid = e.pid, "bot started");
            }
            EventKind::ChildSpawnFailed => {
                error!(tag = "ERROR", attempt = e.attempt, "child process error: {reason}");
            }
            EventKind::ChildExited => {
                warn!(tag = "EXIT", attempt = e.attempt, code = e.exit_code, "bot exited: {reason}");
            }
            EventKind::ChildStopped => {
                info!(tag = "INFO", attempt = e.attempt, code = e.exit_code, "bot stopped, not restarting");
            }
            EventKind::BackoffScheduled => {
                info!(tag = "INFO", attempt = e.attempt, delay_ms = e.delay_ms, "restart scheduled");
            }
            EventKind::MemorySampled => {
                debug!(
                    tag = "MEMORY",
                    pid = e.pid,
                    rss_mb = e.bytes.map(|b| b / MB),
                    limit_mb = e.limit.map(|b| b / MB),
                    "memory sample"
                );
            }
            EventKind::MemorySampleFailed => {
                warn!(tag = "MEMORY ERROR", "memory sample failed: {reason}");
            }
            EventKind::MemoryLimitExceeded => {
                warn!(
                    tag = "MEMORY",
                    pid = e.pid,
                    rss_mb = e.bytes.map(|b| b / MB),
                    limit_mb = e.limit.map(|b| b / MB),
                    "memory limit exceeded, restarting bot"
                );
            }
            EventKind::BackupCreated => {
                info!(tag = "BACKUP", path = e.path.as_deref(), files = e.attempt, "backup created");
            }
            EventKind::BackupFailed => {
                error!(tag = "BACKUP ERROR", "backup failed: {reason}");
            }
            EventKind::ShutdownRequested => {
                info!(tag = "INFO", "shutdown requested");
            }
            EventKind::AllStoppedWithin => {
                info!(tag = "INFO", "bot stopped within grace");
            }
            EventKind::GraceExceeded => {
                error!(tag = "ERROR", pid = e.pid, "bot did not stop within grace");
            }
            EventKind::SubscriberOverflow => {
                warn!(tag = "ERROR", subscriber = e.name.as_deref(), "subscriber dropped event: {reason}");
            }
            EventKind::SubscriberPanicked => {
                error!(tag = "ERROR", subscriber = e.name.as_deref(), "subscriber panicked: {reason}");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
