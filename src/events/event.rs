//! # Launcher events emitted by the supervisor, the monitor and subscriber workers.
//!
//! [`EventKind`] classifies what happened; [`Event`] carries the optional
//! metadata (attempt, exit code, delay, memory numbers, pid, reason, path).
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the order of events delivered through
//! separate subscriber queues.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use botvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(20));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.delay_ms, Some(20_000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of launcher events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `name`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Pre-start events ===
    /// `git pull` fetched new content; restart count was reset.
    UpdateApplied,

    /// Restart ceiling reached; the loop sleeps for the cooldown.
    ///
    /// Sets:
    /// - `attempt`: restart count that hit the ceiling
    /// - `delay_ms`: cooldown length
    CooldownStarted,

    // === Worker lifecycle events ===
    /// Worker is about to be spawned.
    ///
    /// Sets:
    /// - `name`: worker name
    /// - `attempt`: restart count after increment (1-based)
    ChildStarting,

    /// Worker process is running.
    ///
    /// Sets:
    /// - `name`, `attempt`
    /// - `pid`: os pid, if available
    ChildSpawned,

    /// Worker process could not be spawned.
    ///
    /// Sets:
    /// - `name`, `attempt`
    /// - `reason`: spawn error
    ChildSpawnFailed,

    /// Worker process exited.
    ///
    /// Sets:
    /// - `name`, `attempt`
    /// - `exit_code`: exit code, absent when killed by a signal
    /// - `reason`: human-readable exit status
    ChildExited,

    /// Worker stopped for good (clean exit or policy says no restart).
    ///
    /// Sets:
    /// - `name`, `attempt`
    /// - `exit_code`: last exit code, if any
    ChildStopped,

    /// Next start scheduled after a failed attempt.
    ///
    /// Sets:
    /// - `attempt`: restart count of the failed attempt
    /// - `delay_ms`: delay before the next start (after jitter)
    BackoffScheduled,

    // === Memory watchdog events ===
    /// Periodic memory sample.
    ///
    /// Sets:
    /// - `pid`: sampled process (absent for the launcher itself)
    /// - `bytes`: resident set size
    /// - `limit`: configured limit in bytes
    MemorySampled,

    /// Memory sample could not be taken this tick.
    ///
    /// Sets:
    /// - `reason`: probe error
    MemorySampleFailed,

    /// Resident memory above the limit; a backup is taken and the worker killed.
    ///
    /// Sets:
    /// - `pid`, `bytes`, `limit`
    MemoryLimitExceeded,

    /// Backup snapshot created.
    ///
    /// Sets:
    /// - `path`: snapshot directory
    /// - `attempt`: number of files copied
    BackupCreated,

    /// Backup snapshot could not be created.
    ///
    /// Sets:
    /// - `reason`: backup error
    BackupFailed,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or token cancelled).
    ShutdownRequested,

    /// Worker stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; the worker did not exit in time.
    ///
    /// Sets:
    /// - `pid`: worker pid, if known
    GraceExceeded,
}

/// Launcher event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Worker or subscriber name.
    pub name: Option<Arc<str>>,
    /// Restart count (1-based) or a small counter, depending on the kind.
    pub attempt: Option<u32>,
    /// Worker exit code.
    pub exit_code: Option<i32>,
    /// Delay in milliseconds (backoff or cooldown).
    pub delay_ms: Option<u64>,
    /// Memory in bytes.
    pub bytes: Option<u64>,
    /// Memory limit in bytes.
    pub limit: Option<u64>,
    /// Process id.
    pub pid: Option<u32>,
    /// Human-readable reason (errors, overflow details, exit status).
    pub reason: Option<Arc<str>>,
    /// Filesystem path (backup directory).
    pub path: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            name: None,
            attempt: None,
            exit_code: None,
            delay_ms: None,
            bytes: None,
            limit: None,
            pid: None,
            reason: None,
            path: None,
        }
    }

    /// Attaches a worker or subscriber name.
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attaches an attempt count.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches an exit code; `None` leaves the field unset.
    #[inline]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(d.as_millis().min(u128::from(u64::MAX)) as u64);
        self
    }

    /// Attaches a memory reading and the limit it was compared against.
    #[inline]
    pub fn with_memory(mut self, bytes: u64, limit: u64) -> Self {
        self.bytes = Some(bytes);
        self.limit = Some(limit);
        self
    }

    /// Attaches a process id; `None` leaves the field unset.
    #[inline]
    pub fn with_pid(mut self, pid: Option<u32>) -> Self {
        self.pid = pid;
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a filesystem path.
    #[inline]
    pub fn with_path(mut self, path: impl Into<Arc<str>>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    /// True for events produced by the subscriber set itself.
    #[inline]
    pub fn is_internal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}
