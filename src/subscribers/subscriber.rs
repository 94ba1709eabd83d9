//! # Event subscriber trait.
//!
//! [`Subscribe`] is the extension point for reacting to launcher events
//! (log lines, webhook alerts, anything else).
//!
//! Each subscriber gets:
//! - a **dedicated worker task**;
//! - a **bounded queue** (capacity via [`Subscribe::queue_capacity`]);
//! - **panic isolation** (reported as `EventKind::SubscriberPanicked`).
//!
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! A slow subscriber only affects its own queue. The webhook call in the
//! alert subscriber can take seconds; the log writer keeps up regardless.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use botvisor::{Event, EventKind, Subscribe};
//!
//! struct CrashCounter(std::sync::atomic::AtomicU32);
//!
//! #[async_trait]
//! impl Subscribe for CrashCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ChildExited && ev.exit_code != Some(0) {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "crash-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Event subscriber.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event, in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    ///
    /// The default uses `type_name::<Self>()`, which is verbose; override it.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to at least 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
