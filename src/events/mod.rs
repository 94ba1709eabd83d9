//! Launcher events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the supervisor loop, the memory monitor, `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: `Supervisor::subscriber_listener()`, which fans out to the
//!   `SubscriberSet` (log writer, alert writer).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
