//! # Event bus for launcher events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so the supervisor loop, the
//! memory monitor and the subscriber workers can publish without blocking.
//!
//! ```text
//! Publishers:                         Consumer:
//!   supervisor loop ──┐
//!   monitor         ──┼──► Bus ──► subscriber_listener ──► SubscriberSet
//!   subscriber set  ──┘
//! ```
//!
//! - `publish()` never blocks; with no receivers the event is dropped.
//! - Receivers that fall behind the ring buffer see `RecvError::Lagged(n)`.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for launcher events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_receiver_sees_only_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ChildStarting));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::ChildStopped).with_attempt(2));

        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::ChildStopped);
        assert_eq!(ev.attempt, Some(2));
    }
}
