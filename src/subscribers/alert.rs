//! # AlertWriter: forwards worker failures to the webhook.
//!
//! | Event                 | Message                                              |
//! |-----------------------|------------------------------------------------------|
//! | `ChildExited`         | `Bot exited with code X. Restart attempt #N`         |
//! | `ChildSpawnFailed`    | `Child process error: <reason>`                      |
//! | `CooldownStarted`     | `Restart limit reached (N). Cooling down for Ss`     |
//! | `MemoryLimitExceeded` | `Memory limit exceeded (X MB > Y MB). Restarting bot`|
//!
//! The webhook call runs on this subscriber's own worker, so a slow endpoint
//! never delays the supervisor or the log writer.

use std::sync::Arc;

use async_trait::async_trait;

use crate::alert::Alerter;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const MB: u64 = 1024 * 1024;

/// Sends alerts for worker exits, spawn failures, cooldowns and memory kills.
pub struct AlertWriter {
    alerter: Arc<Alerter>,
}

impl AlertWriter {
    /// Wraps a shared [`Alerter`].
    pub fn new(alerter: Arc<Alerter>) -> Self {
        Self { alerter }
    }

    /// Alert text for an event, if the event is alert-worthy.
    pub fn message_for(e: &Event) -> Option<String> {
        let attempt = e.attempt.unwrap_or(0);
        match e.kind {
            EventKind::ChildExited => {
                let code = match e.exit_code {
                    Some(code) => code.to_string(),
                    None => e.reason.as_deref().unwrap_or("unknown").to_string(),
                };
                Some(format!("Bot exited with code {code}. Restart attempt #{attempt}"))
            }
            EventKind::ChildSpawnFailed => Some(format!(
                "Child process error: {}",
                e.reason.as_deref().unwrap_or("unknown")
            )),
            EventKind::CooldownStarted => Some(format!(
                "Restart limit reached ({attempt}). Cooling down for {}s",
                e.delay_ms.unwrap_or(0) / 1000
            )),
            EventKind::MemoryLimitExceeded => Some(format!(
                "Memory limit exceeded ({} MB > {} MB). Restarting bot",
                e.bytes.unwrap_or(0) / MB,
                e.limit.unwrap_or(0) / MB
            )),
            _ => None,
        }
    }
}

#[async_trait]
impl Subscribe for AlertWriter {
    async fn on_event(&self, e: &Event) {
        if !self.alerter.is_enabled() {
            return;
        }
        if let Some(msg) = Self::message_for(e) {
            self.alerter.notify(&msg).await;
        }
    }

    fn name(&self) -> &'static str {
        "alert"
    }

    fn queue_capacity(&self) -> usize {
        64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_exit_message_matches_classic_text() {
        let ev = Event::new(EventKind::ChildExited)
            .with_attempt(3)
            .with_exit_code(Some(1));
        assert_eq!(
            AlertWriter::message_for(&ev).as_deref(),
            Some("Bot exited with code 1. Restart attempt #3")
        );
    }

    #[test]
    fn test_signal_exit_uses_reason() {
        let ev = Event::new(EventKind::ChildExited)
            .with_attempt(1)
            .with_reason("signal 9");
        assert_eq!(
            AlertWriter::message_for(&ev).as_deref(),
            Some("Bot exited with code signal 9. Restart attempt #1")
        );
    }

    #[test]
    fn test_other_messages() {
        let ev = Event::new(EventKind::CooldownStarted)
            .with_attempt(10)
            .with_delay(Duration::from_secs(120));
        assert_eq!(
            AlertWriter::message_for(&ev).as_deref(),
            Some("Restart limit reached (10). Cooling down for 120s")
        );

        let ev = Event::new(EventKind::MemoryLimitExceeded).with_memory(1600 * MB, 1500 * MB);
        assert_eq!(
            AlertWriter::message_for(&ev).as_deref(),
            Some("Memory limit exceeded (1600 MB > 1500 MB). Restarting bot")
        );

        assert!(AlertWriter::message_for(&Event::new(EventKind::ChildSpawned)).is_none());
    }
}
