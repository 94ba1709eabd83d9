//! Webhook alerts.
//!
//! [`Alerter`] posts `{"content": "<message>"}` to a configured webhook
//! (Discord-style). It is best effort: one attempt, bounded by a timeout,
//! failures are logged with the `ALERT ERROR` tag and never raised from
//! [`Alerter::notify`].

use std::time::Duration;

use serde::Serialize;
use tracing::warn;

use crate::error::AlertError;

#[derive(Serialize)]
struct Payload<'a> {
    content: &'a str,
}

struct Target {
    client: reqwest::Client,
    url: String,
}

/// Best-effort webhook notifier.
pub struct Alerter {
    target: Option<Target>,
}

impl Alerter {
    /// Builds an alerter for `url`; `None` or an empty string disables it.
    pub fn new(url: Option<String>, timeout: Duration) -> Result<Self, AlertError> {
        let Some(url) = url.filter(|u| !u.trim().is_empty()) else {
            return Ok(Self::disabled());
        };
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(AlertError::Client)?;
        Ok(Self {
            target: Some(Target { client, url }),
        })
    }

    /// An alerter that never sends anything.
    pub fn disabled() -> Self {
        Self { target: None }
    }

    /// True when a webhook is configured.
    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Sends `message`, logging any failure.
    pub async fn notify(&self, message: &str) {
        if let Err(err) = self.try_notify(message).await {
            warn!(tag = "ALERT ERROR", error = err.as_label(), "{err}");
        }
    }

    /// Sends `message` and reports the outcome.
    ///
    /// Returns `Ok(false)` when disabled, `Ok(true)` when the webhook answered
    /// with a success status.
    pub async fn try_notify(&self, message: &str) -> Result<bool, AlertError> {
        let Some(target) = &self.target else {
            return Ok(false);
        };
        target
            .client
            .post(&target.url)
            .json(&Payload { content: message })
            .send()
            .await
            .map_err(AlertError::Request)?
            .error_for_status()
            .map_err(AlertError::Request)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use tokio::sync::Mutex;

    type Inbox = Arc<Mutex<Vec<serde_json::Value>>>;

    async fn sink(status: StatusCode) -> (String, Inbox) {
        let inbox: Inbox = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/hook",
                post(
                    move |State(inbox): State<Inbox>, Json(body): Json<serde_json::Value>| async move {
                        inbox.lock().await.push(body);
                        status
                    },
                ),
            )
            .with_state(inbox.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/hook"), inbox)
    }

    #[tokio::test]
    async fn test_disabled_does_nothing() {
        let alerter = Alerter::new(Some("   ".into()), Duration::from_secs(1)).unwrap();
        assert!(!alerter.is_enabled());
        assert!(!alerter.try_notify("hello").await.unwrap());
        alerter.notify("hello").await;
    }

    #[tokio::test]
    async fn test_posts_content_json() {
        let (url, inbox) = sink(StatusCode::NO_CONTENT).await;
        let alerter = Alerter::new(Some(url), Duration::from_secs(5)).unwrap();

        assert!(alerter
            .try_notify("Bot exited with code 1. Restart attempt #2")
            .await
            .unwrap());

        let got = inbox.lock().await.clone();
        assert_eq!(
            got,
            vec![serde_json::json!({"content": "Bot exited with code 1. Restart attempt #2"})]
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported_not_raised() {
        let (url, inbox) = sink(StatusCode::INTERNAL_SERVER_ERROR).await;
        let alerter = Alerter::new(Some(url), Duration::from_secs(5)).unwrap();

        let err = alerter.try_notify("boom").await.unwrap_err();
        assert_eq!(err.as_label(), "alert_request");

        alerter.notify("boom again").await;
        assert_eq!(inbox.lock().await.len(), 2);
    }
}
