//! Health check HTTP server.
//!
//! | Route     | Response                                                       |
//! |-----------|----------------------------------------------------------------|
//! | `/`       | status page (file, or a built-in page when the file is missing)|
//! | `/health` | `{status, uptimeSeconds, memoryUsage, restarts}`               |
//! | `/status` | supervisor [`StatusSnapshot`](crate::StatusSnapshot)           |
//! | other     | 404                                                            |
//!
//! The server only reads the supervisor's status board; it never blocks the
//! restart loop.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::{StatusBoard, StatusSnapshot};
use crate::error::RuntimeError;
use crate::memory::{MemoryProbe, MemoryUsage};

const BUILTIN_PAGE: &str = include_str!("../assets/status.html");

/// Shared state for the HTTP handlers.
pub struct HealthState {
    /// Supervisor status.
    pub status: Arc<StatusBoard>,
    /// Probe for launcher/worker memory.
    pub probe: Arc<dyn MemoryProbe>,
    /// Status page served at `/`.
    pub page: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: f64,
    memory_usage: MemoryReport,
    restarts: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MemoryReport {
    #[serde(flatten)]
    launcher: MemoryUsage,
    child_rss: Option<u64>,
}

/// Builds the router. Exposed for tests and for embedding.
pub fn router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/", get(page_handler))
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .fallback(not_found)
        .with_state(state)
}

/// HTTP server for `/`, `/health` and `/status`.
pub struct HealthServer {
    state: Arc<HealthState>,
    listener: TcpListener,
}

impl HealthServer {
    /// Binds `addr`; fails fast so a taken port stops the launcher at start-up.
    pub async fn bind(addr: SocketAddr, state: Arc<HealthState>) -> Result<Self, RuntimeError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RuntimeError::Bind { addr, source })?;
        Ok(Self { state, listener })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Serves until `token` is cancelled, then finishes in-flight requests.
    pub async fn run(self, token: CancellationToken) -> Result<(), RuntimeError> {
        if let Some(addr) = self.local_addr() {
            info!(tag = "START", %addr, "web server running");
        }
        axum::serve(self.listener, router(self.state))
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(RuntimeError::Serve)
    }
}

async fn page_handler(State(state): State<Arc<HealthState>>) -> Html<String> {
    match tokio::fs::read_to_string(&state.page).await {
        Ok(page) => Html(page),
        Err(err) => {
            debug!(page = %state.page.display(), "status page unavailable, using built-in: {err}");
            Html(BUILTIN_PAGE.to_string())
        }
    }
}

async fn health_handler(State(state): State<Arc<HealthState>>) -> Json<HealthResponse> {
    let snap = state.status.snapshot();
    let (launcher, child_rss) = sample_memory(Arc::clone(&state.probe), snap.child_pid).await;

    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.status.uptime().as_secs_f64(),
        memory_usage: MemoryReport {
            launcher,
            child_rss,
        },
        restarts: snap.restarts,
    })
}

/// Reads launcher and worker memory on the blocking pool.
async fn sample_memory(probe: Arc<dyn MemoryProbe>, child: Option<u32>) -> (MemoryUsage, Option<u64>) {
    let sampled = tokio::task::spawn_blocking(move || {
        let launcher = probe.sample(None).unwrap_or_else(|err| {
            debug!("launcher memory sample failed: {err}");
            MemoryUsage::default()
        });
        let child_rss = child
            .and_then(|pid| probe.sample(Some(pid)).ok())
            .map(|usage| usage.rss);
        (launcher, child_rss)
    })
    .await;

    sampled.unwrap_or_else(|err| {
        warn!("memory sampling task failed: {err}");
        (MemoryUsage::default(), None)
    })
}

async fn status_handler(State(state): State<Arc<HealthState>>) -> Json<StatusSnapshot> {
    Json(state.status.snapshot())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
