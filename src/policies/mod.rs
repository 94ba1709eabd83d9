//! Restart and backoff policies.
//!
//! This module groups the knobs that control **if/when** the worker is
//! restarted and **how long** to wait between attempts.
//!
//! ## Contents
//! - [`RestartPolicy`] when to restart (never / on-failure / always)
//! - [`BackoffPolicy`] how delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization of the slept delay
//!
//! ## Quick wiring
//! ```text
//! SupervisorConfig { restart, backoff, max_restarts, .. }
//!      └─► core::state::RestartState uses:
//!           - restart to decide restart/stop
//!           - backoff.next(prev_delay) to schedule the next attempt
//!           - backoff.max as the crash-loop cooldown
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::OnFailure`.
//! - `BackoffPolicy::default()` → first=5s, factor=2.0, max=120s, jitter=None.

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::{JitterPolicy, ParseJitterError};
pub use restart::{ParseRestartError, RestartPolicy};
