//! Runtime core: the restart loop and its collaborators.
//!
//! The public entry point is [`Supervisor`] (built via [`SupervisorBuilder`]).
//!
//! Internal modules:
//! - [`supervisor`]: the restart loop, event fan-out wiring, shutdown;
//! - [`monitor`]: watches one running worker (exit, memory timer, shutdown);
//! - [`state`]: restart counter and backoff memory;
//! - [`status`]: snapshot shared with the health server;
//! - [`shutdown`]: OS signal handling;
//! - [`config`]: supervisor knobs.

mod builder;
mod config;
mod monitor;
mod shutdown;
mod state;
mod status;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use state::{Decision, RestartState};
pub use status::{Phase, StatusBoard, StatusSnapshot};
pub use supervisor::Supervisor;
