//! # Supervised workers.
//!
//! - [`Worker`] starts an instance; [`RunningWorker`] is the live handle.
//! - [`ChildExit`] describes how an instance ended.
//! - [`CommandWorker`] is the process-backed implementation used by the launcher.

mod command;
mod worker;

pub use command::CommandWorker;
pub use worker::{ChildExit, RunningWorker, Worker};
