//! # Worker abstraction.
//!
//! A [`Worker`] knows how to start one instance of the supervised program; a
//! [`RunningWorker`] is the handle to that instance. The supervisor owns at
//! most one `RunningWorker` at a time and only asks the `Worker` for a new
//! one after the previous exit was observed.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use botvisor::{ChildError, ChildExit, RunningWorker, Worker};
//!
//! struct Instant;
//! struct Done;
//!
//! #[async_trait]
//! impl RunningWorker for Done {
//!     fn pid(&self) -> Option<u32> { None }
//!     async fn wait(&mut self) -> Result<ChildExit, ChildError> { Ok(ChildExit::code(0)) }
//!     fn kill(&mut self) -> Result<(), ChildError> { Ok(()) }
//! }
//!
//! impl Worker for Instant {
//!     fn name(&self) -> &str { "instant" }
//!     fn spawn(&self) -> Result<Box<dyn RunningWorker>, ChildError> { Ok(Box::new(Done)) }
//! }
//! ```

use std::fmt;

use async_trait::async_trait;

use crate::error::ChildError;

/// How a worker process ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildExit {
    /// Exit code; absent when the process was killed by a signal.
    pub code: Option<i32>,
    /// Terminating signal (unix only).
    pub signal: Option<i32>,
}

impl ChildExit {
    /// An exit with the given code.
    pub fn code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    /// A death by signal.
    pub fn signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    /// Clean means exit code 0. Signal deaths are never clean.
    pub fn is_clean(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ChildExit {
    fn from(status: std::process::ExitStatus) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;
        Self {
            code: status.code(),
            signal,
        }
    }
}

impl fmt::Display for ChildExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {code}"),
            (None, Some(sig)) => write!(f, "signal {sig}"),
            (None, None) => f.write_str("unknown status"),
        }
    }
}

/// Starts instances of the supervised program.
pub trait Worker: Send + Sync + 'static {
    /// Human-readable name used in events.
    fn name(&self) -> &str;

    /// Starts one instance.
    fn spawn(&self) -> Result<Box<dyn RunningWorker>, ChildError>;
}

/// Handle to one running instance.
#[async_trait]
pub trait RunningWorker: Send {
    /// OS pid, if the instance is a process that has not been reaped yet.
    fn pid(&self) -> Option<u32>;

    /// Waits for the instance to exit.
    ///
    /// Must be cancel-safe: the monitor polls it inside `select!` and drops
    /// the future whenever a timer tick wins.
    async fn wait(&mut self) -> Result<ChildExit, ChildError>;

    /// Requests forced termination without waiting for it.
    fn kill(&mut self) -> Result<(), ChildError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanliness() {
        assert!(ChildExit::code(0).is_clean());
        assert!(!ChildExit::code(1).is_clean());
        assert!(!ChildExit::signal(9).is_clean());
        assert_eq!(ChildExit::signal(9).to_string(), "signal 9");
        assert_eq!(ChildExit::code(3).to_string(), "exit code 3");
    }
}
