//! Error types used by the launcher runtime and its helpers.
//!
//! Each concern gets its own enum so call sites can decide what is fatal:
//!
//! - [`RuntimeError`]: failures of the launcher itself (bind, logging, shutdown grace).
//! - [`ChildError`]: the worker process could not be spawned, awaited or killed.
//! - [`UpdateError`]: the `git` subprocess failed or timed out.
//! - [`AlertError`]: the webhook post failed.
//! - [`BackupError`]: a snapshot directory could not be created.
//! - [`ProbeError`]: memory sampling failed for one tick.
//! - [`CalcError`]: the responder's calculator rejected an expression.
//!
//! Only [`RuntimeError`] ever reaches `main`; the others are logged and
//! swallowed by the supervisor. All of them expose `as_label` for logs.

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// # Errors produced by the launcher runtime.
///
/// These are the only errors that terminate the process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; the worker did not exit after being killed.
    #[error("shutdown timeout {grace:?} exceeded; worker pid={pid:?} still running")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Pid of the worker that did not exit, if known.
        pid: Option<u32>,
    },

    /// The health server could not bind its listen address.
    #[error("failed to bind health server on {addr}: {source}")]
    Bind {
        /// Address the server tried to bind.
        addr: SocketAddr,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The health server stopped with an I/O error.
    #[error("health server failed: {0}")]
    Serve(#[source] io::Error),

    /// The log directory or file could not be prepared.
    #[error("cannot prepare log file {path:?}: {source}")]
    Logging {
        /// Path of the log directory or file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use botvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), pid: None };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Bind { .. } => "runtime_bind",
            RuntimeError::Serve(_) => "runtime_serve",
            RuntimeError::Logging { .. } => "runtime_logging",
        }
    }
}

/// # Errors produced while managing the worker process.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ChildError {
    /// The process could not be created at all.
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        /// Program that was executed.
        program: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Waiting for the process exit status failed.
    #[error("failed to wait for worker: {0}")]
    Wait(#[source] io::Error),

    /// Sending the kill signal failed.
    #[error("failed to kill worker: {0}")]
    Kill(#[source] io::Error),
}

impl ChildError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ChildError::Spawn { .. } => "child_spawn",
            ChildError::Wait(_) => "child_wait",
            ChildError::Kill(_) => "child_kill",
        }
    }
}

/// # Errors produced by the git updater.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum UpdateError {
    /// The command could not be started or its output read.
    #[error("`{command}` could not run: {source}")]
    Io {
        /// Command line that was attempted.
        command: String,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The command did not finish within the configured timeout.
    #[error("`{command}` timed out after {timeout:?}")]
    Timeout {
        /// Command line that was attempted.
        command: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// The command exited unsuccessfully.
    #[error("`{command}` exited with code {code:?}: {stderr}")]
    Failed {
        /// Command line that was attempted.
        command: String,
        /// Exit code, absent when killed by a signal.
        code: Option<i32>,
        /// Trimmed standard error output.
        stderr: String,
    },
}

impl UpdateError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            UpdateError::Io { .. } => "update_io",
            UpdateError::Timeout { .. } => "update_timeout",
            UpdateError::Failed { .. } => "update_failed",
        }
    }
}

/// # Errors produced by the webhook alerter.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum AlertError {
    /// The HTTP client could not be constructed.
    #[error("failed to build webhook client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request failed in transport or returned a non-success status.
    #[error("webhook request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl AlertError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            AlertError::Client(_) => "alert_client",
            AlertError::Request(_) => "alert_request",
        }
    }
}

/// # Errors produced while taking a backup snapshot.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BackupError {
    /// The snapshot directory could not be created.
    #[error("cannot create backup directory {path:?}: {source}")]
    CreateDir {
        /// Directory that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
}

impl BackupError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            BackupError::CreateDir { .. } => "backup_create_dir",
        }
    }
}

/// # Errors produced by memory sampling.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The process to sample does not exist (anymore).
    #[error("process {pid} not found")]
    ProcessNotFound {
        /// Pid that was looked up.
        pid: u32,
    },

    /// The launcher could not determine its own pid.
    #[error("cannot determine current pid: {0}")]
    CurrentPid(String),

    /// The worker has no pid (already reaped).
    #[error("worker has no pid")]
    NoPid,
}

impl ProbeError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProbeError::ProcessNotFound { .. } => "probe_not_found",
            ProbeError::CurrentPid(_) => "probe_current_pid",
            ProbeError::NoPid => "probe_no_pid",
        }
    }
}

/// # Errors produced by the responder's calculator.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalcError {
    /// Nothing to evaluate.
    #[error("empty expression")]
    Empty,

    /// A character outside digits, operators, parentheses and whitespace.
    #[error("unsupported character {0:?}")]
    InvalidChar(char),

    /// A number literal that does not parse (e.g. `1.2.3`).
    #[error("malformed number {0:?}")]
    BadNumber(String),

    /// Operator or parenthesis in the wrong place.
    #[error("unexpected {0}")]
    Syntax(String),

    /// Result is infinite or NaN (division by zero, overflow).
    #[error("result is not a finite number")]
    NotFinite,

    /// Parentheses or signs nested past the parser's depth limit.
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

impl CalcError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CalcError::Empty => "calc_empty",
            CalcError::InvalidChar(_) => "calc_invalid_char",
            CalcError::BadNumber(_) => "calc_bad_number",
            CalcError::Syntax(_) => "calc_syntax",
            CalcError::NotFinite => "calc_not_finite",
            CalcError::TooDeep(_) => "calc_too_deep",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_are_stable() {
        let err = ChildError::Spawn {
            program: "cyber".into(),
            source: io::Error::new(io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.as_label(), "child_spawn");
        assert!(err.to_string().contains("cyber"));

        let err = UpdateError::Timeout {
            command: "git pull".into(),
            timeout: Duration::from_secs(1),
        };
        assert_eq!(err.as_label(), "update_timeout");
        assert_eq!(err.to_string(), "`git pull` timed out after 1s");

        assert_eq!(ProbeError::ProcessNotFound { pid: 7 }.to_string(), "process 7 not found");
    }
}
