//! # Restart policies for the supervised worker.
//!
//! [`RestartPolicy`] decides what happens after the worker exits.
//!
//! ```text
//! exit code 0        exit code != 0 / signal / spawn error
//! ─────────────      ──────────────────────────────────────
//! Never     → stop   Never     → stop
//! OnFailure → stop   OnFailure → restart with backoff   (default)
//! Always    → restart after `first`, Always → restart with backoff
//! ```
//!
//! A clean exit under `OnFailure` is how the bot asks to be left alone.

use std::fmt;
use std::str::FromStr;

/// Policy controlling whether the worker is restarted after it exits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RestartPolicy {
    /// Never restart: the first exit of any kind is terminal.
    Never,
    /// Restart only when the worker crashed (default).
    #[default]
    OnFailure,
    /// Restart unconditionally; clean exits restart after the initial delay.
    Always,
}

impl RestartPolicy {
    /// Returns true if an exit with the given cleanliness should be followed by a restart.
    pub fn restarts_after(&self, clean: bool) -> bool {
        match self {
            RestartPolicy::Never => false,
            RestartPolicy::OnFailure => !clean,
            RestartPolicy::Always => true,
        }
    }
}

/// Error returned when a restart policy name is not recognised.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseRestartError(String);

impl fmt::Display for ParseRestartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown restart policy {:?} (expected never, on-failure or always)",
            self.0
        )
    }
}

impl std::error::Error for ParseRestartError {}

impl FromStr for RestartPolicy {
    type Err = ParseRestartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "never" => Ok(RestartPolicy::Never),
            "on-failure" => Ok(RestartPolicy::OnFailure),
            "always" => Ok(RestartPolicy::Always),
            other => Err(ParseRestartError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_restart_matrix() {
        assert!(!RestartPolicy::Never.restarts_after(false));
        assert!(!RestartPolicy::OnFailure.restarts_after(true));
        assert!(RestartPolicy::OnFailure.restarts_after(false));
        assert!(RestartPolicy::Always.restarts_after(true));
    }

    #[test]
    fn test_parse() {
        assert_eq!("on_failure".parse::<RestartPolicy>(), Ok(RestartPolicy::OnFailure));
        assert_eq!("ALWAYS".parse::<RestartPolicy>(), Ok(RestartPolicy::Always));
        assert!("sometimes".parse::<RestartPolicy>().is_err());
    }
}
