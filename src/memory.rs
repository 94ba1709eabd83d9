//! Memory sampling for the watchdog and the health endpoint.
//!
//! [`MemoryProbe`] is the seam; [`SysinfoProbe`] reads resident and virtual
//! memory through `sysinfo`. [`MemoryScope`] selects which process the
//! watchdog compares against the limit: the worker (default) or the launcher
//! itself.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

use crate::error::ProbeError;

/// One memory reading, in bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Resident set size.
    pub rss: u64,
    /// Virtual memory size.
    pub virtual_memory: u64,
}

/// Source of memory readings.
pub trait MemoryProbe: Send + Sync + 'static {
    /// Samples `pid`, or the launcher process when `pid` is `None`.
    fn sample(&self, pid: Option<u32>) -> Result<MemoryUsage, ProbeError>;
}

/// `sysinfo`-backed probe. Keeps one `System` around to avoid re-reading
/// the whole process table on every tick.
pub struct SysinfoProbe {
    sys: Mutex<System>,
}

impl SysinfoProbe {
    /// Creates an empty probe; nothing is read until the first sample.
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoProbe {
    fn sample(&self, pid: Option<u32>) -> Result<MemoryUsage, ProbeError> {
        let pid = match pid {
            Some(raw) => Pid::from_u32(raw),
            None => sysinfo::get_current_pid().map_err(|e| ProbeError::CurrentPid(e.to_string()))?,
        };

        let mut sys = self.sys.lock().unwrap_or_else(PoisonError::into_inner);
        sys.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        let process = sys.process(pid).ok_or(ProbeError::ProcessNotFound {
            pid: pid.as_u32(),
        })?;
        Ok(MemoryUsage {
            rss: process.memory(),
            virtual_memory: process.virtual_memory(),
        })
    }
}

/// Which process the watchdog measures.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MemoryScope {
    /// The supervised worker.
    #[default]
    Child,
    /// The launcher process itself.
    Launcher,
}

/// Error returned when a memory scope name is not recognised.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseScopeError(String);

impl fmt::Display for ParseScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown memory scope {:?} (expected child or launcher)", self.0)
    }
}

impl std::error::Error for ParseScopeError {}

impl FromStr for MemoryScope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "child" | "bot" => Ok(MemoryScope::Child),
            "launcher" | "self" => Ok(MemoryScope::Launcher),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_samples_self() {
        let probe = SysinfoProbe::new();
        let usage = probe.sample(None).unwrap();
        assert!(usage.rss > 0);
    }

    #[test]
    fn test_missing_pid() {
        let probe = SysinfoProbe::new();
        let err = probe.sample(Some(u32::MAX - 1)).unwrap_err();
        assert_eq!(err.as_label(), "probe_not_found");
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!("Launcher".parse::<MemoryScope>(), Ok(MemoryScope::Launcher));
        assert_eq!("child".parse::<MemoryScope>(), Ok(MemoryScope::Child));
        assert!("both".parse::<MemoryScope>().is_err());
    }
}
