//! Logging setup: console plus a plain-text log file.
//!
//! The file is rotated per launch: an existing non-empty log is renamed to
//! `<stem>-<timestamp>.<ext>` before the new one is opened.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::RuntimeError;

/// Installs the global subscriber. Keep the guard alive until exit so
/// buffered lines reach the file.
pub fn init_logging(dir: &Path, file: &str) -> Result<WorkerGuard, RuntimeError> {
    fs::create_dir_all(dir).map_err(logging_err(dir))?;
    let path = dir.join(file);
    let rotated = rotate_previous(&path, Utc::now()).map_err(logging_err(&path))?;

    // rolling::never panics when it cannot open the file
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(logging_err(&path))?;

    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = tracing_subscriber::fmt::layer().with_target(false);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false);

    // a subscriber installed earlier (tests, embedding) wins
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file_layer)
        .try_init();

    if let Some(old) = rotated {
        tracing::info!(tag = "INFO", previous = %old.display(), "rotated previous log");
    }
    Ok(guard)
}

fn logging_err(path: &Path) -> impl FnOnce(io::Error) -> RuntimeError {
    let path = path.to_path_buf();
    move |source| RuntimeError::Logging { path, source }
}

/// Renames a non-empty `path` to `<stem>-<timestamp>.<ext>` next to it.
///
/// Returns the new name, or `None` when there was nothing to rotate.
pub fn rotate_previous(path: &Path, now: DateTime<Utc>) -> io::Result<Option<PathBuf>> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => {}
        Ok(_) => return Ok(None),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "launcher".to_string());
    let stamp = now.format("%Y-%m-%dT%H-%M-%S-%3fZ");
    let name = match path.extension() {
        Some(ext) => format!("{stem}-{stamp}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{stamp}"),
    };
    let target = path.with_file_name(name);
    fs::rename(path, &target)?;
    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_rotates_non_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("launcher.log");
        fs::write(&log, "old run\n").unwrap();

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let rotated = rotate_previous(&log, now).unwrap().unwrap();

        assert_eq!(
            rotated.file_name().unwrap(),
            "launcher-2024-03-01T12-30-05-000Z.log"
        );
        assert!(!log.exists());
        assert_eq!(fs::read_to_string(rotated).unwrap(), "old run\n");
    }

    #[test]
    fn test_skips_missing_or_empty_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("launcher.log");
        assert_eq!(rotate_previous(&log, Utc::now()).unwrap(), None);

        fs::write(&log, "").unwrap();
        assert_eq!(rotate_previous(&log, Utc::now()).unwrap(), None);
        assert!(log.exists());
    }

    #[test]
    fn test_init_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("nested/logs");
        let _guard = init_logging(&logs, "launcher.log").unwrap();
        assert!(logs.join("launcher.log").exists());
    }
}
