//! State backups taken before a forced restart.
//!
//! [`BackupSet::snapshot`] creates `backup-<UTC timestamp>` under the root
//! directory and copies every listed file that exists. Snapshots are never
//! overwritten: when the folder name is taken, `-1`, `-2`, ... is appended.
//! Missing files are skipped silently; a file that fails to copy is logged
//! and the rest are still copied.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::error::BackupError;

/// Result of one snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Directory that was created.
    pub dir: PathBuf,
    /// File names that were copied into it.
    pub copied: Vec<String>,
}

/// Fixed list of files to back up, relative to `root`.
#[derive(Debug, Clone)]
pub struct BackupSet {
    root: PathBuf,
    files: Vec<String>,
}

impl BackupSet {
    /// Creates a backup set for `files` under `root`.
    pub fn new(root: impl Into<PathBuf>, files: Vec<String>) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }

    /// Takes a snapshot now.
    pub async fn snapshot(&self) -> Result<Snapshot, BackupError> {
        self.snapshot_at(Utc::now()).await
    }

    /// Takes a snapshot named after `at`.
    pub async fn snapshot_at(&self, at: DateTime<Utc>) -> Result<Snapshot, BackupError> {
        let dir = create_unique_dir(&self.root, &folder_name(at)).await?;

        let mut copied = Vec::new();
        for file in &self.files {
            let src = self.root.join(file);
            if !tokio::fs::try_exists(&src).await.unwrap_or(false) {
                continue;
            }
            match tokio::fs::copy(&src, dir.join(file)).await {
                Ok(_) => {
                    info!(tag = "BACKUP", file = %file, dir = %dir.display(), "backed up file");
                    copied.push(file.clone());
                }
                Err(err) => {
                    warn!(tag = "BACKUP ERROR", file = %file, "copy failed: {err}");
                }
            }
        }
        Ok(Snapshot { dir, copied })
    }
}

/// `backup-2024-05-01T10-20-30-123Z`: ISO-8601 with `:` and `.` replaced by `-`.
fn folder_name(at: DateTime<Utc>) -> String {
    format!("backup-{}", at.format("%Y-%m-%dT%H-%M-%S-%3fZ"))
}

async fn create_unique_dir(root: &Path, base: &str) -> Result<PathBuf, BackupError> {
    let mut candidate = root.join(base);
    let mut suffix = 0u32;
    loop {
        match tokio::fs::create_dir(&candidate).await {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                suffix += 1;
                candidate = root.join(format!("{base}-{suffix}"));
            }
            Err(source) => {
                return Err(BackupError::CreateDir {
                    path: candidate,
                    source,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 20, 30).unwrap()
    }

    #[test]
    fn test_folder_name() {
        assert_eq!(folder_name(at()), "backup-2024-05-01T10-20-30-000Z");
    }

    #[tokio::test]
    async fn test_copies_only_existing_files() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("appstate.json"), "{\"cookie\":1}").unwrap();
        fs::write(root.path().join("config.json"), "{}").unwrap();

        let set = BackupSet::new(
            root.path(),
            vec![
                "appstate.json".into(),
                "config.json".into(),
                "bot_launcher.log".into(),
            ],
        );
        let snap = set.snapshot_at(at()).await.unwrap();

        assert_eq!(snap.dir, root.path().join("backup-2024-05-01T10-20-30-000Z"));
        assert_eq!(snap.copied, vec!["appstate.json".to_string(), "config.json".to_string()]);
        assert_eq!(
            fs::read_to_string(snap.dir.join("appstate.json")).unwrap(),
            "{\"cookie\":1}"
        );
        assert!(!snap.dir.join("bot_launcher.log").exists());
    }

    #[tokio::test]
    async fn test_no_files_still_creates_folder() {
        let root = tempfile::tempdir().unwrap();
        let set = BackupSet::new(root.path(), vec!["missing.json".into()]);
        let snap = set.snapshot_at(at()).await.unwrap();
        assert!(snap.dir.is_dir());
        assert!(snap.copied.is_empty());
    }

    #[tokio::test]
    async fn test_never_overwrites_previous_snapshot() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("config.json"), "v1").unwrap();
        let set = BackupSet::new(root.path(), vec!["config.json".into()]);

        let first = set.snapshot_at(at()).await.unwrap();
        fs::write(root.path().join("config.json"), "v2").unwrap();
        let second = set.snapshot_at(at()).await.unwrap();

        assert_ne!(first.dir, second.dir);
        assert!(second.dir.ends_with("backup-2024-05-01T10-20-30-000Z-1"));
        assert_eq!(fs::read_to_string(first.dir.join("config.json")).unwrap(), "v1");
        assert_eq!(fs::read_to_string(second.dir.join("config.json")).unwrap(), "v2");
    }

    #[tokio::test]
    async fn test_missing_root_is_error() {
        let root = tempfile::tempdir().unwrap();
        let set = BackupSet::new(root.path().join("nope"), vec![]);
        let err = set.snapshot().await.unwrap_err();
        assert_eq!(err.as_label(), "backup_create_dir");
    }
}
