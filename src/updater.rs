//! Git auto-update.
//!
//! Before every (re)start the supervisor asks an [`Update`] whether new code
//! arrived. [`GitUpdater`] runs `git pull` in the repository and decides
//! "fresh content" in one of two ways ([`UpdateDetection`]):
//!
//! - `Marker`: stdout does not contain git's "Already up to date" message;
//! - `Revision`: `git rev-parse HEAD` differs before and after the pull.
//!
//! Every git invocation is bounded by a timeout and killed when it expires.
//! Failures are logged with the `GIT ERROR` tag and count as "no update".

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::UpdateError;

const UP_TO_DATE_MARKERS: [&str; 2] = ["Already up to date", "Already up-to-date"];

/// Source of "new code was pulled" signals.
#[async_trait]
pub trait Update: Send + Sync + 'static {
    /// Pulls updates; true when new content was fetched. Never fails.
    async fn pull(&self) -> bool;
}

/// Updater that never reports updates (`AUTO_UPDATE=false`).
#[derive(Clone, Copy, Debug, Default)]
pub struct NoUpdates;

#[async_trait]
impl Update for NoUpdates {
    async fn pull(&self) -> bool {
        false
    }
}

/// How [`GitUpdater`] decides that a pull fetched something.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UpdateDetection {
    /// Look for git's "Already up to date" message on stdout.
    #[default]
    Marker,
    /// Compare `HEAD` before and after the pull.
    Revision,
}

/// Error returned when a detection mode name is not recognised.
#[derive(Debug, PartialEq, Eq)]
pub struct ParseDetectionError(String);

impl fmt::Display for ParseDetectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown update detection {:?} (expected marker or revision)", self.0)
    }
}

impl std::error::Error for ParseDetectionError {}

impl FromStr for UpdateDetection {
    type Err = ParseDetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "marker" => Ok(UpdateDetection::Marker),
            "revision" | "rev" | "head" => Ok(UpdateDetection::Revision),
            other => Err(ParseDetectionError(other.to_string())),
        }
    }
}

/// Runs `git pull` in a repository.
#[derive(Clone, Debug)]
pub struct GitUpdater {
    git: String,
    repo: PathBuf,
    timeout: Duration,
    detection: UpdateDetection,
}

impl GitUpdater {
    /// Creates an updater for `repo` using `git` from `PATH`, a 60s timeout and marker detection.
    pub fn new(repo: impl Into<PathBuf>) -> Self {
        Self {
            git: "git".to_string(),
            repo: repo.into(),
            timeout: Duration::from_secs(60),
            detection: UpdateDetection::Marker,
        }
    }

    /// Overrides the git executable.
    pub fn with_git(mut self, git: impl Into<String>) -> Self {
        self.git = git.into();
        self
    }

    /// Overrides the per-command timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Overrides the detection mode.
    pub fn with_detection(mut self, detection: UpdateDetection) -> Self {
        self.detection = detection;
        self
    }

    /// Pulls and reports whether new content arrived.
    pub async fn try_pull(&self) -> Result<bool, UpdateError> {
        match self.detection {
            UpdateDetection::Marker => {
                let stdout = self.git(&["pull"]).await?;
                Ok(!UP_TO_DATE_MARKERS.iter().any(|m| stdout.contains(m)))
            }
            UpdateDetection::Revision => {
                let before = self.git(&["rev-parse", "HEAD"]).await?;
                self.git(&["pull"]).await?;
                let after = self.git(&["rev-parse", "HEAD"]).await?;
                Ok(before.trim() != after.trim())
            }
        }
    }

    /// Runs one git command and returns its stdout.
    async fn git(&self, args: &[&str]) -> Result<String, UpdateError> {
        let command = format!("{} {}", self.git, args.join(" "));
        let child = Command::new(&self.git)
            .args(args)
            .current_dir(&self.repo)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(res) => res.map_err(|source| UpdateError::Io {
                command: command.clone(),
                source,
            })?,
            Err(_elapsed) => {
                return Err(UpdateError::Timeout {
                    command,
                    timeout: self.timeout,
                });
            }
        };

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(UpdateError::Failed {
                command,
                code: output.status.code(),
                stderr,
            });
        }
        if !stderr.is_empty() {
            debug!(tag = "UPDATE", %command, "{stderr}");
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Update for GitUpdater {
    async fn pull(&self) -> bool {
        info!(tag = "UPDATE", "checking for updates via git pull");
        match self.try_pull().await {
            Ok(true) => {
                info!(tag = "UPDATE", "updates found and pulled");
                true
            }
            Ok(false) => {
                info!(tag = "UPDATE", "no new updates found");
                false
            }
            Err(err) => {
                warn!(tag = "GIT ERROR", error = err.as_label(), "git pull failed: {err}");
                false
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    // `sh <name> args..` runs the script file `<name>` from the repo dir,
    // which lets a directory of scripts stand in for git.
    fn script(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn fake_git(dir: &Path) -> GitUpdater {
        GitUpdater::new(dir)
            .with_git("sh")
            .with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_marker_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        script(dir.path(), "pull", "echo 'Already up to date.'\n");
        assert!(!fake_git(dir.path()).try_pull().await.unwrap());
    }

    #[tokio::test]
    async fn test_marker_old_spelling() {
        let dir = tempfile::tempdir().unwrap();
        script(dir.path(), "pull", "echo 'Already up-to-date.'\n");
        assert!(!fake_git(dir.path()).pull().await);
    }

    #[tokio::test]
    async fn test_marker_fresh_content() {
        let dir = tempfile::tempdir().unwrap();
        script(
            dir.path(),
            "pull",
            "echo 'Updating 1a2b3c..4d5e6f'\necho 'Fast-forward' \necho 'From origin' >&2\n",
        );
        assert!(fake_git(dir.path()).pull().await);
    }

    #[tokio::test]
    async fn test_failure_counts_as_no_update() {
        let dir = tempfile::tempdir().unwrap();
        script(dir.path(), "pull", "echo 'fatal: not a git repository' >&2\nexit 128\n");
        let updater = fake_git(dir.path());

        match updater.try_pull().await {
            Err(UpdateError::Failed { code, stderr, .. }) => {
                assert_eq!(code, Some(128));
                assert_eq!(stderr, "fatal: not a git repository");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!updater.pull().await);
    }

    #[tokio::test]
    async fn test_timeout_kills_command() {
        let dir = tempfile::tempdir().unwrap();
        script(dir.path(), "pull", "sleep 30\n");
        let updater = fake_git(dir.path()).with_timeout(Duration::from_millis(200));

        let err = updater.try_pull().await.unwrap_err();
        assert_eq!(err.as_label(), "update_timeout");
        assert!(!updater.pull().await);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let updater = GitUpdater::new(dir.path()).with_git("no-such-git-binary-here");
        assert_eq!(updater.try_pull().await.unwrap_err().as_label(), "update_io");
    }

    #[tokio::test]
    async fn test_revision_detection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("HEAD_REV"), "aaa\n").unwrap();
        script(dir.path(), "rev-parse", "cat HEAD_REV\n");
        // Says "up to date" on purpose: revision mode must ignore stdout.
        script(dir.path(), "pull", "echo bbb > HEAD_REV\necho 'Already up to date.'\n");

        let updater = fake_git(dir.path()).with_detection(UpdateDetection::Revision);
        assert!(updater.try_pull().await.unwrap());
        // HEAD is now bbb on both sides.
        assert!(!updater.try_pull().await.unwrap());
    }

    #[test]
    fn test_detection_parse() {
        assert_eq!("revision".parse::<UpdateDetection>(), Ok(UpdateDetection::Revision));
        assert!("guess".parse::<UpdateDetection>().is_err());
    }

    #[tokio::test]
    async fn test_no_updates() {
        assert!(!NoUpdates.pull().await);
    }
}
