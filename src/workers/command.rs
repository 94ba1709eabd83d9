//! Process-backed worker.
//!
//! [`CommandWorker`] runs an external program with inherited stdio in a fixed
//! working directory. Children are killed when their handle is dropped, so a
//! launcher that dies never leaves an orphan bot behind.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::error::ChildError;
use crate::workers::worker::{ChildExit, RunningWorker, Worker};

/// Spawns `program args..` in `cwd`.
#[derive(Clone, Debug)]
pub struct CommandWorker {
    program: String,
    args: Vec<String>,
    cwd: PathBuf,
}

impl CommandWorker {
    /// Creates a worker for `program` with no arguments, running in the current directory.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: PathBuf::from("."),
        }
    }

    /// Sets the program arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }
}

impl Worker for CommandWorker {
    fn name(&self) -> &str {
        &self.program
    }

    fn spawn(&self) -> Result<Box<dyn RunningWorker>, ChildError> {
        let child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ChildError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        Ok(Box::new(ProcessHandle { child }))
    }
}

struct ProcessHandle {
    child: Child,
}

#[async_trait]
impl RunningWorker for ProcessHandle {
    fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait(&mut self) -> Result<ChildExit, ChildError> {
        let status = self.child.wait().await.map_err(ChildError::Wait)?;
        Ok(status.into())
    }

    fn kill(&mut self) -> Result<(), ChildError> {
        self.child.start_kill().map_err(ChildError::Kill)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_exit_code_is_reported() {
        let worker = CommandWorker::new("sh").with_args(["-c", "exit 3"]);
        let mut child = worker.spawn().unwrap();
        assert!(child.pid().is_some());
        let exit = child.wait().await.unwrap();
        assert_eq!(exit, ChildExit::code(3));
    }

    #[tokio::test]
    async fn test_kill_ends_with_signal() {
        let worker = CommandWorker::new("sleep").with_args(["30"]);
        let mut child = worker.spawn().unwrap();
        child.kill().unwrap();
        let exit = tokio::time::timeout(Duration::from_secs(5), child.wait())
            .await
            .expect("killed child exits")
            .unwrap();
        assert_eq!(exit.code, None);
        assert_eq!(exit.signal, Some(9));
        assert!(!exit.is_clean());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let worker = CommandWorker::new("definitely-not-a-real-bot-binary");
        let err = worker.spawn().err().expect("spawn must fail");
        assert_eq!(err.as_label(), "child_spawn");
        assert!(err.to_string().contains("definitely-not-a-real-bot-binary"));
    }

    #[tokio::test]
    async fn test_runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let worker = CommandWorker::new("sh")
            .with_args(["-c", "touch here"])
            .with_cwd(dir.path());
        let exit = worker.spawn().unwrap().wait().await.unwrap();
        assert!(exit.is_clean());
        assert!(dir.path().join("here").exists());
    }
}
