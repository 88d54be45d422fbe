//! Git invocation through the system `git` binary.
//!
//! All operations shell out with `tokio::process::Command`, inheriting the
//! user's git config, SSH agent, and credential store. Arguments are always
//! passed as a structured list; nothing is ever evaluated by a shell.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;

/// Trait for executing git commands.
///
/// This abstraction allows mocking the git subprocess in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GitExecutor: Send + Sync {
    /// Run git with the given arguments and return its stdout.
    async fn run(&self, args: &[String]) -> Result<String, GitError>;
}

/// Executor that calls the real git binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    bin: PathBuf,
    work_tree: PathBuf,
    git_dir: Option<PathBuf>,
}

impl SystemGit {
    /// Run `bin` inside `work_tree`.
    pub fn new(bin: impl Into<PathBuf>, work_tree: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            work_tree: work_tree.into(),
            git_dir: None,
        }
    }

    /// Use an alternate metadata directory (`--git-dir`), with the work tree
    /// pinned to the watched directory.
    pub fn with_git_dir(mut self, git_dir: Option<PathBuf>) -> Self {
        self.git_dir = git_dir;
        self
    }

    /// Arguments prepended to every invocation.
    fn global_args(&self) -> Vec<String> {
        let mut args = vec!["--no-pager".to_string()];
        if let Some(ref git_dir) = self.git_dir {
            args.push("--git-dir".to_string());
            args.push(git_dir.display().to_string());
            args.push("--work-tree".to_string());
            args.push(self.work_tree.display().to_string());
        }
        args
    }
}

#[async_trait]
impl GitExecutor for SystemGit {
    async fn run(&self, args: &[String]) -> Result<String, GitError> {
        debug!("git {}", args.join(" "));

        let output = Command::new(&self.bin)
            .args(self.global_args())
            .args(args)
            .current_dir(&self.work_tree)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(GitError::SpawnFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(GitError::NonZeroExit {
                command: args.first().cloned().unwrap_or_default(),
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
