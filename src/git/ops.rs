//! Git operations used by the commit pipeline: status, diff, add, commit.

use std::path::PathBuf;

use crate::error::GitError;

use super::executor::GitExecutor;

/// The path set staged on every commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddTarget {
    /// Watching a directory: stage the whole tree (`git add --all .`).
    Tree,
    /// Watching a single file: stage only that file.
    File(PathBuf),
}

impl AddTarget {
    /// Pathspec scoping status queries to what will be staged.
    pub fn pathspec(&self) -> String {
        match self {
            AddTarget::Tree => ".".to_string(),
            AddTarget::File(path) => path.display().to_string(),
        }
    }
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Porcelain status of the target, including every untracked file.
pub async fn status<E: GitExecutor + ?Sized>(git: &E, target: &AddTarget) -> Result<String, GitError> {
    let mut args = owned(&["status", "--porcelain", "--untracked-files=all", "--"]);
    args.push(target.pathspec());
    git.run(&args).await
}

/// Zero-context diff of the target's working tree against the index.
pub async fn diff<E: GitExecutor + ?Sized>(
    git: &E,
    target: &AddTarget,
    color: bool,
) -> Result<String, GitError> {
    let mut args = owned(&["diff", "-U0"]);
    args.push(color_flag(color));
    args.push("--".to_string());
    args.push(target.pathspec());
    git.run(&args).await
}

/// `--stat` overview of the target's working tree against the index.
pub async fn diff_stat<E: GitExecutor + ?Sized>(
    git: &E,
    target: &AddTarget,
    color: bool,
) -> Result<String, GitError> {
    let mut args = owned(&["diff", "--stat"]);
    args.push(color_flag(color));
    args.push("--".to_string());
    args.push(target.pathspec());
    git.run(&args).await
}

fn color_flag(color: bool) -> String {
    if color {
        "--color=always".to_string()
    } else {
        "--no-color".to_string()
    }
}

/// Stage the target.
pub async fn add<E: GitExecutor + ?Sized>(git: &E, target: &AddTarget) -> Result<(), GitError> {
    let args = match target {
        AddTarget::Tree => owned(&["add", "--all", "."]),
        AddTarget::File(path) => vec!["add".to_string(), path.display().to_string()],
    };
    git.run(&args).await.map(|_| ())
}

/// Create a commit from the index.
pub async fn commit<E: GitExecutor + ?Sized>(git: &E, message: &str) -> Result<String, GitError> {
    let args = vec!["commit".to_string(), "-m".to_string(), message.to_string()];
    git.run(&args).await
}

/// Whether a merge is in progress (`MERGE_HEAD` exists).
pub async fn merge_in_progress<E: GitExecutor + ?Sized>(git: &E) -> Result<bool, GitError> {
    let args = owned(&["rev-parse", "-q", "--verify", "MERGE_HEAD"]);
    match git.run(&args).await {
        Ok(_) => Ok(true),
        Err(e) if e.is_non_zero_exit() => Ok(false),
        Err(e) => Err(e),
    }
}
