//! HEAD state captured once at startup.

use std::fmt;

use tracing::debug;

use crate::error::GitError;

use super::executor::GitExecutor;

/// Where HEAD pointed when gitwatch started.
///
/// Never re-queried: switching branches while gitwatch runs does not change
/// where commits are pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD is attached to the named local branch.
    Attached(String),
    /// HEAD does not track a named branch.
    Detached,
}

impl fmt::Display for HeadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadState::Attached(branch) => write!(f, "branch {}", branch),
            HeadState::Detached => write!(f, "detached HEAD"),
        }
    }
}

/// Read the current HEAD state with `git symbolic-ref --short -q HEAD`.
///
/// A non-zero exit means HEAD is detached. Failing to run git at all is an error.
pub async fn capture_head_state<E: GitExecutor + ?Sized>(git: &E) -> Result<HeadState, GitError> {
    let args = ["symbolic-ref", "--short", "-q", "HEAD"].map(String::from);
    match git.run(&args).await {
        Ok(out) => {
            let branch = out.trim();
            if branch.is_empty() {
                Ok(HeadState::Detached)
            } else {
                Ok(HeadState::Attached(branch.to_string()))
            }
        }
        Err(e) if e.is_non_zero_exit() => {
            debug!("symbolic-ref failed, treating HEAD as detached: {}", e);
            Ok(HeadState::Detached)
        }
        Err(e) => Err(e),
    }
}
