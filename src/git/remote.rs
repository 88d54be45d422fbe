//! Push target resolution: remote, branch, and detached-HEAD disambiguation.

use super::head::HeadState;

/// Git argument lists for syncing with the remote after a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSync {
    pub push: Vec<String>,
    /// `pull --rebase` run before pushing, when enabled.
    pub pull: Option<Vec<String>>,
}

/// Resolve the push (and optional pull) invocation.
///
/// | remote | branch | HEAD at startup | push                       |
/// |--------|--------|-----------------|----------------------------|
/// | empty  | any    | any             | none                       |
/// | set    | empty  | any             | `push <remote>`            |
/// | set    | set    | attached to B   | `push <remote> B:<branch>` |
/// | set    | set    | detached        | `push <remote> <branch>`   |
pub fn resolve_remote_sync(
    remote: &str,
    branch: &str,
    head: &HeadState,
    pull_rebase: bool,
) -> Option<RemoteSync> {
    if remote.is_empty() {
        return None;
    }

    let mut push = vec!["push".to_string(), remote.to_string()];
    let mut pull = vec!["pull".to_string(), "--rebase".to_string(), remote.to_string()];

    if !branch.is_empty() {
        match head {
            HeadState::Attached(current) => push.push(format!("{}:{}", current, branch)),
            HeadState::Detached => push.push(branch.to_string()),
        }
        pull.push(branch.to_string());
    }

    Some(RemoteSync {
        push,
        pull: pull_rebase.then_some(pull),
    })
}
