//! Per-batch commit pipeline: status → message → add → commit → pull → push.

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::GitError;
use crate::git::ops::{self, AddTarget};
use crate::git::{GitExecutor, RemoteSync};

use super::message::{ChangeReport, CommitMessageBuilder};

/// What one settled batch ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Status was empty; nothing was staged or committed.
    Clean,
    /// A merge is in progress and merge-guarding is enabled.
    MergeInProgress,
    /// A commit was created.
    Committed { message: String, pushed: bool },
}

/// Drives the git collaborator for each settled batch.
pub struct CommitOrchestrator<E> {
    git: E,
    target: AddTarget,
    message: CommitMessageBuilder,
    remote: Option<RemoteSync>,
    skip_if_merging: bool,
}

impl<E: GitExecutor> CommitOrchestrator<E> {
    pub fn new(
        git: E,
        target: AddTarget,
        message: CommitMessageBuilder,
        remote: Option<RemoteSync>,
    ) -> Self {
        Self {
            git,
            target,
            message,
            remote,
            skip_if_merging: false,
        }
    }

    /// Skip batches while `MERGE_HEAD` exists.
    pub fn skip_if_merging(mut self, skip: bool) -> Self {
        self.skip_if_merging = skip;
        self
    }

    /// Commit (and push) whatever the working tree holds right now.
    ///
    /// Errors are returned as-is; the caller logs them and keeps watching.
    pub async fn commit_batch(&self) -> Result<BatchOutcome, GitError> {
        let status = ops::status(&self.git, &self.target).await?;
        if status.trim().is_empty() {
            debug!("Settled with a clean tree, nothing to commit");
            return Ok(BatchOutcome::Clean);
        }

        if self.skip_if_merging && ops::merge_in_progress(&self.git).await? {
            warn!("Merge in progress, skipping commit");
            return Ok(BatchOutcome::MergeInProgress);
        }

        let report = match self.message.list_changes() {
            Some(policy) => Some(ChangeReport {
                diff: ops::diff(&self.git, &self.target, policy.color).await?,
                stat: ops::diff_stat(&self.git, &self.target, policy.color).await?,
                status,
            }),
            None => None,
        };
        let message = self.message.build(&Local::now(), report.as_ref());

        ops::add(&self.git, &self.target).await?;
        ops::commit(&self.git, &message).await?;
        info!("Committed: {}", message.lines().next().unwrap_or_default());

        let Some(ref remote) = self.remote else {
            return Ok(BatchOutcome::Committed {
                message,
                pushed: false,
            });
        };

        if let Some(ref pull) = remote.pull {
            self.git.run(pull).await?;
            debug!("Rebased onto remote");
        }
        self.git.run(&remote.push).await?;
        info!("Pushed: git {}", remote.push.join(" "));

        Ok(BatchOutcome::Committed {
            message,
            pushed: true,
        })
    }
}
