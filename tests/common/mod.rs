//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use git2::{IndexAddOption, Oid, Repository, Signature, StatusOptions};

use gitwatch::SystemGit;

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory, with a local
    /// identity so the git CLI can commit.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");

        let mut config = repo.config().expect("Failed to open repo config");
        config.set_str("user.name", "Test User").expect("Failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Failed to set user.email");
        config
            .set_bool("commit.gpgsign", false)
            .expect("Failed to disable signing");

        Self { dir, repo }
    }

    /// Canonical path of the work tree (temp dirs may sit behind symlinks).
    pub fn path(&self) -> PathBuf {
        std::fs::canonicalize(self.dir.path()).expect("Failed to canonicalize temp dir")
    }

    /// Executor running the system git in this repository.
    pub fn git(&self) -> SystemGit {
        SystemGit::new("git", self.path())
    }

    /// Write a file relative to the work tree, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Stage everything and commit with git2. Returns the commit OID.
    pub fn commit_all(&self, message: &str) -> Oid {
        let sig = Signature::now("Test User", "test@example.com").expect("Failed to create signature");

        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("Failed to stage files");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Number of commits reachable from HEAD (0 for an unborn branch).
    pub fn commit_count(&self) -> usize {
        let repo = Repository::open(self.dir.path()).expect("Failed to reopen repo");
        let Ok(mut walk) = repo.revwalk() else {
            return 0;
        };
        if walk.push_head().is_err() {
            return 0;
        }
        walk.count()
    }

    /// Message of the HEAD commit, without the trailing newline git adds.
    pub fn head_message(&self) -> String {
        let repo = Repository::open(self.dir.path()).expect("Failed to reopen repo");
        let commit = repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("Failed to read HEAD commit");
        commit.message().unwrap_or("").trim_end().to_string()
    }

    /// Paths in the HEAD commit's tree (top level only).
    pub fn head_tree_entries(&self) -> Vec<String> {
        let repo = Repository::open(self.dir.path()).expect("Failed to reopen repo");
        let tree = repo
            .head()
            .and_then(|h| h.peel_to_tree())
            .expect("Failed to read HEAD tree");
        tree.iter()
            .filter_map(|e| e.name().map(String::from))
            .collect()
    }

    /// Whether the work tree has no changes, untracked files included.
    pub fn is_clean(&self) -> bool {
        let repo = Repository::open(self.dir.path()).expect("Failed to reopen repo");
        let mut opts = StatusOptions::new();
        opts.include_untracked(true).recurse_untracked_dirs(true);
        repo.statuses(Some(&mut opts))
            .expect("Failed to read status")
            .is_empty()
    }

    /// Name of the branch HEAD points to.
    pub fn current_branch(&self) -> String {
        self.repo
            .head()
            .expect("Failed to read HEAD")
            .shorthand()
            .expect("HEAD has no shorthand")
            .to_string()
    }

    /// Point HEAD directly at a commit.
    pub fn detach_head(&self, oid: Oid) {
        self.repo.set_head_detached(oid).expect("Failed to detach HEAD");
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    condition()
}

