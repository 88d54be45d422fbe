//! gitwatch - watch a file or directory and commit every change to git.
//!
//! # Overview
//!
//! gitwatch consumes change notifications from an external watcher
//! (`inotifywait` or `fswatch`), coalesces bursts into settled batches, and
//! for each batch stages, commits, and optionally pushes through the system
//! `git` binary. Commit messages are either a timestamped template or a
//! line-numbered summary of the diff.

pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod watch;

// Re-export commonly used types
pub use commit::{BatchOutcome, CommitMessageBuilder, CommitOrchestrator, DiffLine};
pub use config::{Binaries, Settings, WatchConfig};
pub use error::{ConfigError, GitError, WatchError};
pub use git::{AddTarget, GitExecutor, HeadState, RemoteSync, SystemGit};
pub use watch::{ChangeNotification, CommitMode, Debouncer, Settled, WatchLoop};
