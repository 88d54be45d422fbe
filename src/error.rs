//! Error types for gitwatch modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Exit code for a missing or invalid target (help is shown).
pub const EXIT_USAGE: u8 = 1;
/// Exit code for a required external command that cannot be found.
pub const EXIT_MISSING_COMMAND: u8 = 2;
/// Exit code for a target that cannot be resolved to a file or directory.
pub const EXIT_TARGET_UNRESOLVED: u8 = 3;
/// Exit code for a git metadata path that is not a directory.
pub const EXIT_GIT_DIR_NOT_DIRECTORY: u8 = 4;
/// Exit code for a failed change into the target directory.
pub const EXIT_CHDIR_FAILED: u8 = 5;
/// Exit code for fatal failures after startup (watcher died, HEAD unreadable).
pub const EXIT_RUNTIME: u8 = 6;

/// Startup configuration errors. Each maps to a distinct process exit code.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("No target given. Specify a file or directory to watch.")]
    MissingTarget,

    #[error("Required command '{0}' not found.")]
    CommandNotFound(String),

    #[error("The target '{}' is neither a regular file nor a directory.", .0.display())]
    TargetUnresolved(PathBuf),

    #[error("Path resolution with '{tool}' failed for '{}': {reason}", target.display())]
    PathResolutionFailed {
        tool: String,
        target: PathBuf,
        reason: String,
    },

    #[error(".git location is not a directory: {}", .0.display())]
    GitDirNotDirectory(PathBuf),

    #[error("Can't change directory to '{}': {source}", path.display())]
    ChangeDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid date format '{0}'")]
    InvalidDateFormat(String),

    #[error("Invalid debounce delay '{0}' (expected a non-negative number of seconds)")]
    InvalidDelay(String),
}

impl ConfigError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::MissingTarget
            | ConfigError::InvalidDateFormat(_)
            | ConfigError::InvalidDelay(_) => EXIT_USAGE,
            ConfigError::CommandNotFound(_) => EXIT_MISSING_COMMAND,
            ConfigError::TargetUnresolved(_) | ConfigError::PathResolutionFailed { .. } => {
                EXIT_TARGET_UNRESOLVED
            }
            ConfigError::GitDirNotDirectory(_) => EXIT_GIT_DIR_NOT_DIRECTORY,
            ConfigError::ChangeDirectory { .. } => EXIT_CHDIR_FAILED,
        }
    }
}

/// Errors from git invocations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to spawn git process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("git {command} exited with code {code}: {stderr}")]
    NonZeroExit {
        command: String,
        code: i32,
        stderr: String,
    },
}

impl GitError {
    /// Whether git ran and reported failure, as opposed to not running at all.
    pub fn is_non_zero_exit(&self) -> bool {
        matches!(self, GitError::NonZeroExit { .. })
    }
}

/// Errors from the external filesystem watcher.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to spawn watcher '{}': {source}", bin.display())]
    SpawnFailed {
        bin: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Watcher produced no output stream")]
    NoStdout,

    #[error("Watcher exited; no further changes can be observed")]
    WatcherExited,
}
