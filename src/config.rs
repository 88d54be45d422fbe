//! Startup configuration: target, binaries, and commit policy, resolved once.
//!
//! Everything here runs before the watch loop starts. Failures map to
//! distinct exit codes through [`ConfigError::exit_code`].

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, warn};

use crate::commit::message::{CommitMessageBuilder, DateFormat, ListChanges};
use crate::error::ConfigError;
use crate::git::{AddTarget, HeadState, RemoteSync, SystemGit, resolve_remote_sync};
use crate::watch::{CommitMode, WatcherCommand, WatcherKind};

/// Overrides the git binary.
pub const GIT_BIN_ENV_VAR: &str = "GW_GIT_BIN";
/// Overrides the watcher binary.
pub const WATCHER_BIN_ENV_VAR: &str = "GW_INW_BIN";
/// Path-resolution tool, run as `<bin> -f <target>`.
pub const READLINK_BIN_ENV_VAR: &str = "GW_RL_BIN";

/// Default debounce delay in seconds.
pub const DEFAULT_SLEEP_SECS: f64 = 2.0;

/// External binaries, taken from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binaries {
    pub git: String,
    pub watcher: String,
    pub readlink: Option<String>,
}

impl Binaries {
    /// Read `GW_GIT_BIN`, `GW_INW_BIN`, and `GW_RL_BIN`, falling back to
    /// platform defaults. Empty values count as unset.
    pub fn from_env(kind: WatcherKind) -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            git: var(GIT_BIN_ENV_VAR).unwrap_or_else(|| "git".to_string()),
            watcher: var(WATCHER_BIN_ENV_VAR).unwrap_or_else(|| kind.default_bin().to_string()),
            readlink: var(READLINK_BIN_ENV_VAR),
        }
    }
}

/// Raw settings as given on the command line or through the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub target: Option<PathBuf>,
    pub sleep_secs: f64,
    pub date_format: String,
    pub remote: String,
    pub branch: String,
    pub git_dir: Option<PathBuf>,
    pub list_changes: Option<ListChanges>,
    pub message: String,
    pub events: Option<String>,
    pub exclude: Option<String>,
    pub pull_rebase: bool,
    pub skip_if_merging: bool,
    pub commit_on_start: bool,
    pub serialize: bool,
}

/// Fully resolved startup configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Absolute path of the watched file or directory.
    pub target: PathBuf,
    /// Directory git runs in: the target itself, or a file target's parent.
    pub target_dir: PathBuf,
    pub add_target: AddTarget,
    pub git_bin: PathBuf,
    pub git_dir: Option<PathBuf>,
    pub watcher: WatcherCommand,
    pub delay: Duration,
    pub message: CommitMessageBuilder,
    pub remote: String,
    pub branch: String,
    pub pull_rebase: bool,
    pub skip_if_merging: bool,
    pub commit_on_start: bool,
    pub mode: CommitMode,
}

impl WatchConfig {
    /// Resolve settings against the filesystem and `PATH`.
    ///
    /// Checks run in this order: required commands, target, git dir, delay,
    /// date format.
    pub fn resolve(settings: Settings, binaries: &Binaries, kind: WatcherKind) -> Result<Self, ConfigError> {
        let git_bin = find_command(&binaries.git)?;
        let watcher_bin = find_command(&binaries.watcher)?;
        let readlink_bin = binaries.readlink.as_deref().map(find_command).transpose()?;

        let raw_target = settings.target.ok_or(ConfigError::MissingTarget)?;
        let target = resolve_path(&raw_target, readlink_bin.as_deref())?;

        let (target_dir, add_target, target_is_dir) = if target.is_dir() {
            (target.clone(), AddTarget::Tree, true)
        } else if target.is_file() {
            let parent = target
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| ConfigError::TargetUnresolved(raw_target.clone()))?;
            (parent, AddTarget::File(target.clone()), false)
        } else {
            return Err(ConfigError::TargetUnresolved(raw_target));
        };

        let git_dir = match settings.git_dir {
            Some(dir) if !dir.is_dir() => return Err(ConfigError::GitDirNotDirectory(dir)),
            Some(dir) => Some(std::fs::canonicalize(&dir).unwrap_or(dir)),
            None => None,
        };

        let delay = Duration::try_from_secs_f64(settings.sleep_secs)
            .map_err(|_| ConfigError::InvalidDelay(settings.sleep_secs.to_string()))?;

        let date_format = DateFormat::parse(&settings.date_format)?;
        let message = CommitMessageBuilder::new(settings.message, date_format, settings.list_changes);

        let watcher = WatcherCommand {
            kind,
            bin: watcher_bin,
            target: target.clone(),
            target_is_dir,
            events: settings.events.filter(|e| !e.is_empty()),
            exclude: settings.exclude.filter(|e| !e.is_empty()),
        };

        debug!("Resolved target {} (git runs in {})", target.display(), target_dir.display());

        Ok(Self {
            target,
            target_dir,
            add_target,
            git_bin,
            git_dir,
            watcher,
            delay,
            message,
            remote: settings.remote,
            branch: settings.branch,
            pull_rebase: settings.pull_rebase,
            skip_if_merging: settings.skip_if_merging,
            commit_on_start: settings.commit_on_start,
            mode: if settings.serialize {
                CommitMode::Serialized
            } else {
                CommitMode::Concurrent
            },
        })
    }

    /// Change the process working directory to the target directory.
    pub fn enter_target_dir(&self) -> Result<(), ConfigError> {
        env::set_current_dir(&self.target_dir).map_err(|source| ConfigError::ChangeDirectory {
            path: self.target_dir.clone(),
            source,
        })
    }

    /// The git executor for this target.
    pub fn git(&self) -> SystemGit {
        SystemGit::new(&self.git_bin, &self.target_dir).with_git_dir(self.git_dir.clone())
    }

    /// Push/pull arguments for the HEAD state captured at startup.
    pub fn remote_sync(&self, head: &HeadState) -> Option<RemoteSync> {
        if self.remote.is_empty() && !self.branch.is_empty() {
            warn!("Branch '{}' given without a remote; nothing will be pushed", self.branch);
        }
        resolve_remote_sync(&self.remote, &self.branch, head, self.pull_rebase)
    }
}

/// Locate a command by name or path.
fn find_command(name: &str) -> Result<PathBuf, ConfigError> {
    which::which(name).map_err(|_| ConfigError::CommandNotFound(name.to_string()))
}

/// Make the target absolute, with the external tool when one is configured.
fn resolve_path(target: &Path, readlink: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let Some(tool) = readlink else {
        return std::fs::canonicalize(target)
            .map_err(|_| ConfigError::TargetUnresolved(target.to_path_buf()));
    };

    let failed = |reason: String| ConfigError::PathResolutionFailed {
        tool: tool.display().to_string(),
        target: target.to_path_buf(),
        reason,
    };

    let output = Command::new(tool)
        .arg("-f")
        .arg(target)
        .output()
        .map_err(|e| failed(e.to_string()))?;

    if !output.status.success() {
        return Err(failed(String::from_utf8_lossy(&output.stderr).trim().to_string()));
    }

    let resolved = String::from_utf8_lossy(&output.stdout).trim_end_matches('\n').to_string();
    if resolved.is_empty() {
        return Err(failed("empty output".to_string()));
    }
    Ok(PathBuf::from(resolved))
}
