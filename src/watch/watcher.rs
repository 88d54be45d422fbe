//! External filesystem watcher (`inotifywait` or `fswatch`) as a notification source.
//!
//! The watcher prints one line per raw event. Each line becomes an opaque
//! [`ChangeNotification`]; event types are never interpreted.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::error::WatchError;

/// Events passed to `inotifywait -e` when none are configured.
pub const DEFAULT_INOTIFY_EVENTS: &str = "close_write,move,move_self,delete,create,modify";

/// Always excluded from watching: the repository metadata itself.
pub const GIT_EXCLUDE: &str = r"\.git/|\.git$";

/// Notifications buffered between the reader task and the watch loop.
const NOTIFICATION_BUFFER: usize = 1024;

/// "Something under the watched path changed."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    /// The watcher's output line, kept for trace logging only.
    pub raw: String,
}

/// Which watcher binary dialect to speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherKind {
    Inotify,
    Fswatch,
}

impl WatcherKind {
    /// `fswatch` on macOS, `inotifywait` elsewhere.
    pub fn for_platform() -> Self {
        if cfg!(target_os = "macos") {
            WatcherKind::Fswatch
        } else {
            WatcherKind::Inotify
        }
    }

    pub fn default_bin(&self) -> &'static str {
        match self {
            WatcherKind::Inotify => "inotifywait",
            WatcherKind::Fswatch => "fswatch",
        }
    }
}

/// A fully resolved watcher invocation.
#[derive(Debug, Clone)]
pub struct WatcherCommand {
    pub kind: WatcherKind,
    pub bin: PathBuf,
    /// Absolute path of the watched file or directory.
    pub target: PathBuf,
    pub target_is_dir: bool,
    /// Comma-separated event filter (`-e`).
    pub events: Option<String>,
    /// Extra exclude regex (`-x`), combined with [`GIT_EXCLUDE`].
    pub exclude: Option<String>,
}

impl WatcherCommand {
    /// The path handed to the watcher. Files are watched through their parent
    /// directory so editors that save by rename are still seen.
    fn watched_path(&self) -> &Path {
        if self.target_is_dir {
            &self.target
        } else {
            self.target.parent().unwrap_or(&self.target)
        }
    }

    fn exclude_pattern(&self) -> String {
        match self.exclude.as_deref() {
            Some(extra) if !extra.is_empty() => format!("({}|{})", GIT_EXCLUDE, extra),
            _ => format!("({})", GIT_EXCLUDE),
        }
    }

    /// Watcher arguments; each output line names one changed path.
    pub fn args(&self) -> Vec<String> {
        let mut args = Vec::new();
        match self.kind {
            WatcherKind::Inotify => {
                args.push("-qm".to_string());
                if self.target_is_dir {
                    args.push("-r".to_string());
                }
                args.push("-e".to_string());
                args.push(
                    self.events
                        .clone()
                        .unwrap_or_else(|| DEFAULT_INOTIFY_EVENTS.to_string()),
                );
                args.push("--exclude".to_string());
                args.push(self.exclude_pattern());
                args.push("--format".to_string());
                args.push("%w%f".to_string());
            }
            WatcherKind::Fswatch => {
                if self.target_is_dir {
                    args.push("--recursive".to_string());
                }
                if let Some(ref events) = self.events {
                    for event in events.split(',').map(str::trim).filter(|e| !e.is_empty()) {
                        args.push("--event".to_string());
                        args.push(event.to_string());
                    }
                }
                args.push("-E".to_string());
                args.push("--exclude".to_string());
                args.push(self.exclude_pattern());
            }
        }
        args.push(self.watched_path().display().to_string());
        args
    }

    /// Start the watcher and forward its output lines as notifications.
    ///
    /// For file targets, lines naming other files in the same directory are
    /// dropped.
    pub fn spawn(&self) -> Result<WatchStream, WatchError> {
        let args = self.args();
        debug!("{} {}", self.bin.display(), args.join(" "));

        let mut child = Command::new(&self.bin)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WatchError::SpawnFailed {
                bin: self.bin.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or(WatchError::NoStdout)?;
        let only = (!self.target_is_dir).then(|| self.target.clone());
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if let Some(ref only) = only {
                    if Path::new(line.trim_end()) != only.as_path() {
                        continue;
                    }
                }
                trace!("watcher: {}", line);
                if tx.send(ChangeNotification { raw: line }).await.is_err() {
                    break;
                }
            }
            debug!("Watcher output closed");
        });

        Ok(WatchStream {
            _child: child,
            notifications: rx,
        })
    }
}

/// A running watcher process and its notification channel.
///
/// Dropping the stream kills the process.
pub struct WatchStream {
    /// Held so the process lives as long as the stream.
    _child: Child,
    notifications: mpsc::Receiver<ChangeNotification>,
}

impl WatchStream {
    pub fn notifications(&mut self) -> &mut mpsc::Receiver<ChangeNotification> {
        &mut self.notifications
    }
}
