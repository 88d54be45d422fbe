//! gitwatch - CLI entry point.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use gitwatch::commit::message::{DEFAULT_DATE_FORMAT, DEFAULT_TEMPLATE};
use gitwatch::commit::{CommitOrchestrator, ListChanges};
use gitwatch::config::{Binaries, DEFAULT_SLEEP_SECS, Settings, WatchConfig};
use gitwatch::error::{ConfigError, EXIT_RUNTIME, EXIT_USAGE};
use gitwatch::git::capture_head_state;
use gitwatch::watch::{WatchLoop, WatcherKind};

/// Watch a file or directory and commit every change to git.
#[derive(Parser, Debug)]
#[command(name = "gitwatch")]
#[command(about = "Watch a file or directory and commit every change to git")]
#[command(version)]
struct Cli {
    /// Seconds to wait after the last change before committing
    #[arg(short = 's', env = "GW_SLEEP_TIME", value_name = "SECS", default_value_t = DEFAULT_SLEEP_SECS)]
    sleep_time: f64,

    /// Timestamp format for the commit message (see `man date`); empty disables it
    #[arg(short = 'd', env = "GW_DATE_FMT", value_name = "FMT", default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// Remote to push to after each commit
    #[arg(short = 'r', env = "GW_REMOTE", value_name = "REMOTE")]
    remote: Option<String>,

    /// Remote branch to push to (requires -r)
    #[arg(short = 'b', env = "GW_BRANCH", value_name = "BRANCH")]
    branch: Option<String>,

    /// Alternate location of the git metadata directory
    #[arg(short = 'g', env = "GW_GIT_DIR", value_name = "PATH")]
    git_dir: Option<PathBuf>,

    /// Use a colored diff summary as the message when it has at most LINES lines
    #[arg(short = 'l', env = "GW_LIST_CHANGES", value_name = "LINES", overrides_with = "list_changes_plain")]
    list_changes: Option<usize>,

    /// Same as -l, without colors
    #[arg(short = 'L', env = "GW_LIST_CHANGES_PLAIN", value_name = "LINES", overrides_with = "list_changes")]
    list_changes_plain: Option<usize>,

    /// Commit message template; %d is replaced by the timestamp
    #[arg(short = 'm', env = "GW_COMMIT_MSG", value_name = "MSG", default_value = DEFAULT_TEMPLATE)]
    message: String,

    /// Events passed to the watcher (comma separated)
    #[arg(short = 'e', env = "GW_EVENTS", value_name = "EVENTS")]
    events: Option<String>,

    /// Extra regex of paths the watcher ignores (.git is always ignored)
    #[arg(short = 'x', env = "GW_EXCLUDE", value_name = "PATTERN")]
    exclude: Option<String>,

    /// Pull with rebase before every push
    #[arg(short = 'R', env = "GW_PULL_REBASE")]
    pull_rebase: bool,

    /// Skip commits while a merge is in progress
    #[arg(short = 'M', env = "GW_SKIP_IF_MERGING")]
    skip_if_merging: bool,

    /// Commit pending changes once at startup
    #[arg(short = 'f', env = "GW_COMMIT_ON_START")]
    commit_on_start: bool,

    /// Verbose logging
    #[arg(short = 'v', env = "GW_VERBOSE")]
    verbose: bool,

    /// Run commits one at a time instead of concurrently
    #[arg(long, env = "GW_SERIALIZE")]
    serialize: bool,

    /// File or directory to watch
    #[arg(env = "GW_TARGET")]
    target: Option<PathBuf>,
}

impl Cli {
    fn into_settings(self) -> Settings {
        // `overrides_with` leaves only the last of -l/-L on the command line.
        let list_changes = match (self.list_changes, self.list_changes_plain) {
            (Some(threshold), _) => Some(ListChanges { threshold, color: true }),
            (None, Some(threshold)) => Some(ListChanges { threshold, color: false }),
            (None, None) => None,
        };

        Settings {
            target: self.target,
            sleep_secs: self.sleep_time,
            date_format: self.date_format,
            remote: self.remote.unwrap_or_default(),
            branch: self.branch.unwrap_or_default(),
            git_dir: self.git_dir,
            list_changes,
            message: self.message,
            events: self.events,
            exclude: self.exclude,
            pull_rebase: self.pull_rebase,
            skip_if_merging: self.skip_if_merging,
            commit_on_start: self.commit_on_start,
            serialize: self.serialize,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    init_tracing(cli.verbose);

    let kind = WatcherKind::for_platform();
    let binaries = Binaries::from_env(kind);

    let config = match WatchConfig::resolve(cli.into_settings(), &binaries, kind)
        .and_then(|config| config.enter_target_dir().map(|()| config))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            if matches!(e, ConfigError::MissingTarget) {
                eprintln!();
                let _ = Cli::command().print_help();
            }
            return ExitCode::from(e.exit_code());
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(EXIT_RUNTIME)
        }
    }
}

/// Capture HEAD, start the watcher, and watch until interrupted.
async fn run(config: WatchConfig) -> Result<()> {
    let git = config.git();

    // HEAD is read once; branch switches while running do not change pushes.
    let head = capture_head_state(&git)
        .await
        .context("Failed to read HEAD of the repository")?;
    let remote = config.remote_sync(&head);

    info!("Watching {} on {}", config.target.display(), head);
    if let Some(ref remote) = remote {
        info!("Pushing with: git {}", remote.push.join(" "));
    }

    let orchestrator = CommitOrchestrator::new(
        git,
        config.add_target.clone(),
        config.message.clone(),
        remote,
    )
    .skip_if_merging(config.skip_if_merging);

    let mut stream = config
        .watcher
        .spawn()
        .context("Failed to start the filesystem watcher")?;

    WatchLoop::new(Arc::new(orchestrator), config.delay)
        .mode(config.mode)
        .commit_on_start(config.commit_on_start)
        .run(stream.notifications(), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Stopped watching")?;

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_last_list_changes_flag_wins() {
        let cli = Cli::try_parse_from(["gitwatch", "-l", "3", "-L", "7", "."]).unwrap();
        let settings = cli.into_settings();
        assert_eq!(
            settings.list_changes,
            Some(ListChanges { threshold: 7, color: false })
        );

        let cli = Cli::try_parse_from(["gitwatch", "-L", "7", "-l", "3", "."]).unwrap();
        let settings = cli.into_settings();
        assert_eq!(
            settings.list_changes,
            Some(ListChanges { threshold: 3, color: true })
        );
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["gitwatch", "/tmp/notes"]).unwrap();
        let settings = cli.into_settings();
        assert_eq!(settings.sleep_secs, DEFAULT_SLEEP_SECS);
        assert_eq!(settings.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(settings.message, DEFAULT_TEMPLATE);
        assert_eq!(settings.remote, "");
        assert!(settings.list_changes.is_none());
        assert_eq!(settings.target, Some(PathBuf::from("/tmp/notes")));
    }

    #[test]
    fn test_missing_target_parses() {
        let cli = Cli::try_parse_from(["gitwatch"]).unwrap();
        assert!(cli.target.is_none());
    }
}
