//! Watch loop: notifications → debouncer → one commit task per settle.

pub mod debounce;
pub mod watcher;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace};

use crate::commit::{BatchOutcome, CommitOrchestrator};
use crate::error::WatchError;
use crate::git::GitExecutor;

pub use debounce::{DebounceState, Debouncer, Settled};
pub use watcher::{ChangeNotification, WatchStream, WatcherCommand, WatcherKind};

/// How commit tasks for successive settles relate to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommitMode {
    /// Every settle starts its commit task immediately, even while an
    /// earlier one is still running.
    #[default]
    Concurrent,
    /// Commit tasks take turns on a shared lock, in settle order.
    Serialized,
}

/// Long-running loop tying the watcher, debouncer, and orchestrator together.
pub struct WatchLoop<E> {
    orchestrator: Arc<CommitOrchestrator<E>>,
    delay: Duration,
    mode: CommitMode,
    commit_on_start: bool,
}

impl<E: GitExecutor + 'static> WatchLoop<E> {
    pub fn new(orchestrator: Arc<CommitOrchestrator<E>>, delay: Duration) -> Self {
        Self {
            orchestrator,
            delay,
            mode: CommitMode::default(),
            commit_on_start: false,
        }
    }

    pub fn mode(mut self, mode: CommitMode) -> Self {
        self.mode = mode;
        self
    }

    /// Commit whatever is pending once before the first notification.
    pub fn commit_on_start(mut self, enabled: bool) -> Self {
        self.commit_on_start = enabled;
        self
    }

    /// Run until `shutdown` resolves (clean exit) or the notification stream
    /// ends (the watcher died).
    ///
    /// In-flight commit tasks are awaited before returning either way.
    pub async fn run<S>(
        self,
        notifications: &mut mpsc::Receiver<ChangeNotification>,
        shutdown: S,
    ) -> Result<(), WatchError>
    where
        S: Future<Output = ()>,
    {
        let (settled_tx, mut settled_rx) = mpsc::unbounded_channel();
        let mut debouncer = Debouncer::new(self.delay, settled_tx);
        let mut tasks = JoinSet::new();
        let gate = match self.mode {
            CommitMode::Serialized => Some(Arc::new(Mutex::new(()))),
            CommitMode::Concurrent => None,
        };

        if self.commit_on_start {
            spawn_commit(&mut tasks, self.orchestrator.clone(), gate.clone());
        }

        tokio::pin!(shutdown);

        let watcher_closed = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Interrupted, shutting down");
                    break false;
                }
                notification = notifications.recv() => match notification {
                    Some(n) => {
                        trace!("Change: {}", n.raw);
                        debouncer.notify().await;
                    }
                    None => break true,
                },
                Some(settled) = settled_rx.recv() => {
                    debug!("Settled after {} notification(s)", settled.notifications);
                    spawn_commit(&mut tasks, self.orchestrator.clone(), gate.clone());
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("Commit task panicked: {}", e);
                    }
                }
            }
        };

        drop(debouncer);
        if !tasks.is_empty() {
            debug!("Waiting for {} in-flight commit(s)", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!("Commit task panicked: {}", e);
            }
        }

        if watcher_closed {
            Err(WatchError::WatcherExited)
        } else {
            Ok(())
        }
    }
}

/// Start one commit task. Failures are logged; the loop keeps watching.
fn spawn_commit<E: GitExecutor + 'static>(
    tasks: &mut JoinSet<()>,
    orchestrator: Arc<CommitOrchestrator<E>>,
    gate: Option<Arc<Mutex<()>>>,
) {
    tasks.spawn(async move {
        let _turn = match gate {
            Some(ref gate) => Some(gate.lock().await),
            None => None,
        };
        match orchestrator.commit_batch().await {
            Ok(BatchOutcome::Committed { pushed, .. }) => {
                debug!("Batch committed (pushed: {})", pushed)
            }
            Ok(outcome) => debug!("Batch finished without commit: {:?}", outcome),
            Err(e) => error!("Auto-commit failed: {}", e),
        }
    });
}
