//! Full pipeline with a real `inotifywait` process.
//!
//! Run with `cargo test --features watcher-tests` on a machine with
//! inotify-tools installed.

mod common;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::{TestRepo, wait_for};

use gitwatch::watch::{WatcherCommand, WatcherKind};
use gitwatch::{AddTarget, CommitMessageBuilder, CommitOrchestrator, WatchLoop};

fn inotify(target: PathBuf, target_is_dir: bool) -> WatcherCommand {
    WatcherCommand {
        kind: WatcherKind::Inotify,
        bin: PathBuf::from("inotifywait"),
        target,
        target_is_dir,
        events: None,
        exclude: None,
    }
}

#[tokio::test]
#[cfg_attr(not(feature = "watcher-tests"), ignore = "requires inotifywait")]
async fn test_written_file_is_committed() {
    let repo = TestRepo::new();
    repo.write("README.md", "# notes\n");
    repo.commit_all("initial");

    let mut stream = inotify(repo.path(), true).spawn().unwrap();
    let orch = CommitOrchestrator::new(
        repo.git(),
        AddTarget::Tree,
        CommitMessageBuilder::new("watched", None, None),
        None,
    );
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        WatchLoop::new(Arc::new(orch), Duration::from_millis(200))
            .run(stream.notifications(), async {
                let _ = stop_rx.await;
            })
            .await
    });

    // inotifywait needs a moment to install its watches.
    tokio::time::sleep(Duration::from_millis(500)).await;
    repo.write("todo.md", "- buy milk\n");

    assert!(wait_for(Duration::from_secs(10), || repo.commit_count() == 2).await);
    assert_eq!(repo.head_message(), "watched");

    stop_tx.send(()).unwrap();
    assert!(handle.await.unwrap().is_ok());
}

#[tokio::test]
#[cfg_attr(not(feature = "watcher-tests"), ignore = "requires inotifywait")]
async fn test_file_target_ignores_siblings() {
    let repo = TestRepo::new();
    let watched = repo.write("watched.md", "v1\n");
    repo.commit_all("initial");

    let mut stream = inotify(watched.clone(), false).spawn().unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    repo.write("sibling.md", "noise\n");
    repo.write("watched.md", "v2\n");

    let notification = tokio::time::timeout(Duration::from_secs(5), stream.notifications().recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(PathBuf::from(notification.raw.trim_end()), watched);
}
