//! Integration tests for sidetree-app.

use std::path::Path;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use sidetree_app::{CommandId, Dispatcher, Registry, Staged, State, channel, rows};
use sidetree_core::Settings;
use sidetree_scan::WalkExecutor;

async fn initial(temp: &TempDir, workdir: &Path) -> State {
    let settings = Settings::builder()
        .session_dir(Some(temp.path().join(".sessions")))
        .build()
        .unwrap();
    let executor = WalkExecutor::new(2).unwrap();
    State::initial(settings, workdir.to_path_buf(), executor)
        .await
        .unwrap()
}

async fn settle(staged: &Staged) -> State {
    tokio::time::sleep(Duration::from_millis(200)).await;
    staged.borrow().as_ref().unwrap().state.clone()
}

fn names(state: &State) -> Vec<(usize, String)> {
    rows(state).into_iter().map(|r| (r.depth, r.name)).collect()
}

#[tokio::test]
async fn test_commands_flow_into_rows() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work");
    std::fs::create_dir_all(work.join("src")).unwrap();
    std::fs::write(work.join("src/lib.rs"), "").unwrap();
    std::fs::write(work.join("README"), "").unwrap();
    std::fs::write(work.join(".env"), "").unwrap();

    let state = initial(&temp, &work).await;
    assert_eq!(
        names(&state),
        vec![
            (0, "work".to_string()),
            (1, "src".to_string()),
            (1, "README".to_string()),
        ]
    );

    let (dispatcher, staged) = Dispatcher::new(Registry::builtin(), state);
    let (tx, rx) = channel();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(dispatcher.run(rx, shutdown.clone()));

    tx.sync(CommandId::Open, json!({ "path": work.join("src") }))
        .unwrap();
    tx.sync(CommandId::ToggleHidden, json!(null)).unwrap();
    let state = settle(&staged).await;
    assert_eq!(
        names(&state),
        vec![
            (0, "work".to_string()),
            (1, "src".to_string()),
            (2, "lib.rs".to_string()),
            (1, ".env".to_string()),
            (1, "README".to_string()),
        ]
    );

    tx.sync(
        CommandId::New,
        json!({ "path": work.join("src"), "name": "bin/" }),
    )
    .unwrap();
    let state = settle(&staged).await;
    let bin = rows(&state)
        .into_iter()
        .find(|r| r.path == work.join("src/bin"))
        .unwrap();
    assert!(bin.is_dir);
    assert_eq!(bin.depth, 2);
    assert_eq!(
        staged.borrow().as_ref().unwrap().focus.as_deref(),
        Some(work.join("src/bin").as_path())
    );

    tx.sync(CommandId::Filter, json!({ "pattern": "*.rs" }))
        .unwrap();
    let state = settle(&staged).await;
    assert_eq!(
        names(&state),
        vec![
            (0, "work".to_string()),
            (1, "src".to_string()),
            (2, "lib.rs".to_string()),
        ]
    );

    shutdown.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn test_external_change_seen_by_scheduled_update() {
    let temp = TempDir::new().unwrap();
    let work = temp.path().join("work");
    std::fs::create_dir_all(&work).unwrap();

    let state = initial(&temp, &work).await;
    let (dispatcher, staged) = Dispatcher::new(Registry::builtin(), state);
    let (tx, rx) = channel();
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(dispatcher.run(rx, shutdown.clone()));

    std::fs::write(work.join("late.txt"), "").unwrap();
    tx.transient(CommandId::ScheduledUpdate, json!(null))
        .unwrap();
    let state = settle(&staged).await;
    assert!(state.root.find(&work.join("late.txt")).is_some());

    shutdown.cancel();
    task.await.unwrap();
}
