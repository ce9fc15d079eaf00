//! Integration tests for `todo_sync`.

use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use todo_sync::testing::{isolated_config, ScriptedProbe};
use todo_sync::{
    Priority, ProcessRole, RefreshWatcher, StorageStrategy, SyncStatus, TaskDraft, TaskManager, VERSION,
};

async fn ready(manager: TaskManager) -> TaskManager {
    manager.ready().await;
    manager
}

#[test]
fn test_version_exists() {
    assert!(!VERSION.is_empty());
}

#[tokio::test]
async fn test_app_and_widget_share_tasks() {
    let dir = TempDir::new().unwrap();
    let app = ready(TaskManager::spawn(isolated_config(dir.path(), ProcessRole::App)).unwrap()).await;
    let widget = ready(TaskManager::spawn(isolated_config(dir.path(), ProcessRole::Widget)).unwrap()).await;
    assert_eq!(app.strategy(), Some(StorageStrategy::SharedContainer));
    assert_eq!(widget.strategy(), Some(StorageStrategy::SharedContainer));

    let task = app.create(TaskDraft::new("Pay rent").unwrap().priority(Priority::High));
    app.flush().await.unwrap();
    widget.refresh().await.unwrap();
    assert_eq!(widget.fetch_incomplete(None), vec![task.clone()]);

    widget.toggle_complete(task.id).unwrap();
    widget.flush().await.unwrap();
    app.refresh().await.unwrap();
    assert!(app.get(task.id).unwrap().is_completed);
    assert_eq!(app.status(), SyncStatus::Synced);
}

#[tokio::test]
async fn test_tasks_survive_restart() {
    let dir = TempDir::new().unwrap();
    let config = isolated_config(dir.path(), ProcessRole::App);

    let first = ready(TaskManager::spawn(config.clone()).unwrap()).await;
    let kept = first.create(TaskDraft::new("Keep me").unwrap().category("Home"));
    first.create(TaskDraft::new("Second").unwrap());
    first.flush().await.unwrap();
    drop(first);

    let second = ready(TaskManager::spawn(config).unwrap()).await;
    assert_eq!(second.len(), 2);
    let loaded = second.get(kept.id).unwrap();
    assert_eq!(loaded.title, "Keep me");
    assert_eq!(loaded.category.as_deref(), Some("Home"));
    assert_eq!(loaded.sort_order, kept.sort_order);
}

#[tokio::test]
async fn test_watcher_sees_app_save() {
    let dir = TempDir::new().unwrap();
    let app = ready(TaskManager::spawn(isolated_config(dir.path(), ProcessRole::App)).unwrap()).await;
    app.flush().await.unwrap();
    let mut watcher = RefreshWatcher::in_root(&dir.path().join("shared"));
    assert!(!watcher.poll());

    app.create(TaskDraft::new("Ping").unwrap());
    app.flush().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), watcher.changed(Duration::from_millis(10)))
        .await
        .unwrap();
    assert!(watcher.last_seen().is_some());
}

#[tokio::test]
async fn test_falls_back_to_key_value_when_probes_fail() {
    let dir = TempDir::new().unwrap();
    let manager = TaskManager::builder(isolated_config(dir.path(), ProcessRole::App))
        .probe(Arc::new(ScriptedProbe::always_failing()))
        .spawn()
        .unwrap();
    let manager = ready(manager).await;

    assert_eq!(manager.strategy(), Some(StorageStrategy::KeyValue));
    assert!(!manager.can_sync_with_widget());
    manager.create(TaskDraft::new("Local only").unwrap());
    manager.flush().await.unwrap();
    assert_eq!(manager.status(), SyncStatus::Synced);
    assert!(dir.path().join("kv").join("app.sqlite3").exists());
}
