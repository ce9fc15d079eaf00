//! Tests for the CLI module.

use super::*;
use crate::config::ProcessRole;
use crate::manager::TaskManager;
use crate::tasks::Task;
use crate::testing::isolated_config;
use clap::Parser;
use std::process::ExitCode;
use tempfile::TempDir;

async fn manager_in(dir: &TempDir) -> TaskManager {
    let manager = TaskManager::spawn(isolated_config(dir.path(), ProcessRole::App)).unwrap();
    manager.ready().await;
    manager
}

fn parse(args: &[&str]) -> Command {
    let mut argv = vec!["todo-sync"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

#[test]
fn test_parse_add_with_options() {
    let command = parse(&["add", "File taxes", "-p", "HIGH", "--due", "2030-04-15", "-c", "Admin"]);
    let Command::Add { title, priority, due, category, subtitle } = command else {
        panic!("expected add");
    };
    assert_eq!(title, "File taxes");
    assert_eq!(priority, Some(Priority::High));
    assert!(due.is_some());
    assert_eq!(category.as_deref(), Some("Admin"));
    assert!(subtitle.is_none());
}

#[test]
fn test_parse_rejects_bad_priority_and_date() {
    assert!(Cli::try_parse_from(["todo-sync", "add", "x", "-p", "urgent"]).is_err());
    assert!(Cli::try_parse_from(["todo-sync", "add", "x", "--due", "tomorrow"]).is_err());
}

#[test]
fn test_parse_global_flags() {
    let cli = Cli::try_parse_from(["todo-sync", "list", "--widget", "--config", "/tmp/c.yaml"]).unwrap();
    assert!(cli.widget);
    assert_eq!(cli.config.unwrap(), std::path::PathBuf::from("/tmp/c.yaml"));
}

#[test]
fn test_parse_update_conflicts() {
    assert!(Cli::try_parse_from(["todo-sync", "update", "abc", "--due", "2030-01-01", "--clear-due"]).is_err());
}

#[test]
fn test_parse_diagnose_expect() {
    let Command::Diagnose { expect, json } = parse(&["diagnose", "--expect", "key-value"]) else {
        panic!("expected diagnose");
    };
    assert_eq!(expect, Some(StorageStrategy::KeyValue));
    assert!(!json);
}

#[test]
fn test_parse_due_rfc3339() {
    let due = parse_due("2030-01-02T03:04:05Z").unwrap();
    assert_eq!(due.to_rfc3339(), "2030-01-02T03:04:05+00:00");
}

#[tokio::test]
async fn test_add_list_toggle_delete() {
    let dir = TempDir::new().unwrap();
    let manager = manager_in(&dir).await;

    let out = execute(&manager, parse(&["add", "Buy milk", "-c", "Home"])).await;
    assert_eq!(out.exit_code, ExitCode::SUCCESS);
    assert!(out.stdout[0].starts_with("Created"));
    let id = manager.fetch_all()[0].id.to_string();

    let out = execute(&manager, parse(&["list"])).await;
    assert_eq!(out.stdout.len(), 1);
    assert!(out.stdout[0].contains("[ ] Buy milk (medium) #Home"));

    let out = execute(&manager, parse(&["toggle", &id[..6]])).await;
    assert!(out.stdout[0].contains("[x] Buy milk"));

    let out = execute(&manager, parse(&["list", "--view", "completed", "--json"])).await;
    let listed: Vec<Task> = serde_json::from_str(&out.stdout[0]).unwrap();
    assert_eq!(listed.len(), 1);

    let out = execute(&manager, parse(&["delete", &id])).await;
    assert!(out.stdout[0].starts_with("Deleted"));
    assert!(manager.is_empty());

    let out = execute(&manager, parse(&["delete", &id])).await;
    assert_eq!(out.exit_code, ExitCode::from(1));
    assert!(out.stderr[0].contains("Task not found"));
}

#[tokio::test]
async fn test_update_and_clear_fields() {
    let dir = TempDir::new().unwrap();
    let manager = manager_in(&dir).await;
    execute(&manager, parse(&["add", "Draft", "--due", "2030-01-01", "-c", "Work"])).await;
    let id = manager.fetch_all()[0].id.to_string();

    let out = execute(&manager, parse(&["update", &id, "-t", "Final", "--clear-due", "--clear-category"])).await;
    assert_eq!(out.exit_code, ExitCode::SUCCESS);
    let task = manager.fetch_all().remove(0);
    assert_eq!(task.title, "Final");
    assert!(task.due_date.is_none());
    assert!(task.category.is_none());

    let out = execute(&manager, parse(&["update", &id])).await;
    assert_eq!(out.exit_code, ExitCode::from(1));
}

#[tokio::test]
async fn test_complete_all_and_stats() {
    let dir = TempDir::new().unwrap();
    let manager = manager_in(&dir).await;
    for title in ["One", "Two", "Three"] {
        execute(&manager, parse(&["add", title])).await;
    }
    execute(&manager, parse(&["add", "Other", "-c", "Later"])).await;

    let out = execute(&manager, parse(&["complete-all", "-c", "later"])).await;
    assert_eq!(out.stdout[0], "Completed 1 task(s)");
    let out = execute(&manager, parse(&["complete-all"])).await;
    assert_eq!(out.stdout[0], "Completed 3 task(s)");

    let out = execute(&manager, parse(&["stats"])).await;
    assert!(out.stdout.contains(&"Completion rate: 100%".to_string()));
    assert!(out.stdout.contains(&"Healthy: yes".to_string()));

    let out = execute(&manager, parse(&["stats", "--json"])).await;
    let json: serde_json::Value = serde_json::from_str(&out.stdout[0]).unwrap();
    assert_eq!(json["total"], 4);
}

#[tokio::test]
async fn test_widget_and_diagnose() {
    let dir = TempDir::new().unwrap();
    let manager = manager_in(&dir).await;
    execute(&manager, parse(&["add", "Shown"])).await;

    let out = execute(&manager, parse(&["widget", "--family", "small"])).await;
    let json: serde_json::Value = serde_json::from_str(&out.stdout[0]).unwrap();
    assert_eq!(json["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(json["can_sync"], true);

    let out = execute(&manager, parse(&["diagnose", "--expect", "shared-container"])).await;
    assert_eq!(out.exit_code, ExitCode::SUCCESS);
    assert!(out.stdout.iter().any(|l| l.contains("shared with widget")));

    let out = execute(&manager, parse(&["diagnose", "--expect", "key-value"])).await;
    assert_eq!(out.exit_code, ExitCode::from(2));
    assert!(out.stderr[0].contains("got shared-container"));
}

#[tokio::test]
async fn test_refresh_picks_up_other_process() {
    let dir = TempDir::new().unwrap();
    let app = manager_in(&dir).await;
    let widget = TaskManager::spawn(isolated_config(dir.path(), ProcessRole::Widget)).unwrap();
    widget.ready().await;

    execute(&app, parse(&["add", "From app"])).await;
    app.flush().await.unwrap();

    let out = execute(&widget, parse(&["refresh"])).await;
    assert_eq!(out.stdout[0], "Reloaded 1 task(s), status synced");
}

#[test]
fn test_format_task_shows_due() {
    let task = crate::tasks::TaskDraft::new("Call mom")
        .unwrap()
        .priority(Priority::High)
        .due(chrono::Utc::now() + chrono::Duration::hours(3) + chrono::Duration::minutes(5))
        .into_task(chrono::Utc::now(), 1);
    let line = run::format_task(&task);
    assert!(line.ends_with("[ ] Call mom (high) due in 3h"));
}
