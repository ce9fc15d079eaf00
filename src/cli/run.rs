//! Command execution for the CLI.
//!
//! [`run`] builds a manager from the command-line flags; [`execute`] does the
//! work against any manager, which keeps it testable.

use crate::cli::{Cli, Command, ListView};
use crate::config::{ProcessRole, SyncConfig};
use crate::error::{Error, Result};
use crate::manager::{SyncStatus, TaskManager};
use crate::notify::RefreshWatcher;
use crate::storage::selector::StorageStrategy;
use crate::tasks::{Task, TaskDraft, TaskUpdate};
use crate::widget::WidgetSnapshot;
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

impl CliOutput {
    fn ok(stdout: Vec<String>) -> Self {
        Self { exit_code: ExitCode::SUCCESS, stdout, stderr: vec![] }
    }

    fn error(message: impl Into<String>) -> Self {
        Self { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message.into()] }
    }

    fn json(value: &impl Serialize) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(json) => Self::ok(vec![json]),
            Err(e) => Self::error(format!("Error encoding output: {e}")),
        }
    }
}

/// Default number of tasks shown by `list --view completed`.
const DEFAULT_COMPLETED_LIMIT: usize = 10;

/// Run a parsed command line to completion.
///
/// Pending saves are flushed before returning. A failed sync turns an
/// otherwise successful command into exit code 1.
pub async fn run(cli: Cli) -> CliOutput {
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => return CliOutput::error(format!("Error loading config: {e}")),
    };
    let manager = match TaskManager::spawn(config) {
        Ok(manager) => manager,
        Err(e) => return CliOutput::error(format!("Error starting task manager: {e}")),
    };
    manager.ready().await;

    let mut output = execute(&manager, cli.command).await;
    if let Err(e) = manager.flush().await {
        output.stderr.push(format!("Error saving tasks: {e}"));
        output.exit_code = ExitCode::from(1);
    }
    if manager.status() == SyncStatus::Failed {
        let reason = manager.last_error().unwrap_or_else(|| "unknown error".to_string());
        output.stderr.push(format!("Warning: storage is out of sync: {reason}"));
        output.exit_code = ExitCode::from(1);
    }
    output
}

fn load_config(cli: &Cli) -> Result<SyncConfig> {
    let loaded = match &cli.config {
        Some(path) => Some(
            SyncConfig::load_from(path)?
                .ok_or_else(|| Error::Config(format!("config file not found: {}", path.display())))?,
        ),
        None => SyncConfig::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read default config, using defaults");
            None
        }),
    };
    let mut config = loaded.unwrap_or_default();
    if cli.widget {
        config.process = ProcessRole::Widget;
    }
    Ok(config)
}

/// Execute one command against a ready manager.
pub async fn execute(manager: &TaskManager, command: Command) -> CliOutput {
    match command {
        Command::Add { title, priority, due, subtitle, category } => {
            let mut draft = match TaskDraft::new(title) {
                Ok(draft) => draft,
                Err(e) => return CliOutput::error(format!("Error: {e}")),
            };
            if let Some(priority) = priority {
                draft = draft.priority(priority);
            }
            if let Some(due) = due {
                draft = draft.due(due);
            }
            if let Some(subtitle) = subtitle {
                draft = draft.subtitle(subtitle);
            }
            if let Some(category) = category {
                draft = draft.category(category);
            }
            let task = manager.create(draft);
            CliOutput::ok(vec![format!("Created {}", format_task(&task))])
        }
        Command::List { view, category, limit, json } => {
            let tasks = match category {
                Some(name) => truncated(manager.fetch_by_category(&name), limit),
                None => list_view(manager, view, limit),
            };
            if json {
                CliOutput::json(&tasks)
            } else if tasks.is_empty() {
                CliOutput::ok(vec!["No tasks".to_string()])
            } else {
                CliOutput::ok(tasks.iter().map(format_task).collect())
            }
        }
        Command::Toggle { id } => with_task(manager, &id, |task| {
            manager.toggle_complete(task.id).map(|t| format!("Toggled {}", format_task(&t)))
        }),
        Command::Update { id, title, priority, due, clear_due, subtitle, category, clear_category } => {
            let update = TaskUpdate {
                title,
                subtitle: subtitle.map(Some),
                is_completed: None,
                priority,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                category: if clear_category { Some(None) } else { category.map(Some) },
            };
            if update.is_empty() {
                return CliOutput::error("Nothing to update");
            }
            with_task(manager, &id, |task| {
                manager.update(task.id, &update).map(|t| format!("Updated {}", format_task(&t)))
            })
        }
        Command::Delete { id } => with_task(manager, &id, |task| {
            manager.delete(task.id).then(|| format!("Deleted {}", format_task(task)))
        }),
        Command::CompleteAll { category } => {
            let pending = match category {
                Some(name) => manager.fetch_by_category(&name),
                None => manager.fetch_all(),
            };
            let changes = pending
                .into_iter()
                .filter(|t| !t.is_completed)
                .map(|t| (t.id, TaskUpdate::completed(true)));
            let done = manager.bulk_update(changes);
            CliOutput::ok(vec![format!("Completed {} task(s)", done.len())])
        }
        Command::Stats { json } => {
            let stats = manager.statistics();
            if json {
                return CliOutput::json(&stats);
            }
            CliOutput::ok(vec![
                format!("Total: {}", stats.total),
                format!("Completed: {}", stats.completed),
                format!("Pending: {}", stats.pending),
                format!("Overdue: {}", stats.overdue),
                format!("Due today: {}", stats.due_today),
                format!("Completion rate: {:.0}%", stats.completion_rate * 100.0),
                format!("Healthy: {}", if stats.is_healthy() { "yes" } else { "no" }),
            ])
        }
        Command::Widget { family } => CliOutput::json(&WidgetSnapshot::capture_for(manager, family).await),
        Command::Diagnose { json, expect } => diagnose(manager, json, expect),
        Command::Refresh => match manager.refresh().await {
            Ok(()) => CliOutput::ok(vec![format!(
                "Reloaded {} task(s), status {}",
                manager.len(),
                manager.status()
            )]),
            Err(e) => CliOutput::error(format!("Error refreshing: {e}")),
        },
        Command::Watch { interval_ms, count } => watch(manager, Duration::from_millis(interval_ms), count).await,
    }
}

fn list_view(manager: &TaskManager, view: ListView, limit: Option<usize>) -> Vec<Task> {
    match view {
        ListView::All => truncated(manager.fetch_all(), limit),
        ListView::Incomplete => manager.fetch_incomplete(limit),
        ListView::Today => truncated(manager.fetch_due_today(), limit),
        ListView::Overdue => truncated(manager.fetch_overdue(), limit),
        ListView::High => manager.fetch_high_priority(limit.unwrap_or(usize::MAX)),
        ListView::Completed => manager.fetch_recently_completed(limit.unwrap_or(DEFAULT_COMPLETED_LIMIT)),
    }
}

fn truncated(mut tasks: Vec<Task>, limit: Option<usize>) -> Vec<Task> {
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }
    tasks
}

/// Resolve `id` to a task and run `f` on it.
fn with_task(manager: &TaskManager, id: &str, f: impl FnOnce(&Task) -> Option<String>) -> CliOutput {
    let found = uuid::Uuid::parse_str(id).ok().and_then(|uuid| manager.get(uuid));
    let Some(task) = found.or_else(|| manager.find_by_prefix(id)) else {
        return CliOutput::error(format!("Error: {}", Error::TaskNotFound(id.to_string())));
    };
    match f(&task) {
        Some(message) => CliOutput::ok(vec![message]),
        None => CliOutput::error(format!("Error: {}", Error::TaskNotFound(id.to_string()))),
    }
}

fn diagnose(manager: &TaskManager, json: bool, expect: Option<StorageStrategy>) -> CliOutput {
    let diagnostics = manager.diagnostics();
    let mut output = if json {
        CliOutput::json(&diagnostics)
    } else {
        CliOutput::ok(diagnostics.to_string().lines().map(str::to_string).collect())
    };
    if let Some(expected) = expect {
        if diagnostics.strategy != Some(expected) {
            let actual = diagnostics.strategy.map_or("none", |s| s.as_str());
            output.stderr.push(format!("Expected storage {expected}, got {actual}"));
            output.exit_code = ExitCode::from(2);
        }
    }
    output
}

async fn watch(manager: &TaskManager, interval: Duration, count: usize) -> CliOutput {
    let diagnostics = manager.diagnostics();
    let (Some(StorageStrategy::SharedContainer), Some(root)) = (diagnostics.strategy, diagnostics.location) else {
        return CliOutput::error("Error: watching needs the shared container; see `todo-sync diagnose`");
    };

    let mut watcher = RefreshWatcher::in_root(std::path::Path::new(&root));
    let mut lines = Vec::new();
    for _ in 0..count {
        watcher.changed(interval).await;
        if let Err(e) = manager.refresh().await {
            return CliOutput::error(format!("Error refreshing: {e}"));
        }
        let incomplete = manager.fetch_incomplete(None).len();
        lines.push(format!("Changed: {} task(s), {incomplete} incomplete", manager.len()));
    }
    CliOutput::ok(lines)
}

/// One-line rendering: short id, checkbox, title, priority, due.
pub(crate) fn format_task(task: &Task) -> String {
    let id = task.id.to_string();
    let mut line = format!(
        "{} [{}] {} ({})",
        &id[..8],
        if task.is_completed { "x" } else { " " },
        task.title,
        task.priority
    );
    if let Some(category) = &task.category {
        line.push_str(&format!(" #{category}"));
    }
    if let Some(due) = task.time_until_due() {
        line.push_str(&format!(" due {due}"));
    }
    line
}
