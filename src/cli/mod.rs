//! Command-line host for todo-sync.
//!
//! The binary plays either process: by default it is the app, and with
//! `--widget` it is the widget extension. Both drive the same
//! [`TaskManager`](crate::manager::TaskManager), so the CLI doubles as a tool
//! for checking what each process sees.

mod run;

#[cfg(test)]
mod tests;

pub use run::{execute, run, CliOutput};

use crate::storage::selector::StorageStrategy;
use crate::tasks::Priority;
use crate::widget::WidgetFamily;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared to-do storage for the app and its widget.
#[derive(Parser, Debug)]
#[command(name = "todo-sync")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Act as the widget process instead of the app.
    #[arg(long, global = true)]
    pub widget: bool,

    /// Read configuration from this file instead of the default location.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Which view `list` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ListView {
    /// Everything, incomplete first.
    #[default]
    All,
    /// Incomplete tasks in widget order.
    Incomplete,
    /// Due today.
    Today,
    /// Past due.
    Overdue,
    /// High and critical, incomplete.
    High,
    /// Recently completed.
    Completed,
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a task.
    Add {
        /// Task title
        title: String,

        /// Priority: low, medium, high, critical
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,

        /// Due date: RFC 3339 timestamp or YYYY-MM-DD (end of that local day)
        #[arg(short, long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,

        /// Secondary line
        #[arg(short, long)]
        subtitle: Option<String>,

        /// Category label
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List tasks.
    List {
        /// Which tasks to show
        #[arg(short, long, value_enum, default_value_t = ListView::All)]
        view: ListView,

        /// Only tasks in this category (case-insensitive)
        #[arg(short, long, conflicts_with = "view")]
        category: Option<String>,

        /// Show at most this many tasks
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Flip a task between done and not done.
    Toggle {
        /// Task id or unique id prefix
        id: String,
    },

    /// Change a task's fields. Only given fields change.
    Update {
        /// Task id or unique id prefix
        id: String,

        /// New title
        #[arg(short, long)]
        title: Option<String>,

        /// New priority
        #[arg(short, long, value_parser = parse_priority)]
        priority: Option<Priority>,

        /// New due date
        #[arg(short, long, value_parser = parse_due, conflicts_with = "clear_due")]
        due: Option<DateTime<Utc>>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// New subtitle
        #[arg(short, long)]
        subtitle: Option<String>,

        /// New category
        #[arg(short, long, conflicts_with = "clear_category")]
        category: Option<String>,

        /// Remove the category
        #[arg(long)]
        clear_category: bool,
    },

    /// Delete a task.
    Delete {
        /// Task id or unique id prefix
        id: String,
    },

    /// Mark every incomplete task as done.
    #[command(name = "complete-all")]
    CompleteAll {
        /// Only tasks in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show statistics.
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the widget snapshot as JSON.
    Widget {
        /// Widget size
        #[arg(short, long, value_enum, default_value_t = WidgetFamily::Medium)]
        family: WidgetFamily,
    },

    /// Show the storage backend and sync status.
    Diagnose {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,

        /// Exit with an error unless this strategy was selected
        #[arg(long, value_parser = parse_strategy)]
        expect: Option<StorageStrategy>,
    },

    /// Reload tasks from storage.
    Refresh,

    /// Wait for the other process to save, then reload.
    Watch {
        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 500)]
        interval_ms: u64,

        /// Stop after this many changes
        #[arg(long, default_value_t = 1)]
        count: usize,
    },
}

impl ValueEnum for WidgetFamily {
    fn value_variants<'a>() -> &'a [Self] {
        &[Self::Small, Self::Medium, Self::Large]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }))
    }
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_str(s).map_err(|e| e.to_string())
}

fn parse_strategy(s: &str) -> Result<StorageStrategy, String> {
    StorageStrategy::from_str(s).map_err(|e| e.to_string())
}

/// Parse an RFC 3339 timestamp, or a date meaning the end of that local day.
fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(at) = DateTime::parse_from_rfc3339(s) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("invalid due date '{s}' (use YYYY-MM-DD or RFC 3339)"))?;
    let end_of_day = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default();
    Local
        .from_local_datetime(&date.and_time(end_of_day))
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("due date '{s}' does not exist in the local time zone"))
}
