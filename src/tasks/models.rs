//! Task model types shared by the app and the widget.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use uuid::Uuid;

/// Task priority levels, ordered from least to most urgent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority (default).
    #[default]
    Medium,
    /// High priority.
    High,
    /// Critical priority.
    Critical,
}

impl Priority {
    /// All priorities, least urgent first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Parse a priority from a string (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid priority.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self, InvalidPriority> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(InvalidPriority(s.to_string())),
        }
    }

    /// Get the string representation of the priority.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error when an invalid priority string is provided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPriority(pub String);

impl std::fmt::Display for InvalidPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid priority: '{}' (must be one of: low, medium, high, critical)",
            self.0
        )
    }
}

impl std::error::Error for InvalidPriority {}

/// Error when a task is given a blank title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyTitle;

impl std::fmt::Display for EmptyTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task title must not be empty")
    }
}

impl std::error::Error for EmptyTitle {}

/// A to-do item.
///
/// Two tasks are equal when their ids are equal, whatever their content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Stable identifier, never changed after creation.
    pub id: Uuid,
    /// Short title, never empty.
    pub title: String,
    /// Optional secondary line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    /// Whether the task has been completed.
    #[serde(default)]
    pub is_completed: bool,
    /// Priority level.
    #[serde(default)]
    pub priority: Priority,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last changed.
    pub updated_at: DateTime<Utc>,
    /// Optional due date and time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    /// Optional category label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Position assigned by the collection at creation; unique and never reused.
    #[serde(default)]
    pub sort_order: i64,
}

impl Task {
    /// Create a task with default fields.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyTitle`] if the title is blank.
    pub fn new(title: impl Into<String>) -> Result<Self, EmptyTitle> {
        TaskDraft::new(title).map(|draft| draft.into_task(Utc::now(), 0))
    }

    /// Whether the task is past due at `now`.
    #[must_use]
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_completed && self.due_date.is_some_and(|due| due < now)
    }

    /// Whether the task is past due right now.
    #[must_use]
    pub fn is_overdue(&self) -> bool {
        self.is_overdue_at(Utc::now())
    }

    /// Whether the due date falls on the same calendar day as `now`, in `now`'s time zone.
    #[must_use]
    pub fn is_due_today_at<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        self.due_date
            .is_some_and(|due| due.with_timezone(&now.timezone()).date_naive() == now.date_naive())
    }

    /// Whether the task is due during the local calendar day.
    #[must_use]
    pub fn is_due_today(&self) -> bool {
        self.is_due_today_at(&chrono::Local::now())
    }

    /// Signed, human-readable distance to the due date (`"in 3h"`, `"2d ago"`, `"now"`).
    #[must_use]
    pub fn time_until_due_at(&self, now: DateTime<Utc>) -> Option<String> {
        self.due_date.map(|due| format_delta(due - now))
    }

    /// Human-readable distance to the due date from now.
    #[must_use]
    pub fn time_until_due(&self) -> Option<String> {
        self.time_until_due_at(Utc::now())
    }

    /// Apply a partial update. Returns true if any field changed.
    ///
    /// A blank title in the update is ignored. `updated_at` is set to `now`
    /// whenever the update is applied.
    pub fn apply(&mut self, update: &TaskUpdate, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        if let Some(title) = &update.title {
            let title = title.trim();
            if title.is_empty() {
                tracing::warn!(task = %self.id, "ignoring blank title in update");
            } else if title != self.title {
                self.title = title.to_string();
                changed = true;
            }
        }
        if let Some(subtitle) = &update.subtitle {
            changed |= replace(&mut self.subtitle, subtitle.clone());
        }
        if let Some(done) = update.is_completed {
            changed |= replace(&mut self.is_completed, done);
        }
        if let Some(priority) = update.priority {
            changed |= replace(&mut self.priority, priority);
        }
        if let Some(due) = update.due_date {
            changed |= replace(&mut self.due_date, due);
        }
        if let Some(category) = &update.category {
            changed |= replace(&mut self.category, category.clone());
        }
        self.updated_at = now;
        changed
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn format_delta(delta: Duration) -> String {
    let future = delta >= Duration::zero();
    let abs = if future { delta } else { -delta };
    let amount = if abs.num_days() >= 1 {
        format!("{}d", abs.num_days())
    } else if abs.num_hours() >= 1 {
        format!("{}h", abs.num_hours())
    } else if abs.num_minutes() >= 1 {
        format!("{}m", abs.num_minutes())
    } else {
        return "now".to_string();
    };
    if future {
        format!("in {amount}")
    } else {
        format!("{amount} ago")
    }
}

impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Task {}

impl Hash for Task {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    /// Optional secondary line.
    pub subtitle: Option<String>,
    /// Priority level.
    pub priority: Priority,
    /// Optional due date.
    pub due_date: Option<DateTime<Utc>>,
    /// Optional category label.
    pub category: Option<String>,
}

impl TaskDraft {
    /// Start a draft with the given title.
    ///
    /// # Errors
    ///
    /// Returns [`EmptyTitle`] if the title is blank.
    pub fn new(title: impl Into<String>) -> Result<Self, EmptyTitle> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(EmptyTitle);
        }
        Ok(Self { title, subtitle: None, priority: Priority::default(), due_date: None, category: None })
    }

    /// The draft's title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Set the priority.
    #[must_use]
    pub const fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the due date.
    #[must_use]
    pub const fn due(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Set the subtitle.
    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    /// Set the category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Build a task stamped at `now` with the given sort order.
    #[must_use]
    pub fn into_task(self, now: DateTime<Utc>, sort_order: i64) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: self.title,
            subtitle: self.subtitle,
            is_completed: false,
            priority: self.priority,
            created_at: now,
            updated_at: now,
            due_date: self.due_date,
            category: self.category,
            sort_order,
        }
    }
}

/// Fields that can be updated on a task.
///
/// Outer `None` leaves a field alone; `Some(None)` clears an optional field.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    /// New title (if Some).
    pub title: Option<String>,
    /// New subtitle (if Some).
    pub subtitle: Option<Option<String>>,
    /// New completion flag (if Some).
    pub is_completed: Option<bool>,
    /// New priority (if Some).
    pub priority: Option<Priority>,
    /// New due date (if Some).
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// New category (if Some).
    pub category: Option<Option<String>>,
}

impl TaskUpdate {
    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.subtitle.is_none()
            && self.is_completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.category.is_none()
    }

    /// An update that only sets the completion flag.
    #[must_use]
    pub fn completed(done: bool) -> Self {
        Self { is_completed: Some(done), ..Self::default() }
    }
}

impl From<&Task> for TaskUpdate {
    fn from(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            subtitle: Some(task.subtitle.clone()),
            is_completed: Some(task.is_completed),
            priority: Some(task.priority),
            due_date: Some(task.due_date),
            category: Some(task.category.clone()),
        }
    }
}
