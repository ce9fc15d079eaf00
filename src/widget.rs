//! What the widget host asks for on each timeline refresh.

use crate::config::WidgetConfig;
use crate::manager::{SyncStatus, TaskManager};
use crate::tasks::{Statistics, Task};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Widget sizes offered by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetFamily {
    /// Small: a couple of tasks.
    Small,
    /// Medium: the configured limit.
    #[default]
    Medium,
    /// Large: twice the configured limit.
    Large,
}

impl WidgetFamily {
    /// How many tasks to show for this family.
    #[must_use]
    pub fn task_limit(self, config: &WidgetConfig) -> usize {
        match self {
            Self::Small => config.task_limit.min(2),
            Self::Medium => config.task_limit,
            Self::Large => config.task_limit.saturating_mul(2),
        }
    }
}

/// Everything a widget timeline entry needs.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSnapshot {
    /// When the snapshot was taken.
    pub captured_at: DateTime<Utc>,
    /// Incomplete tasks in display order.
    pub tasks: Vec<Task>,
    /// Statistics over the whole collection.
    pub statistics: Statistics,
    /// Whether the widget sees the app's data.
    pub can_sync: bool,
    /// Manager status at capture time.
    pub status: SyncStatus,
    /// When the host should ask again.
    #[serde(with = "duration_secs")]
    pub next_refresh: Duration,
}

impl WidgetSnapshot {
    /// Capture a snapshot for the medium family once the manager is ready.
    pub async fn capture(manager: &TaskManager) -> Self {
        Self::capture_for(manager, WidgetFamily::default()).await
    }

    /// Capture a snapshot sized for `family`.
    pub async fn capture_for(manager: &TaskManager, family: WidgetFamily) -> Self {
        manager.ready().await;
        let config = &manager.config().widget;
        let tasks = manager.fetch_incomplete(Some(family.task_limit(config)));
        let next_refresh = suggested_refresh(&tasks, config, Local::now());
        Self {
            captured_at: Utc::now(),
            statistics: manager.statistics(),
            can_sync: manager.can_sync_with_widget(),
            status: manager.status(),
            next_refresh,
            tasks,
        }
    }
}

/// The urgent interval if any task is overdue or due today, else the default.
#[must_use]
pub fn suggested_refresh(tasks: &[Task], config: &WidgetConfig, now: DateTime<Local>) -> Duration {
    let now_utc = now.with_timezone(&Utc);
    let urgent = tasks.iter().any(|t| t.is_overdue_at(now_utc) || t.is_due_today_at(&now));
    if urgent {
        config.urgent_refresh()
    } else {
        config.default_refresh()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }
}
