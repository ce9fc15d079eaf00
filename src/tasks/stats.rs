//! Summary counts derived from a task collection.

use crate::tasks::models::Task;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion rate above which a collection with nothing overdue counts as healthy.
const HEALTHY_COMPLETION_RATE: f64 = 0.7;

/// A point-in-time snapshot of the collection's counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of tasks.
    pub total: usize,
    /// Number of completed tasks.
    pub completed: usize,
    /// `total - completed`.
    pub pending: usize,
    /// Incomplete tasks past their due date.
    pub overdue: usize,
    /// Tasks due during the current local day.
    pub due_today: usize,
    /// `completed / total`, or 0 for an empty collection.
    pub completion_rate: f64,
    /// When the snapshot was taken.
    pub generated_at: DateTime<Utc>,
}

impl Statistics {
    /// Compute statistics for `tasks` as seen at `now`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(tasks: &[Task], now: DateTime<Utc>) -> Self {
        let local_now = now.with_timezone(&chrono::Local);
        let total = tasks.len();
        let completed = tasks.iter().filter(|t| t.is_completed).count();
        let overdue = tasks.iter().filter(|t| t.is_overdue_at(now)).count();
        let due_today = tasks.iter().filter(|t| t.is_due_today_at(&local_now)).count();
        let completion_rate = if total == 0 { 0.0 } else { completed as f64 / total as f64 };

        Self {
            total,
            completed,
            pending: total - completed,
            overdue,
            due_today,
            completion_rate,
            generated_at: now,
        }
    }

    /// Nothing overdue and more than 70% done.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.overdue == 0 && self.completion_rate > HEALTHY_COMPLETION_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::models::{Priority, TaskDraft};
    use chrono::Duration;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_empty_collection() {
        let stats = Statistics::compute(&[], now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.pending, 0);
        assert!(stats.completion_rate.abs() < f64::EPSILON);
        assert!(!stats.is_healthy());
    }

    #[test]
    fn test_counts() {
        let mut done = TaskDraft::new("done").unwrap().into_task(now(), 1);
        done.is_completed = true;
        let late = TaskDraft::new("late").unwrap().due(now() - Duration::hours(2)).into_task(now(), 2);
        let plain = TaskDraft::new("plain").unwrap().into_task(now(), 3);

        let stats = Statistics::compute(&[done, late, plain], now());
        assert_eq!(stats.total, 3);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 2);
        assert_eq!(stats.overdue, 1);
        assert!((stats.completion_rate - 1.0 / 3.0).abs() < 1e-9);
        assert!(!stats.is_healthy());
    }

    #[test]
    fn test_healthy_requires_no_overdue_and_high_rate() {
        let mut tasks: Vec<Task> = (0..10)
            .map(|i| TaskDraft::new(format!("t{i}")).unwrap().into_task(now(), i))
            .collect();
        for task in tasks.iter_mut().take(8) {
            task.is_completed = true;
        }
        assert!(Statistics::compute(&tasks, now()).is_healthy());

        tasks[9].due_date = Some(now() - Duration::minutes(1));
        assert!(!Statistics::compute(&tasks, now()).is_healthy());
    }

    #[test]
    fn test_exactly_seventy_percent_is_not_healthy() {
        let mut tasks: Vec<Task> = (0..10)
            .map(|i| TaskDraft::new(format!("t{i}")).unwrap().into_task(now(), i))
            .collect();
        for task in tasks.iter_mut().take(7) {
            task.is_completed = true;
        }
        assert!(!Statistics::compute(&tasks, now()).is_healthy());
    }

    fn arb_task() -> impl Strategy<Value = Task> {
        (any::<bool>(), 0usize..4, proptest::option::of(-72i64..72)).prop_map(
            |(done, priority, due_hours)| {
                let mut draft = TaskDraft::new("generated").unwrap().priority(Priority::ALL[priority]);
                if let Some(hours) = due_hours {
                    draft = draft.due(now() + Duration::hours(hours));
                }
                let mut task = draft.into_task(now(), 0);
                task.is_completed = done;
                task
            },
        )
    }

    proptest! {
        #[test]
        fn prop_pending_is_total_minus_completed(tasks in proptest::collection::vec(arb_task(), 0..40)) {
            let stats = Statistics::compute(&tasks, now());
            prop_assert_eq!(stats.pending, stats.total - stats.completed);
            prop_assert!(stats.overdue <= stats.pending);
            if stats.total == 0 {
                prop_assert!(stats.completion_rate.abs() < f64::EPSILON);
            } else {
                prop_assert!((0.0..=1.0).contains(&stats.completion_rate));
            }
        }
    }
}
