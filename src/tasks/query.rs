//! Ordered views over a task collection.
//!
//! Every function here is pure: it takes the tasks and the caller's clock and
//! returns a freshly sorted `Vec`. Ties are broken deterministically, ending
//! with `sort_order`, so the same input always yields the same output.

use crate::tasks::models::{Priority, Task};
use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};

/// Incomplete first, then priority descending, then newest created first.
#[must_use]
pub fn all(tasks: &[Task]) -> Vec<Task> {
    sorted(tasks.iter(), |a, b| {
        a.is_completed
            .cmp(&b.is_completed)
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| newest_first(a, b))
    })
}

/// Incomplete tasks: priority descending, overdue first, due today first, newest first.
#[must_use]
pub fn incomplete(tasks: &[Task], now: DateTime<Utc>, limit: Option<usize>) -> Vec<Task> {
    let local_now = now.with_timezone(&chrono::Local);
    let mut out = sorted(tasks.iter().filter(|t| !t.is_completed), |a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| Reverse(a.is_overdue_at(now)).cmp(&Reverse(b.is_overdue_at(now))))
            .then_with(|| {
                Reverse(a.is_due_today_at(&local_now)).cmp(&Reverse(b.is_due_today_at(&local_now)))
            })
            .then_with(|| newest_first(a, b))
    });
    truncate(&mut out, limit);
    out
}

/// Tasks due during the caller's current local day, soonest first.
#[must_use]
pub fn due_today(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    let local_now = now.with_timezone(&chrono::Local);
    sorted(tasks.iter().filter(|t| t.is_due_today_at(&local_now)), |a, b| {
        a.due_date.cmp(&b.due_date).then_with(|| b.priority.cmp(&a.priority))
    })
}

/// Overdue tasks: priority descending, then soonest due first.
#[must_use]
pub fn overdue(tasks: &[Task], now: DateTime<Utc>) -> Vec<Task> {
    sorted(tasks.iter().filter(|t| t.is_overdue_at(now)), |a, b| {
        b.priority.cmp(&a.priority).then_with(|| a.due_date.cmp(&b.due_date))
    })
}

/// Incomplete high and critical tasks, most urgent first.
#[must_use]
pub fn high_priority(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut out = sorted(
        tasks.iter().filter(|t| !t.is_completed && t.priority >= Priority::High),
        |a, b| b.priority.cmp(&a.priority).then_with(|| newest_first(a, b)),
    );
    out.truncate(limit);
    out
}

/// Tasks whose category matches `name`, ignoring case.
#[must_use]
pub fn by_category(tasks: &[Task], name: &str) -> Vec<Task> {
    let wanted = name.trim().to_lowercase();
    let matching = tasks
        .iter()
        .filter(|t| t.category.as_deref().is_some_and(|c| c.trim().to_lowercase() == wanted));
    sorted(matching, |a, b| {
        a.is_completed
            .cmp(&b.is_completed)
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| newest_first(a, b))
    })
}

/// Completed tasks, most recently updated first.
#[must_use]
pub fn recently_completed(tasks: &[Task], limit: usize) -> Vec<Task> {
    let mut out = sorted(tasks.iter().filter(|t| t.is_completed), |a, b| {
        b.updated_at.cmp(&a.updated_at).then_with(|| b.sort_order.cmp(&a.sort_order))
    });
    out.truncate(limit);
    out
}

fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at).then_with(|| b.sort_order.cmp(&a.sort_order))
}

fn sorted<'a>(
    tasks: impl Iterator<Item = &'a Task>,
    cmp: impl Fn(&Task, &Task) -> Ordering,
) -> Vec<Task> {
    let mut out: Vec<Task> = tasks.cloned().collect();
    out.sort_by(|a, b| cmp(a, b));
    out
}

fn truncate(tasks: &mut Vec<Task>, limit: Option<usize>) {
    if let Some(limit) = limit {
        tasks.truncate(limit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::models::TaskDraft;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-10T12:00:00Z").unwrap().with_timezone(&Utc)
    }

    fn task(title: &str, priority: Priority, created_offset_min: i64, order: i64) -> Task {
        TaskDraft::new(title)
            .unwrap()
            .priority(priority)
            .into_task(now() - Duration::hours(5) + Duration::minutes(created_offset_min), order)
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn test_all_orders_incomplete_priority_then_newest() {
        let mut done = task("done-critical", Priority::Critical, 50, 1);
        done.is_completed = true;
        let tasks = vec![
            done,
            task("old-high", Priority::High, 0, 2),
            task("new-high", Priority::High, 10, 3),
            task("low", Priority::Low, 60, 4),
        ];
        assert_eq!(titles(&all(&tasks)), vec!["new-high", "old-high", "low", "done-critical"]);
    }

    #[test]
    fn test_incomplete_excludes_completed_and_limits() {
        let mut done = task("done", Priority::Critical, 0, 1);
        done.is_completed = true;
        let tasks = vec![
            done,
            task("a", Priority::Low, 0, 2),
            task("b", Priority::High, 0, 3),
            task("c", Priority::Medium, 0, 4),
        ];
        let result = incomplete(&tasks, now(), None);
        assert_eq!(titles(&result), vec!["b", "c", "a"]);
        assert!(result.iter().all(|t| !t.is_completed));

        let limited = incomplete(&tasks, now(), Some(2));
        assert_eq!(titles(&limited), vec!["b", "c"]);
    }

    #[test]
    fn test_incomplete_overdue_before_pending_within_priority() {
        let mut late = task("late", Priority::Medium, 0, 1);
        late.due_date = Some(now() - Duration::hours(1));
        let fresh = task("fresh", Priority::Medium, 30, 2);
        let result = incomplete(&[fresh, late], now(), None);
        assert_eq!(titles(&result), vec!["late", "fresh"]);
    }

    #[test]
    fn test_overdue_priority_then_soonest_due() {
        let mut a = task("medium-older", Priority::Medium, 0, 1);
        a.due_date = Some(now() - Duration::hours(3));
        let mut b = task("medium-newer", Priority::Medium, 0, 2);
        b.due_date = Some(now() - Duration::hours(1));
        let mut c = task("high", Priority::High, 0, 3);
        c.due_date = Some(now() - Duration::minutes(1));
        let mut future = task("future", Priority::Critical, 0, 4);
        future.due_date = Some(now() + Duration::hours(1));

        let result = overdue(&[a, b, c, future], now());
        assert_eq!(titles(&result), vec!["high", "medium-older", "medium-newer"]);
    }

    #[test]
    fn test_high_priority_filters_and_limits() {
        let mut done = task("done", Priority::Critical, 0, 1);
        done.is_completed = true;
        let tasks = vec![
            done,
            task("medium", Priority::Medium, 0, 2),
            task("high", Priority::High, 0, 3),
            task("critical", Priority::Critical, 0, 4),
        ];
        assert_eq!(titles(&high_priority(&tasks, 5)), vec!["critical", "high"]);
        assert_eq!(titles(&high_priority(&tasks, 1)), vec!["critical"]);
    }

    #[test]
    fn test_by_category_is_case_insensitive() {
        let mut work = task("report", Priority::Medium, 0, 1);
        work.category = Some("Work".to_string());
        let mut home = task("dishes", Priority::Medium, 0, 2);
        home.category = Some("home".to_string());
        let none = task("loose", Priority::Medium, 0, 3);

        let result = by_category(&[work, home, none], "WORK");
        assert_eq!(titles(&result), vec!["report"]);
    }

    #[test]
    fn test_recently_completed_most_recent_first() {
        let mut a = task("a", Priority::Medium, 0, 1);
        a.is_completed = true;
        a.updated_at = now() - Duration::minutes(10);
        let mut b = task("b", Priority::Medium, 0, 2);
        b.is_completed = true;
        b.updated_at = now();
        let c = task("c", Priority::Medium, 0, 3);

        assert_eq!(titles(&recently_completed(&[a.clone(), b.clone(), c.clone()], 5)), vec!["b", "a"]);
        assert_eq!(titles(&recently_completed(&[a, b, c], 1)), vec!["b"]);
    }

    #[test]
    fn test_due_today_filters() {
        let mut today = task("today", Priority::Medium, 0, 1);
        today.due_date = Some(now());
        let mut later = task("later", Priority::Medium, 0, 2);
        later.due_date = Some(now() + Duration::days(3));
        let result = due_today(&[today, later], now());
        assert_eq!(titles(&result), vec!["today"]);
    }
}
