//! The in-memory task collection owned by a [`TaskManager`](crate::manager::TaskManager).
//!
//! Mutations here are plain edits: they cannot fail and never touch storage.
//! The manager wraps a collection in a lock and schedules persistence after
//! each edit.

use crate::tasks::models::{Task, TaskDraft, TaskUpdate};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// How local tasks that storage lacks are numbered when merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalOrder {
    /// Give them fresh orders above every loaded task.
    Renumber,
    /// Keep their orders unless a loaded task already holds one.
    Preserve,
}

/// An ordered set of tasks plus the sort-order counter.
///
/// The collection also remembers which ids were created, edited or deleted
/// since the last durable save. Reloads never overwrite those.
#[derive(Debug, Clone, Default)]
pub struct TaskCollection {
    tasks: Vec<Task>,
    next_sort_order: i64,
    unsaved: HashSet<Uuid>,
}

impl TaskCollection {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a loaded collection in, keeping everything local.
    ///
    /// A task present on both sides keeps the local copy if it is unsaved or
    /// newer, else the stored one. Tasks deleted here but not yet saved stay
    /// deleted. Local tasks storage lacks are appended. Returns how many local
    /// copies were kept, all of which still need writing.
    pub fn merge_loaded(&mut self, loaded: Vec<Task>, order: LocalOrder) -> usize {
        self.reconcile(loaded, true, order)
    }

    /// Adopt a loaded collection, keeping only unsaved local changes.
    ///
    /// Unlike [`TaskCollection::merge_loaded`], saved local tasks that
    /// storage no longer has are dropped, since another process deleted them.
    /// Returns how many unsaved local copies were kept.
    pub fn refresh_from(&mut self, loaded: Vec<Task>) -> usize {
        self.reconcile(loaded, false, LocalOrder::Preserve)
    }

    fn reconcile(&mut self, loaded: Vec<Task>, keep_saved: bool, order: LocalOrder) -> usize {
        let mut local: Vec<Option<Task>> = std::mem::take(&mut self.tasks).into_iter().map(Some).collect();
        let index: HashMap<Uuid, usize> =
            local.iter().enumerate().filter_map(|(i, t)| t.as_ref().map(|t| (t.id, i))).collect();

        let mut kept = 0;
        let mut merged = Vec::with_capacity(loaded.len() + local.len());
        for stored in loaded {
            let unsaved = self.unsaved.contains(&stored.id);
            let ours = index.get(&stored.id).and_then(|&i| local[i].take());
            match ours {
                Some(ours) if unsaved || (keep_saved && ours.updated_at > stored.updated_at) => {
                    kept += 1;
                    merged.push(ours);
                }
                // Deleted here, not saved yet.
                None if unsaved => {}
                _ => merged.push(stored),
            }
        }

        let rest: Vec<Task> =
            local.into_iter().flatten().filter(|t| keep_saved || self.unsaved.contains(&t.id)).collect();
        kept += rest.len();

        let ceiling = match order {
            LocalOrder::Renumber => merged.iter().map(|t| t.sort_order).max(),
            LocalOrder::Preserve => merged.iter().chain(&rest).map(|t| t.sort_order).max(),
        };
        self.next_sort_order = self.next_sort_order.max(ceiling.unwrap_or(0) + 1);

        let mut used: HashSet<i64> = merged.iter().map(|t| t.sort_order).collect();
        for mut task in rest {
            let keep_order = order == LocalOrder::Preserve && task.sort_order > 0 && used.insert(task.sort_order);
            if !keep_order {
                task.sort_order = self.take_sort_order();
            }
            merged.push(task);
        }
        self.tasks = merged;
        kept
    }

    /// Take the set of unsaved ids, typically alongside a snapshot to save.
    pub fn take_unsaved(&mut self) -> HashSet<Uuid> {
        std::mem::take(&mut self.unsaved)
    }

    /// Put back ids whose save failed.
    pub fn restore_unsaved(&mut self, ids: HashSet<Uuid>) {
        self.unsaved.extend(ids);
    }

    fn take_sort_order(&mut self) -> i64 {
        let order = self.next_sort_order.max(1);
        self.next_sort_order = order + 1;
        order
    }

    /// Add a task built from `draft`.
    pub fn create(&mut self, draft: TaskDraft, now: DateTime<Utc>) -> Task {
        let order = self.take_sort_order();
        let task = draft.into_task(now, order);
        self.unsaved.insert(task.id);
        self.tasks.push(task.clone());
        task
    }

    /// Apply `update` to the task with `id`.
    pub fn update(&mut self, id: Uuid, update: &TaskUpdate, now: DateTime<Utc>) -> Option<Task> {
        let task = self.tasks.iter_mut().find(|t| t.id == id)?;
        if task.apply(update, now) {
            self.unsaved.insert(id);
        }
        Some(task.clone())
    }

    /// Flip the completion flag of the task with `id`.
    pub fn toggle_complete(&mut self, id: Uuid, now: DateTime<Utc>) -> Option<Task> {
        let done = self.get(id)?.is_completed;
        self.update(id, &TaskUpdate::completed(!done), now)
    }

    /// Apply several updates at once. Unknown ids are skipped.
    pub fn bulk_update(
        &mut self,
        changes: impl IntoIterator<Item = (Uuid, TaskUpdate)>,
        now: DateTime<Utc>,
    ) -> Vec<Task> {
        changes.into_iter().filter_map(|(id, update)| self.update(id, &update, now)).collect()
    }

    /// Remove the task with `id`. Returns whether it existed.
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        let removed = self.tasks.len() != before;
        if removed {
            self.unsaved.insert(id);
        }
        removed
    }

    /// Look up a task by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find the single task whose id starts with `prefix`.
    #[must_use]
    pub fn find_by_prefix(&self, prefix: &str) -> Option<&Task> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self.tasks.iter().filter(|t| t.id.to_string().starts_with(&prefix));
        let first = matches.next()?;
        matches.next().is_none().then_some(first)
    }

    /// All tasks in insertion order.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The sort order the next created task will receive.
    #[must_use]
    pub const fn next_sort_order(&self) -> i64 {
        self.next_sort_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::models::Priority;
    use chrono::Duration;
    use proptest::prelude::*;

    fn draft(title: &str) -> TaskDraft {
        TaskDraft::new(title).unwrap()
    }

    #[test]
    fn test_create_assigns_increasing_sort_order() {
        let mut c = TaskCollection::new();
        let a = c.create(draft("a"), Utc::now());
        let b = c.create(draft("b"), Utc::now());
        assert_eq!(a.sort_order, 1);
        assert_eq!(b.sort_order, 2);
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_sort_order_not_reused_after_delete() {
        let mut c = TaskCollection::new();
        c.create(draft("a"), Utc::now());
        let b = c.create(draft("b"), Utc::now());
        assert!(c.delete(b.id));
        let d = c.create(draft("d"), Utc::now());
        assert_eq!(d.sort_order, 3);
    }

    #[test]
    fn test_loaded_tasks_move_counter_past_max() {
        let now = Utc::now();
        let tasks = vec![draft("x").into_task(now, 4), draft("y").into_task(now, 9)];
        let mut c = TaskCollection::new();
        c.merge_loaded(tasks, LocalOrder::Renumber);
        assert_eq!(c.next_sort_order(), 10);
        assert_eq!(c.create(draft("z"), now).sort_order, 10);
    }

    #[test]
    fn test_update_refreshes_updated_at() {
        let mut c = TaskCollection::new();
        let start = Utc::now();
        let task = c.create(draft("a"), start);
        let later = start + Duration::seconds(5);
        let updated = c
            .update(task.id, &TaskUpdate { priority: Some(Priority::High), ..TaskUpdate::default() }, later)
            .unwrap();
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.updated_at, later);
        assert_eq!(updated.id, task.id);
    }

    #[test]
    fn test_update_unknown_returns_none() {
        let mut c = TaskCollection::new();
        assert!(c.update(Uuid::new_v4(), &TaskUpdate::completed(true), Utc::now()).is_none());
        assert!(c.toggle_complete(Uuid::new_v4(), Utc::now()).is_none());
        assert!(!c.delete(Uuid::new_v4()));
    }

    #[test]
    fn test_toggle_complete() {
        let mut c = TaskCollection::new();
        let task = c.create(draft("a"), Utc::now());
        assert!(c.toggle_complete(task.id, Utc::now()).unwrap().is_completed);
        assert!(!c.toggle_complete(task.id, Utc::now()).unwrap().is_completed);
    }

    #[test]
    fn test_bulk_update_skips_unknown() {
        let mut c = TaskCollection::new();
        let a = c.create(draft("a"), Utc::now());
        let b = c.create(draft("b"), Utc::now());
        let updated = c.bulk_update(
            vec![
                (a.id, TaskUpdate::completed(true)),
                (Uuid::new_v4(), TaskUpdate::completed(true)),
                (b.id, TaskUpdate::completed(true)),
            ],
            Utc::now(),
        );
        assert_eq!(updated.len(), 2);
        assert!(c.tasks().iter().all(|t| t.is_completed));
    }

    /// A collection holding `tasks` with nothing left to save.
    fn saved(tasks: Vec<Task>) -> TaskCollection {
        let mut c = TaskCollection::new();
        c.merge_loaded(tasks, LocalOrder::Renumber);
        c.take_unsaved();
        c
    }

    #[test]
    fn test_merge_loaded_renumbers_local_tasks_above_loaded() {
        let mut c = TaskCollection::new();
        let early = c.create(draft("created before load"), Utc::now());
        let loaded = vec![draft("stored").into_task(Utc::now(), 5)];

        assert_eq!(c.merge_loaded(loaded, LocalOrder::Renumber), 1);
        assert_eq!(c.len(), 2);
        assert_eq!(c.tasks()[0].title, "stored");
        assert_eq!(c.get(early.id).unwrap().sort_order, 6);
    }

    #[test]
    fn test_merge_loaded_preserves_orders_without_clash() {
        let now = Utc::now();
        let mut c = saved(vec![draft("a").into_task(now, 1), draft("b").into_task(now, 3)]);
        let loaded = vec![draft("other").into_task(now, 3)];

        assert_eq!(c.merge_loaded(loaded, LocalOrder::Preserve), 2);
        let orders: HashSet<i64> = c.tasks().iter().map(|t| t.sort_order).collect();
        assert_eq!(c.tasks().iter().find(|t| t.title == "a").unwrap().sort_order, 1);
        assert_eq!(c.tasks().iter().find(|t| t.title == "b").unwrap().sort_order, 4);
        assert_eq!(orders.len(), 3);
        assert_eq!(c.next_sort_order(), 5);
    }

    #[test]
    fn test_merge_loaded_keeps_orders_when_storage_is_empty() {
        let now = Utc::now();
        let mut c = saved(vec![draft("a").into_task(now, 2), draft("b").into_task(now, 7)]);
        c.merge_loaded(Vec::new(), LocalOrder::Preserve);
        let orders: Vec<i64> = c.tasks().iter().map(|t| t.sort_order).collect();
        assert_eq!(orders, vec![2, 7]);
    }

    #[test]
    fn test_merge_loaded_prefers_newer_copy() {
        let now = Utc::now();
        let stored = draft("stored").into_task(now, 1);
        let mut newer = stored.clone();
        newer.title = "newer local".to_string();
        newer.updated_at = now + Duration::minutes(1);

        let mut c = saved(vec![newer]);
        assert_eq!(c.merge_loaded(vec![stored.clone()], LocalOrder::Preserve), 1);
        assert_eq!(c.tasks()[0].title, "newer local");

        let mut older = stored.clone();
        older.title = "older local".to_string();
        older.updated_at = now - Duration::minutes(1);
        let mut c = saved(vec![older]);
        assert_eq!(c.merge_loaded(vec![stored], LocalOrder::Preserve), 0);
        assert_eq!(c.tasks()[0].title, "stored");
    }

    #[test]
    fn test_refresh_keeps_unsaved_edit() {
        let now = Utc::now();
        let stored = draft("Original").into_task(now, 1);
        let mut c = saved(vec![stored.clone()]);
        let update = TaskUpdate { title: Some("Edited".into()), ..TaskUpdate::default() };
        c.update(stored.id, &update, now - Duration::minutes(1));

        assert_eq!(c.refresh_from(vec![stored]), 1);
        assert_eq!(c.tasks()[0].title, "Edited");
        assert_eq!(c.take_unsaved().len(), 1);
    }

    #[test]
    fn test_refresh_adopts_stored_copy_of_saved_task() {
        let now = Utc::now();
        let original = draft("Original").into_task(now, 1);
        let mut c = saved(vec![original.clone()]);
        let mut elsewhere = original;
        elsewhere.title = "Changed elsewhere".to_string();

        assert_eq!(c.refresh_from(vec![elsewhere]), 0);
        assert_eq!(c.tasks()[0].title, "Changed elsewhere");
    }

    #[test]
    fn test_refresh_drops_saved_task_missing_from_storage() {
        let now = Utc::now();
        let mut c = saved(vec![draft("gone").into_task(now, 1)]);
        let fresh = c.create(draft("fresh"), now);

        assert_eq!(c.refresh_from(Vec::new()), 1);
        assert_eq!(c.len(), 1);
        assert_eq!(c.tasks()[0].id, fresh.id);
    }

    #[test]
    fn test_unsaved_delete_is_not_resurrected() {
        let now = Utc::now();
        let task = draft("deleted").into_task(now, 1);
        let mut c = saved(vec![task.clone()]);
        assert!(c.delete(task.id));

        assert_eq!(c.refresh_from(vec![task.clone()]), 0);
        assert!(c.is_empty());
        c.merge_loaded(vec![task], LocalOrder::Preserve);
        assert!(c.is_empty());
    }

    #[test]
    fn test_restore_unsaved_after_failed_save() {
        let mut c = TaskCollection::new();
        let task = c.create(draft("a"), Utc::now());
        let pending = c.take_unsaved();
        assert!(c.take_unsaved().is_empty());
        c.restore_unsaved(pending);
        assert!(c.take_unsaved().contains(&task.id));
    }

    #[test]
    fn test_find_by_prefix() {
        let mut c = TaskCollection::new();
        let task = c.create(draft("a"), Utc::now());
        let id = task.id.to_string();
        assert_eq!(c.find_by_prefix(&id[..8]).unwrap().id, task.id);
        assert!(c.find_by_prefix("").is_none());
        assert!(c.find_by_prefix("zzzz").is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Create,
        Delete(usize),
        Toggle(usize),
        Retitle(usize),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => Just(Op::Create),
            1 => any::<usize>().prop_map(Op::Delete),
            1 => any::<usize>().prop_map(Op::Toggle),
            1 => any::<usize>().prop_map(Op::Retitle),
        ]
    }

    proptest! {
        #[test]
        fn prop_sort_order_unique_and_follows_creation(ops in proptest::collection::vec(arb_op(), 0..60)) {
            let mut c = TaskCollection::new();
            let mut created: Vec<i64> = Vec::new();
            let now = Utc::now();
            for op in ops {
                let ids: Vec<Uuid> = c.tasks().iter().map(|t| t.id).collect();
                match op {
                    Op::Create => created.push(c.create(draft("generated"), now).sort_order),
                    Op::Delete(i) if !ids.is_empty() => { c.delete(ids[i % ids.len()]); }
                    Op::Toggle(i) if !ids.is_empty() => { c.toggle_complete(ids[i % ids.len()], now); }
                    Op::Retitle(i) if !ids.is_empty() => {
                        let update = TaskUpdate { title: Some("renamed".into()), ..TaskUpdate::default() };
                        c.update(ids[i % ids.len()], &update, now);
                    }
                    _ => {}
                }
            }
            prop_assert!(created.windows(2).all(|w| w[0] < w[1]));
            let orders: Vec<i64> = c.tasks().iter().map(|t| t.sort_order).collect();
            let unique: HashSet<i64> = orders.iter().copied().collect();
            prop_assert_eq!(unique.len(), orders.len());
            prop_assert!(orders.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn prop_incomplete_never_returns_completed(ops in proptest::collection::vec(arb_op(), 0..40)) {
            let mut c = TaskCollection::new();
            let now = Utc::now();
            for op in ops {
                let ids: Vec<Uuid> = c.tasks().iter().map(|t| t.id).collect();
                match op {
                    Op::Create => { c.create(draft("generated"), now); }
                    Op::Toggle(i) if !ids.is_empty() => { c.toggle_complete(ids[i % ids.len()], now); }
                    _ => {}
                }
            }
            let incomplete = crate::tasks::query::incomplete(c.tasks(), now, None);
            prop_assert!(incomplete.iter().all(|t| !t.is_completed));
        }
    }
}
