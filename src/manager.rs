//! The per-process task manager.
//!
//! A [`TaskManager`] is the single source of truth for one process. It owns
//! the in-memory [`TaskCollection`] and a background persistence worker:
//!
//! - Mutations edit the collection under a write lock and return at once.
//!   Each one marks the collection dirty and queues a save; the worker
//!   coalesces queued saves so only the newest snapshot is written.
//! - Queries read a snapshot under a read lock and never touch storage.
//! - The worker selects a backend, loads, and then serves jobs in FIFO
//!   order. All blocking I/O runs on tokio's blocking pool.
//!
//! Storage problems never surface from mutations or queries. They show up in
//! [`TaskManager::status`] and [`TaskManager::last_error`].

use crate::config::{ProcessRole, SyncConfig};
use crate::error::{Error, Result};
use crate::notify::{NoopNotifier, StampFileNotifier};
use crate::storage::persistence::{LoadOutcome, PersistenceEngine};
use crate::storage::selector::{BackendSelector, SelectedBackend, StorageStrategy};
use crate::tasks::collection::LocalOrder;
use crate::tasks::{query, Statistics, Task, TaskCollection, TaskDraft, TaskUpdate};
use crate::traits::{MediumProbe, RecordStore, RefreshNotifier, SeedProvider};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use uuid::Uuid;

/// Where the manager is in its load/save cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// No backend selected yet.
    #[default]
    Unknown,
    /// Backend selected; nothing synchronized yet.
    Ready,
    /// A load or save is in progress.
    Syncing,
    /// The last load or save succeeded.
    Synced,
    /// The last load or save failed. See [`TaskManager::last_error`].
    Failed,
}

impl SyncStatus {
    /// Get the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Ready => "ready",
            Self::Syncing => "syncing",
            Self::Synced => "synced",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A point-in-time report for settings screens and support.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    /// Which process produced the report.
    pub process: ProcessRole,
    /// Committed strategy, if selection has finished.
    pub strategy: Option<StorageStrategy>,
    /// Root directory or database file.
    pub location: Option<String>,
    /// Current status.
    pub status: SyncStatus,
    /// Message of the last failure, cleared by the next success.
    pub last_error: Option<String>,
    /// Number of tasks in memory.
    pub task_count: usize,
    /// Whether the other process can see this one's writes.
    pub can_sync_with_widget: bool,
    /// Selector summary including rejected mediums.
    pub backend: Option<String>,
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "process: {}", self.process)?;
        match &self.backend {
            Some(backend) => writeln!(f, "{backend}")?,
            None => writeln!(f, "storage: not selected")?,
        }
        writeln!(f, "status: {}", self.status)?;
        writeln!(f, "tasks: {}", self.task_count)?;
        write!(f, "last error: {}", self.last_error.as_deref().unwrap_or("none"))
    }
}

enum Job {
    Save,
    Reload(oneshot::Sender<()>),
    Reprobe(oneshot::Sender<Option<StorageStrategy>>),
    Flush(oneshot::Sender<()>),
}

/// State shared between the handles and the worker.
struct Inner {
    config: SyncConfig,
    collection: RwLock<TaskCollection>,
    status: watch::Sender<SyncStatus>,
    ready: watch::Sender<bool>,
    last_error: RwLock<Option<String>>,
    backend: RwLock<Option<SelectedBackend>>,
    /// Set under the collection write lock by every mutation.
    dirty: AtomicBool,
}

impl Inner {
    fn set_status(&self, status: SyncStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            tracing::debug!(process = %self.config.process, from = %previous, to = %status, "sync status changed");
        }
    }

    fn record_failure(&self, error: &Error) {
        *self.last_error.write() = Some(error.to_string());
        self.set_status(SyncStatus::Failed);
    }

    fn record_success(&self, status: SyncStatus) {
        *self.last_error.write() = None;
        self.set_status(status);
    }
}

/// Builder for a [`TaskManager`].
pub struct TaskManagerBuilder {
    config: SyncConfig,
    probe: Option<Arc<dyn MediumProbe>>,
    notifier: Option<Arc<dyn RefreshNotifier>>,
    seed: Option<Arc<dyn SeedProvider>>,
    store: Option<(Arc<dyn RecordStore>, StorageStrategy)>,
}

impl std::fmt::Debug for TaskManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManagerBuilder").field("config", &self.config).finish_non_exhaustive()
    }
}

impl TaskManagerBuilder {
    /// Probe candidate mediums with `probe` instead of the filesystem.
    #[must_use]
    pub fn probe(mut self, probe: Arc<dyn MediumProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Signal saves through `notifier`.
    ///
    /// By default a stamp file is written when the shared container is in
    /// use, and nothing otherwise.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn RefreshNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Ask `seed` for first-run content when `seed_if_empty` is set.
    #[must_use]
    pub fn seed_provider(mut self, seed: Arc<dyn SeedProvider>) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Skip selection and persist to `store`, reporting it as `strategy`.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn RecordStore>, strategy: StorageStrategy) -> Self {
        self.store = Some((store, strategy));
        self
    }

    /// Start the persistence worker and return the manager handle.
    ///
    /// The handle is usable immediately; [`TaskManager::ready`] resolves once
    /// the backend is committed and the first load has been merged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] outside a tokio runtime, or a config
    /// error if the configuration is invalid.
    pub fn spawn(self) -> Result<TaskManager> {
        let handle = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        self.config.validate()?;

        let source = match self.store {
            Some((store, strategy)) => {
                let backend = SelectedBackend::assumed(strategy, store.location());
                Source::Fixed { store, backend }
            }
            None => {
                let locations = self.config.locations();
                let selector = match self.probe {
                    Some(probe) => BackendSelector::with_probe(locations, probe),
                    None => BackendSelector::new(locations),
                };
                Source::Probe(Arc::new(selector))
            }
        };

        let (status, _) = watch::channel(SyncStatus::Unknown);
        let (ready, _) = watch::channel(false);
        let seed_if_empty = self.config.seed_if_empty;
        let inner = Arc::new(Inner {
            config: self.config,
            collection: RwLock::new(TaskCollection::new()),
            status,
            ready,
            last_error: RwLock::new(None),
            backend: RwLock::new(None),
            dirty: AtomicBool::new(false),
        });

        let (jobs, rx) = mpsc::unbounded_channel();
        let worker = Worker {
            inner: inner.clone(),
            jobs: rx,
            source,
            notifier: self.notifier,
            seed: self.seed.filter(|_| seed_if_empty),
            engine: None,
        };
        handle.spawn(worker.run());
        tracing::debug!(process = %inner.config.process, "task manager spawned");

        Ok(TaskManager { inner, jobs })
    }
}

/// Handle to a process's task manager. Cheap to clone.
///
/// Queries are synchronous and read whatever is in memory. Until
/// [`TaskManager::ready`] resolves the stored tasks have not been loaded, so
/// the `fetch_*` methods return an empty or partial view. Await `ready()`
/// before the first query; [`WidgetSnapshot::capture`](crate::widget::WidgetSnapshot::capture)
/// and the CLI already do.
///
/// The persistence worker stops once every handle is dropped and the queued
/// jobs are drained.
#[derive(Clone)]
pub struct TaskManager {
    inner: Arc<Inner>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl std::fmt::Debug for TaskManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskManager")
            .field("process", &self.inner.config.process)
            .field("status", &self.status())
            .field("tasks", &self.len())
            .finish_non_exhaustive()
    }
}

impl TaskManager {
    /// Start configuring a manager.
    #[must_use]
    pub fn builder(config: SyncConfig) -> TaskManagerBuilder {
        TaskManagerBuilder { config, probe: None, notifier: None, seed: None, store: None }
    }

    /// Start a manager with default collaborators.
    ///
    /// # Errors
    ///
    /// See [`TaskManagerBuilder::spawn`].
    pub fn spawn(config: SyncConfig) -> Result<Self> {
        Self::builder(config).spawn()
    }

    /// The configuration this manager was started with.
    #[must_use]
    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// Wait until the backend is committed and the first load is merged.
    pub async fn ready(&self) {
        let mut rx = self.inner.ready.subscribe();
        // The sender lives in `inner`, which outlives this call.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    /// Whether [`TaskManager::ready`] would resolve immediately.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    // Mutations

    /// Add a task. Returns the stored task.
    pub fn create(&self, draft: TaskDraft) -> Task {
        self.edit(|tasks, now| {
            let task = tasks.create(draft, now);
            tracing::debug!(id = %task.id, sort_order = task.sort_order, "task created");
            (task, true)
        })
    }

    /// Apply `update` to the task with `id`. Returns the updated task if found.
    pub fn update(&self, id: Uuid, update: &TaskUpdate) -> Option<Task> {
        self.edit(|tasks, now| {
            let task = tasks.update(id, update, now);
            let changed = task.is_some();
            (task, changed)
        })
    }

    /// Flip the completion flag. Returns the updated task if found.
    pub fn toggle_complete(&self, id: Uuid) -> Option<Task> {
        self.edit(|tasks, now| {
            let task = tasks.toggle_complete(id, now);
            let changed = task.is_some();
            (task, changed)
        })
    }

    /// Remove a task. Returns whether one was removed.
    pub fn delete(&self, id: Uuid) -> bool {
        self.edit(|tasks, _| {
            let removed = tasks.delete(id);
            (removed, removed)
        })
    }

    /// Apply several updates under one lock and one save. Returns the updated tasks.
    pub fn bulk_update(&self, changes: impl IntoIterator<Item = (Uuid, TaskUpdate)>) -> Vec<Task> {
        self.edit(|tasks, now| {
            let updated = tasks.bulk_update(changes, now);
            let changed = !updated.is_empty();
            (updated, changed)
        })
    }

    fn edit<T>(&self, f: impl FnOnce(&mut TaskCollection, DateTime<Utc>) -> (T, bool)) -> T {
        let (out, changed) = {
            let mut tasks = self.inner.collection.write();
            let (out, changed) = f(&mut tasks, Utc::now());
            if changed {
                self.inner.dirty.store(true, Ordering::SeqCst);
            }
            (out, changed)
        };
        if changed && self.jobs.send(Job::Save).is_err() {
            tracing::error!("persistence worker stopped, change kept in memory only");
        }
        out
    }

    // Queries. These do not wait for readiness.

    fn view<T>(&self, f: impl FnOnce(&[Task], DateTime<Utc>) -> T) -> T {
        f(self.inner.collection.read().tasks(), Utc::now())
    }

    /// All tasks: incomplete first, then priority descending, then newest.
    #[must_use]
    pub fn fetch_all(&self) -> Vec<Task> {
        self.view(|tasks, _| query::all(tasks))
    }

    /// Incomplete tasks in widget order, truncated to `limit`.
    #[must_use]
    pub fn fetch_incomplete(&self, limit: Option<usize>) -> Vec<Task> {
        self.view(|tasks, now| query::incomplete(tasks, now, limit))
    }

    /// Tasks due today in local time.
    #[must_use]
    pub fn fetch_due_today(&self) -> Vec<Task> {
        self.view(query::due_today)
    }

    /// Overdue tasks, most urgent first.
    #[must_use]
    pub fn fetch_overdue(&self) -> Vec<Task> {
        self.view(query::overdue)
    }

    /// Incomplete high and critical tasks.
    #[must_use]
    pub fn fetch_high_priority(&self, limit: usize) -> Vec<Task> {
        self.view(|tasks, _| query::high_priority(tasks, limit))
    }

    /// Tasks in a category, ignoring case.
    #[must_use]
    pub fn fetch_by_category(&self, name: &str) -> Vec<Task> {
        self.view(|tasks, _| query::by_category(tasks, name))
    }

    /// Completed tasks, most recently updated first.
    #[must_use]
    pub fn fetch_recently_completed(&self, limit: usize) -> Vec<Task> {
        self.view(|tasks, _| query::recently_completed(tasks, limit))
    }

    /// Look up a task by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<Task> {
        self.inner.collection.read().get(id).cloned()
    }

    /// Find the single task whose id starts with `prefix`.
    #[must_use]
    pub fn find_by_prefix(&self, prefix: &str) -> Option<Task> {
        self.inner.collection.read().find_by_prefix(prefix).cloned()
    }

    /// Statistics over the current collection.
    #[must_use]
    pub fn statistics(&self) -> Statistics {
        self.view(Statistics::compute)
    }

    /// Number of tasks in memory.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.collection.read().len()
    }

    /// Whether there are no tasks in memory.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.collection.read().is_empty()
    }

    // Status side channel

    /// Current sync status.
    #[must_use]
    pub fn status(&self) -> SyncStatus {
        *self.inner.status.borrow()
    }

    /// Receive status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.inner.status.subscribe()
    }

    /// Message of the last failed load or save, if the latest one failed.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.inner.last_error.read().clone()
    }

    /// Committed strategy, `None` until selection finishes.
    #[must_use]
    pub fn strategy(&self) -> Option<StorageStrategy> {
        self.inner.backend.read().as_ref().map(SelectedBackend::strategy)
    }

    /// Whether the other process sees this one's writes.
    #[must_use]
    pub fn can_sync_with_widget(&self) -> bool {
        self.inner.backend.read().as_ref().is_some_and(SelectedBackend::can_sync_with_widget)
    }

    /// A report of the current backend and status.
    #[must_use]
    pub fn diagnostics(&self) -> Diagnostics {
        let backend = self.inner.backend.read();
        Diagnostics {
            process: self.inner.config.process,
            strategy: backend.as_ref().map(SelectedBackend::strategy),
            location: backend.as_ref().map(|b| b.location().display().to_string()),
            status: self.status(),
            last_error: self.last_error(),
            task_count: self.len(),
            can_sync_with_widget: backend.as_ref().is_some_and(SelectedBackend::can_sync_with_widget),
            backend: backend.as_ref().map(SelectedBackend::diagnostics),
        }
    }

    // Manual operations

    /// Write any pending change, then reload from storage.
    ///
    /// Local tasks that storage does not know yet are kept.
    ///
    /// # Errors
    ///
    /// Returns an error only if the worker is gone; load failures are
    /// reported through [`TaskManager::status`].
    pub async fn refresh(&self) -> Result<()> {
        self.request(Job::Reload).await
    }

    /// Re-run backend selection, then reload from the chosen medium.
    ///
    /// Tasks held in memory but missing from the new medium are written to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker is gone or no backend could be attached.
    pub async fn reprobe(&self) -> Result<StorageStrategy> {
        self.request(Job::Reprobe)
            .await?
            .ok_or_else(|| Error::Worker("no storage backend attached".to_string()))
    }

    /// Wait until every save queued so far has finished.
    ///
    /// # Errors
    ///
    /// Returns an error only if the worker is gone.
    pub async fn flush(&self) -> Result<()> {
        self.request(Job::Flush).await
    }

    async fn request<T>(&self, job: impl FnOnce(oneshot::Sender<T>) -> Job) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.jobs.send(job(tx)).map_err(|_| Error::Worker("persistence worker stopped".to_string()))?;
        rx.await.map_err(|_| Error::Worker("persistence worker dropped the request".to_string()))
    }
}

enum Source {
    Probe(Arc<BackendSelector>),
    Fixed { store: Arc<dyn RecordStore>, backend: SelectedBackend },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Apply {
    /// First load: every local task is kept and renumbered above the loaded ones.
    Initial,
    /// Newer or unsaved local copies win; local-only tasks keep their orders.
    Merge,
    /// Loaded tasks replace memory except for unsaved local changes.
    Replace,
}

struct Worker {
    inner: Arc<Inner>,
    jobs: mpsc::UnboundedReceiver<Job>,
    source: Source,
    notifier: Option<Arc<dyn RefreshNotifier>>,
    seed: Option<Arc<dyn SeedProvider>>,
    engine: Option<Arc<PersistenceEngine>>,
}

impl Worker {
    async fn run(mut self) {
        self.init().await;
        while let Some(job) = self.jobs.recv().await {
            match job {
                Job::Save => self.save().await,
                Job::Reload(done) => {
                    self.reload().await;
                    let _ = done.send(());
                }
                Job::Reprobe(done) => {
                    let strategy = self.reprobe().await;
                    let _ = done.send(strategy);
                }
                Job::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }
        tracing::debug!(process = %self.inner.config.process, "persistence worker stopped");
    }

    async fn init(&mut self) {
        self.attach().await;
        let outcome = self.load().await;
        let usable = !outcome.is_failure();
        self.apply(outcome, Apply::Initial);
        if usable {
            self.seed_if_empty();
        }
        self.inner.ready.send_replace(true);
        let tasks = self.inner.collection.read().len();
        let status = *self.inner.status.borrow();
        tracing::info!(process = %self.inner.config.process, tasks, %status, "task manager ready");
        self.save().await;
    }

    /// Commit to a backend and build the engine for it.
    async fn attach(&mut self) {
        let (backend, store) = match &self.source {
            Source::Fixed { store, backend } => (backend.clone(), store.clone()),
            Source::Probe(selector) => {
                let selector = selector.clone();
                match tokio::task::spawn_blocking(move || selector.select()).await {
                    Ok(backend) => {
                        let store = backend.open_store();
                        (backend, store)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "backend selection did not complete");
                        self.inner.record_failure(&Error::Worker(e.to_string()));
                        return;
                    }
                }
            }
        };

        let notifier = self.notifier.clone().unwrap_or_else(|| self.default_notifier(&backend));
        self.engine = Some(Arc::new(PersistenceEngine::new(store, notifier)));
        if backend.is_degraded() || !backend.failures().is_empty() {
            tracing::warn!(process = %self.inner.config.process, "{}", backend.diagnostics());
        }
        tracing::info!(
            process = %self.inner.config.process,
            strategy = %backend.strategy(),
            location = %backend.location().display(),
            shared = backend.can_sync_with_widget(),
            "storage backend committed"
        );
        *self.inner.backend.write() = Some(backend);
        self.inner.set_status(SyncStatus::Ready);
    }

    fn default_notifier(&self, backend: &SelectedBackend) -> Arc<dyn RefreshNotifier> {
        match (&self.source, backend.root()) {
            (Source::Probe(_), Some(root)) if backend.can_sync_with_widget() => {
                Arc::new(StampFileNotifier::in_root(root))
            }
            _ => Arc::new(NoopNotifier),
        }
    }

    async fn load(&self) -> LoadOutcome {
        let Some(engine) = self.engine.clone() else {
            return LoadOutcome::Failed(Error::Worker("no storage backend attached".to_string()));
        };
        self.inner.set_status(SyncStatus::Syncing);
        tokio::task::spawn_blocking(move || engine.load())
            .await
            .unwrap_or_else(|e| LoadOutcome::Failed(Error::Worker(e.to_string())))
    }

    /// Fold a load result into memory.
    ///
    /// A failed load leaves memory alone. A missing record keeps whatever is
    /// in memory so it gets written on the next save.
    fn apply(&self, outcome: LoadOutcome, mode: Apply) {
        let (loaded, mode, status) = match outcome {
            LoadOutcome::Missing => {
                let mode = if mode == Apply::Replace { Apply::Merge } else { mode };
                (Vec::new(), mode, SyncStatus::Ready)
            }
            LoadOutcome::Loaded(tasks) => (tasks, mode, SyncStatus::Synced),
            LoadOutcome::Recovered { tasks, cause } => {
                tracing::warn!(%cause, count = tasks.len(), "tasks recovered from backup");
                (tasks, mode, SyncStatus::Synced)
            }
            LoadOutcome::Failed(e) => {
                tracing::error!(error = %e, "load failed, keeping in-memory tasks");
                self.inner.record_failure(&e);
                return;
            }
        };

        {
            let mut tasks = self.inner.collection.write();
            let kept = match mode {
                Apply::Initial => tasks.merge_loaded(loaded, LocalOrder::Renumber),
                Apply::Merge => tasks.merge_loaded(loaded, LocalOrder::Preserve),
                Apply::Replace => tasks.refresh_from(loaded),
            };
            if kept > 0 {
                self.inner.dirty.store(true, Ordering::SeqCst);
                tracing::debug!(kept, "kept local copies storage does not have");
            }
        }
        self.inner.record_success(status);
    }

    fn seed_if_empty(&self) {
        let Some(seed) = &self.seed else { return };
        let mut tasks = self.inner.collection.write();
        if !tasks.is_empty() {
            return;
        }
        let now = Utc::now();
        let drafts = seed.seed();
        let count = drafts.len();
        for draft in drafts {
            tasks.create(draft, now);
        }
        if count > 0 {
            self.inner.dirty.store(true, Ordering::SeqCst);
            tracing::info!(count, "seeded empty collection");
        }
    }

    /// Write the current snapshot if anything changed since the last write.
    async fn save(&self) {
        if !self.inner.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        let Some(engine) = self.engine.clone() else {
            self.inner.dirty.store(true, Ordering::SeqCst);
            return;
        };
        let (snapshot, unsaved) = {
            let mut tasks = self.inner.collection.write();
            (tasks.tasks().to_vec(), tasks.take_unsaved())
        };
        self.inner.set_status(SyncStatus::Syncing);

        let result = match tokio::task::spawn_blocking(move || engine.save(&snapshot)).await {
            Ok(result) => result,
            Err(e) => Err(Error::Worker(e.to_string())),
        };
        match result {
            Ok(report) => {
                tracing::debug!(
                    tasks = report.tasks,
                    backed_up = report.backed_up,
                    statistics = report.statistics_written,
                    "tasks persisted"
                );
                self.inner.record_success(SyncStatus::Synced);
            }
            Err(e) => {
                self.inner.collection.write().restore_unsaved(unsaved);
                self.inner.dirty.store(true, Ordering::SeqCst);
                tracing::error!(error = %e, "save failed, in-memory tasks are authoritative");
                self.inner.record_failure(&e);
            }
        }
    }

    async fn reload(&mut self) {
        self.save().await;
        let outcome = self.load().await;
        self.apply(outcome, Apply::Replace);
        self.save().await;
    }

    async fn reprobe(&mut self) -> Option<StorageStrategy> {
        self.save().await;
        self.attach().await;
        let outcome = self.load().await;
        self.apply(outcome, Apply::Merge);
        self.save().await;
        self.inner.backend.read().as_ref().map(SelectedBackend::strategy)
    }
}
