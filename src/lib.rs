//! # `todo_sync`
//!
//! Shared task storage for a to-do app and its home-screen widget.
//!
//! The app and the widget run as separate processes. Each builds its own
//! [`TaskManager`], which picks a storage medium both can reach when possible,
//! keeps the tasks in memory, and persists every change in the background.
//!
//! ```no_run
//! use todo_sync::{ProcessRole, SyncConfig, TaskDraft, TaskManager};
//!
//! # async fn demo() -> todo_sync::Result<()> {
//! let manager = TaskManager::spawn(SyncConfig::for_process(ProcessRole::App))?;
//! manager.ready().await;
//! manager.create(TaskDraft::new("Buy milk").unwrap());
//! manager.flush().await?;
//! assert!(manager.can_sync_with_widget());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod notify;
pub mod paths;
pub mod storage;
pub mod tasks;
pub mod testing;
pub mod traits;
pub mod widget;

pub use config::{ProcessRole, SyncConfig, WidgetConfig};
pub use error::{Error, Result};
pub use manager::{Diagnostics, SyncStatus, TaskManager, TaskManagerBuilder};
pub use notify::{ChannelNotifier, NoopNotifier, RefreshWatcher, StampFileNotifier};
pub use storage::{LoadOutcome, PersistenceEngine, StorageStrategy};
pub use tasks::{Priority, Statistics, Task, TaskCollection, TaskDraft, TaskUpdate};
pub use traits::{MediumProbe, Record, RecordStore, RefreshNotifier, SeedProvider};
pub use widget::{WidgetFamily, WidgetSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
