//! Task records and the pure logic around them.
//!
//! This module provides:
//! - The [`Task`] entity with derived scheduling predicates
//! - [`TaskCollection`], the in-memory set with sort-order bookkeeping
//! - Ordered query views in [`query`]
//! - [`Statistics`] snapshots
//!
//! Nothing here performs I/O. Persistence lives in [`crate::storage`].
//!
//! # Example
//!
//! ```
//! use todo_sync::tasks::{Priority, TaskCollection, TaskDraft, query};
//!
//! let mut tasks = TaskCollection::new();
//! let draft = TaskDraft::new("Buy milk").unwrap().priority(Priority::High);
//! let task = tasks.create(draft, chrono::Utc::now());
//! assert_eq!(task.sort_order, 1);
//!
//! let view = query::all(tasks.tasks());
//! assert_eq!(view[0].title, "Buy milk");
//! ```

pub mod collection;
pub mod models;
pub mod query;
pub mod stats;

pub use collection::TaskCollection;
pub use models::{EmptyTitle, InvalidPriority, Priority, Task, TaskDraft, TaskUpdate};
pub use stats::Statistics;
