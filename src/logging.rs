//! Log output for hosts embedding the library.
//!
//! The library only emits `tracing` events. A host (the CLI, the app shell,
//! the widget extension) calls [`init`] once to print them.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `todo_sync=debug`.
pub const LOG_ENV: &str = "TODO_SYNC_LOG";

/// Filter used when [`LOG_ENV`] is unset or invalid.
pub const DEFAULT_FILTER: &str = "todo_sync=info";

/// Build the filter from [`LOG_ENV`], falling back to [`DEFAULT_FILTER`].
#[must_use]
pub fn filter() -> EnvFilter {
    std::env::var(LOG_ENV)
        .ok()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a stderr subscriber. Returns false if one was already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
