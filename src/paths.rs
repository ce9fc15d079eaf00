//! Path utilities for determining storage locations.
//!
//! Three mediums are candidates, in priority order:
//! - the shared container, visible to both the app and the widget process;
//! - a private documents directory, specific to one process;
//! - a per-process key-value database.
//!
//! Each default location can be overridden with an environment variable,
//! which is how tests and sandboxed hosts point the processes elsewhere.

use std::path::PathBuf;

/// The directory name used under the platform's data and config directories.
const APP_DIR_NAME: &str = "todo-sync";

/// Config file name inside the app config directory.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Environment override for the shared container root.
pub const SHARED_CONTAINER_ENV: &str = "TODO_SYNC_SHARED_CONTAINER";

/// Environment override for the private documents root.
pub const PRIVATE_DIR_ENV: &str = "TODO_SYNC_PRIVATE_DIR";

/// Environment override for the key-value database file.
pub const KV_PATH_ENV: &str = "TODO_SYNC_KV_PATH";

/// Get the default config file path.
///
/// Returns `<config dir>/todo-sync/config.yaml` or `None` if the platform
/// has no config directory.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILENAME))
}

/// Resolve the shared container for an app group.
///
/// Returns `<data dir>/todo-sync/groups/<group>/` unless overridden.
#[must_use]
pub fn shared_container_dir(app_group: &str) -> Option<PathBuf> {
    if let Some(dir) = env_path(SHARED_CONTAINER_ENV) {
        return Some(dir);
    }
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME).join("groups").join(sanitize(app_group)))
}

/// Resolve the private documents directory for one process.
///
/// Returns `<documents>/todo-sync/<process>/`, falling back to the local data
/// directory when there is no documents directory.
#[must_use]
pub fn private_documents_dir(process: &str) -> Option<PathBuf> {
    if let Some(dir) = env_path(PRIVATE_DIR_ENV) {
        return Some(dir.join(sanitize(process)));
    }
    dirs::document_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join(APP_DIR_NAME).join(sanitize(process)))
}

/// Resolve the key-value database for one process.
///
/// Always returns a path: the config directory if there is one, otherwise
/// the system temp directory.
#[must_use]
pub fn key_value_path(process: &str) -> PathBuf {
    if let Some(path) = env_path(KV_PATH_ENV) {
        return path;
    }
    dirs::config_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join(format!("{}-defaults.sqlite3", sanitize(process)))
}

fn env_path(var: &str) -> Option<PathBuf> {
    std::env::var_os(var).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Make a name safe to use as a single path component.
///
/// Non-alphanumeric characters (other than `.` and `_`) become hyphens and
/// runs of hyphens collapse.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let c = if c.is_ascii_alphanumeric() || c == '.' || c == '_' { c } else { '-' };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '.') {
        "default".to_string()
    } else {
        trimmed.to_string()
    }
}
