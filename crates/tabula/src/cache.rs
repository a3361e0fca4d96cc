//! Workspace-scoped cache with a single active key.

use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Holds one value for at most one workspace at a time.
///
/// Asking for a different workspace replaces the entry, so switching
/// workspaces can never serve the previous workspace's value. Callers own
/// the instance and pass it where it is needed.
#[derive(Debug, Default)]
pub struct WorkspaceCache<T> {
    entry: Mutex<Option<(String, T)>>,
}

impl<T: Clone> WorkspaceCache<T> {
    pub fn new() -> Self {
        Self {
            entry: Mutex::new(None),
        }
    }

    /// Cached value for `workspace_id`, if that workspace is the active one.
    pub fn get(&self, workspace_id: &str) -> Option<T> {
        let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry
            .as_ref()
            .filter(|(key, _)| key == workspace_id)
            .map(|(_, value)| value.clone())
    }

    pub fn insert(&self, workspace_id: &str, value: T) {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        *entry = Some((workspace_id.to_string(), value));
    }

    /// Cached value for `workspace_id`, computing it with `f` on a miss.
    ///
    /// `f` runs without the lock held, so it may use this cache itself.
    pub fn get_or_insert_with<F>(&self, workspace_id: &str, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        {
            let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
            match entry.as_ref() {
                Some((key, value)) if key == workspace_id => return value.clone(),
                Some((previous, _)) => debug!(
                    "Workspace cache switching from '{}' to '{}'",
                    previous, workspace_id
                ),
                None => {}
            }
        }
        let value = f();
        self.insert(workspace_id, value.clone());
        value
    }

    pub fn active_workspace(&self) -> Option<String> {
        let entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        entry.as_ref().map(|(key, _)| key.clone())
    }

    /// Drop the cached value, e.g. on sign-out or after the user edits settings.
    pub fn invalidate(&self) {
        let mut entry = self.entry.lock().unwrap_or_else(PoisonError::into_inner);
        *entry = None;
    }
}
