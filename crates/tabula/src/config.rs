//! Configuration for migration runs and readiness polling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Number of presence checks before a readiness wait gives up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Delay between two presence checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bounds of a readiness wait: at most `max_attempts` checks, `interval` apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl ReadinessConfig {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Longest time a wait can take.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL)
    }
}

/// Options for one migration run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Rows to correct. `None` means every row referenced by a view.
    pub row_ids: Option<Vec<String>>,
    /// Whether to record the new schema version once the run completes.
    pub commit_version: bool,
}

impl MigrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row_ids(mut self, row_ids: Vec<String>) -> Self {
        self.row_ids = Some(row_ids);
        self
    }

    pub fn without_version_commit(mut self) -> Self {
        self.commit_version = false;
        self
    }
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            row_ids: None,
            commit_version: true,
        }
    }
}
