//! Bounded waits for entries that arrive through replication.
//!
//! A row or cell written by another client shows up locally only once its
//! update has been imported. Callers that expect an entry poll for it here
//! instead of blocking indefinitely.

use loro::LoroMap;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;
use tracing::debug;

use crate::config::ReadinessConfig;
use crate::schema::{CELLS, LoroMapExt, ROW};
use crate::sync::ReplicatedDoc;

/// Anything that can answer "is `key` present right now?".
pub trait EntryProbe {
    fn contains_entry(&self, key: &str) -> bool;
}

impl EntryProbe for LoroMap {
    fn contains_entry(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

impl<V, S: BuildHasher> EntryProbe for HashMap<String, V, S> {
    fn contains_entry(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

impl<V> EntryProbe for BTreeMap<String, V> {
    fn contains_entry(&self, key: &str) -> bool {
        self.contains_key(key)
    }
}

impl<T: EntryProbe + ?Sized> EntryProbe for Arc<T> {
    fn contains_entry(&self, key: &str) -> bool {
        (**self).contains_entry(key)
    }
}

/// Poll `container` for `key`.
///
/// Checks immediately, then once per `config.interval`, for at most
/// `config.max_attempts` checks. Returns `true` on the first check that finds
/// the key and `false` once the attempts are used up. A `None` container
/// never has the key: the full budget is spent and the result is `false`.
pub async fn wait_for_entry<C>(container: Option<&C>, key: &str, config: &ReadinessConfig) -> bool
where
    C: EntryProbe + ?Sized,
{
    for attempt in 1..=config.max_attempts {
        if container.is_some_and(|c| c.contains_entry(key)) {
            debug!("Entry '{}' present after {} attempt(s)", key, attempt);
            return true;
        }
        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }
    debug!(
        "Entry '{}' still missing after {} attempt(s)",
        key, config.max_attempts
    );
    false
}

/// Wait until a row document holds a cell for `field_id`.
///
/// The cells container is looked up once, when the wait starts. If the row
/// has not replicated its cells map yet, the wait runs out and the caller is
/// expected to retry with a fresh call.
pub async fn wait_for_cell(row: &ReplicatedDoc, field_id: &str, config: &ReadinessConfig) -> bool {
    let cells = row
        .with_read(|d| Ok(d.get_map(ROW).child_map(CELLS)))
        .await
        .ok()
        .flatten();
    wait_for_entry(cells.as_ref(), field_id, config).await
}
