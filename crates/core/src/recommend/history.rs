//! Per-customer recommendation history

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ApplicationError;

/// One item shown to a customer at a point in time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub item_name: String,
    pub recommended_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(item_name: impl Into<String>, recommended_at: DateTime<Utc>) -> Self {
        Self { item_name: item_name.into(), recommended_at }
    }
}

/// Append-only log of recommendations, keyed by customer id.
///
/// Customers are created lazily by the first `append`. Entries are only ever
/// removed by `prune`.
pub trait HistoryStore: Send + Sync {
    /// Entries recorded at or after `since`, oldest first.
    fn get_recent(
        &self,
        customer_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, ApplicationError>;

    fn append(&self, customer_id: &str, entries: &[HistoryEntry]) -> Result<(), ApplicationError>;

    /// Drop entries recorded at or before `cutoff`; returns how many were removed.
    fn prune(&self, customer_id: &str, cutoff: DateTime<Utc>) -> Result<usize, ApplicationError>;
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    entries: RwLock<HashMap<String, Vec<HistoryEntry>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of customers with at least one recorded batch.
    pub fn customer_count(&self) -> Result<usize, ApplicationError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.len())
    }
}

fn poisoned() -> ApplicationError {
    ApplicationError::HistoryStore("history lock poisoned by a panicked writer".to_string())
}

impl HistoryStore for InMemoryHistoryStore {
    fn get_recent(
        &self,
        customer_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<HistoryEntry>, ApplicationError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .get(customer_id)
            .map(|log| log.iter().filter(|entry| entry.recommended_at >= since).cloned().collect())
            .unwrap_or_default())
    }

    fn append(&self, customer_id: &str, new_entries: &[HistoryEntry]) -> Result<(), ApplicationError> {
        if new_entries.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.entry(customer_id.to_string()).or_default().extend_from_slice(new_entries);
        Ok(())
    }

    fn prune(&self, customer_id: &str, cutoff: DateTime<Utc>) -> Result<usize, ApplicationError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let Some(log) = entries.get_mut(customer_id) else {
            return Ok(0);
        };

        let before = log.len();
        log.retain(|entry| entry.recommended_at > cutoff);
        let removed = before - log.len();

        if removed > 0 {
            debug!(
                event_name = "history.pruned",
                customer_id = %customer_id,
                removed,
                retained = log.len(),
                "pruned expired recommendation history"
            );
        }
        Ok(removed)
    }
}
