//! Best-effort batches of independent writes.
//!
//! A batch is N unrelated merges issued concurrently. There is no atomicity
//! and no rollback: each write succeeds or fails on its own and the outcome
//! reports every item, so callers can show partial results.

use std::sync::Arc;

use models::RecordPath;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::task::JoinSet;
use tracing::warn;

use crate::store::SharedStore;

/// Result of one item in a batch. `index` is the item's position in the
/// caller's input (for bulk import, its 1-based line number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub index: usize,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ItemOutcome {
    pub fn ok(index: usize, key: impl Into<String>) -> Self {
        Self { index, key: key.into(), error: None }
    }

    pub fn failed(index: usize, key: impl Into<String>, error: impl Into<String>) -> Self {
        Self { index, key: key.into(), error: Some(error.into()) }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-item results of a batch, ordered by `index`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    pub items: Vec<ItemOutcome>,
}

impl BatchOutcome {
    pub fn from_items(mut items: Vec<ItemOutcome>) -> Self {
        items.sort_by_key(|i| i.index);
        Self { items }
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|i| i.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }

    /// True only when every item was written.
    pub fn is_complete_success(&self) -> bool {
        self.items.iter().all(ItemOutcome::is_ok)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|i| !i.is_ok())
    }
}

/// One pending merge of a batch.
#[derive(Debug, Clone)]
pub struct BatchWrite {
    pub index: usize,
    pub key: String,
    pub path: RecordPath,
    pub fields: Map<String, Value>,
}

/// Issue every write concurrently and wait for all of them. A failing write
/// neither cancels nor rolls back the others; completion order is unspecified.
pub async fn merge_all(store: &SharedStore, writes: Vec<BatchWrite>) -> Vec<ItemOutcome> {
    let mut pending: Vec<Option<(usize, String)>> = Vec::with_capacity(writes.len());
    let mut set = JoinSet::new();
    for (slot, write) in writes.into_iter().enumerate() {
        pending.push(Some((write.index, write.key.clone())));
        let store = Arc::clone(store);
        set.spawn(async move {
            let outcome = match store.merge(&write.path, write.fields).await {
                Ok(()) => ItemOutcome::ok(write.index, write.key),
                Err(e) => ItemOutcome::failed(write.index, write.key, e.to_string()),
            };
            (slot, outcome)
        });
    }

    let mut outcomes = Vec::with_capacity(pending.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((slot, outcome)) => {
                pending[slot] = None;
                outcomes.push(outcome);
            }
            Err(e) => warn!(error = %e, "batch write task did not complete"),
        }
    }
    // tasks that panicked or were aborted still get reported
    outcomes.extend(
        pending
            .into_iter()
            .flatten()
            .map(|(index, key)| ItemOutcome::failed(index, key, "write task aborted")),
    );
    outcomes
}
