use models::{AdminEntry, RecordPath};
use tracing::{debug, instrument, warn};

use crate::store::SharedStore;

/// Answers "may this identity see admin content?" from `admins/{identity}`.
///
/// Fail-closed: a missing entry, an `allowed` that is not literally `true`,
/// an unusable identity id or a store failure all deny. Store errors are
/// logged and never reach the caller. Nothing is cached; every call fetches.
#[derive(Clone)]
pub struct AllowListGate {
    store: SharedStore,
}

impl AllowListGate {
    pub fn new(store: SharedStore) -> Self { Self { store } }

    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::{store::MemoryStore, AllowListGate};
    /// let store = Arc::new(MemoryStore::with_data(serde_json::json!({ "admins": { "u1": { "allowed": true } } })));
    /// let gate = AllowListGate::new(store);
    /// assert!(tokio_test::block_on(gate.is_allowed("u1")));
    /// assert!(!tokio_test::block_on(gate.is_allowed("u2")));
    /// ```
    #[instrument(skip(self))]
    pub async fn is_allowed(&self, identity_id: &str) -> bool {
        if identity_id.trim().is_empty() {
            warn!("blank identity id; denying");
            return false;
        }
        // ids are opaque: looked up exactly as given
        let path = match RecordPath::admin(identity_id) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "unusable identity id; denying");
                return false;
            }
        };
        match self.store.fetch(&path).await {
            Ok(Some(entry)) => {
                let allowed = AdminEntry::grants_access(&entry);
                debug!(allowed, "allow-list entry found");
                allowed
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "allow-list lookup failed; denying");
                false
            }
        }
    }
}
