//! Path-addressed access to the schemaless record store.
//!
//! Every backend implements the same four operations with the same tree
//! semantics (see [`tree`]): `fetch` reports absence as `None`, `merge`
//! preserves fields it does not name, `replace` discards them, and `remove`
//! succeeds on an absent path. Nothing here retries or spans multiple paths.

pub mod firebase;
pub mod json_file;
pub mod memory;
pub mod tree;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use configs::{StoreBackend, StoreConfig};
use models::RecordPath;
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::StoreError;

pub use firebase::FirebaseStore;
pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Trait abstraction for the hosted key-path database.
/// Implementations can be in-memory, file-backed, or remote.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Value at `path`, or `None` when nothing is stored there.
    async fn fetch(&self, path: &RecordPath) -> Result<Option<Value>, StoreError>;
    /// Write the named fields, keeping siblings. Creates the path if needed.
    async fn merge(&self, path: &RecordPath, fields: Map<String, Value>) -> Result<(), StoreError>;
    /// Overwrite the whole value at `path`.
    async fn replace(&self, path: &RecordPath, record: Value) -> Result<(), StoreError>;
    /// Delete the value at `path`; a no-op when already absent.
    async fn remove(&self, path: &RecordPath) -> Result<(), StoreError>;
}

/// One connection handle shared by the gate, directory and catalog.
pub type SharedStore = Arc<dyn RecordStore>;

/// Open the backend named in the configuration.
pub async fn connect(cfg: &StoreConfig) -> Result<SharedStore, StoreError> {
    let store: SharedStore = match cfg.backend {
        StoreBackend::Firebase => {
            let token = Some(cfg.auth_token.trim().to_string()).filter(|t| !t.is_empty());
            let store = FirebaseStore::new(
                &cfg.database_url,
                token,
                Duration::from_secs(cfg.connect_timeout_secs),
            )?;
            info!(url = %cfg.database_url, "using firebase record store");
            Arc::new(store)
        }
        StoreBackend::File => {
            common::env::ensure_data_dir(&cfg.data_file)
                .await
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            info!(file = %cfg.data_file, "using file record store");
            JsonFileStore::open(&cfg.data_file).await?
        }
        StoreBackend::Memory => {
            info!("using in-memory record store");
            Arc::new(MemoryStore::default())
        }
    };
    Ok(store)
}
