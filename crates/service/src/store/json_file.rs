use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use models::RecordPath;
use serde_json::{Map, Value};
use tokio::{fs, sync::RwLock};
use tracing::debug;

use super::{tree, RecordStore};
use crate::errors::StoreError;

/// JSON file-backed record tree.
///
/// Persists the whole tree to one file after every write. Intended for local
/// development where the hosted database is not reachable.
#[derive(Debug)]
pub struct JsonFileStore {
    inner: RwLock<Value>,
    file_path: PathBuf,
}

fn io_err(e: impl std::fmt::Display) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

impl JsonFileStore {
    /// Open the store at `path`. Creates the file with an empty tree if missing.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Result<Arc<Self>, StoreError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).await.ok();
        }

        let root: Value = match fs::read(&file_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| StoreError::Malformed(e.to_string()))?,
            Err(_) => {
                let empty = Value::Object(Map::new());
                fs::write(&file_path, serde_json::to_vec(&empty).map_err(io_err)?)
                    .await
                    .map_err(io_err)?;
                empty
            }
        };
        let root = if root.is_object() { root } else { Value::Object(Map::new()) };

        Ok(Arc::new(Self { inner: RwLock::new(root), file_path }))
    }

    /// Apply a mutation to the tree and persist it while still holding the lock,
    /// so the file always reflects writes in the order they were applied.
    async fn update_tree<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Value) -> Result<(), StoreError>,
    {
        let mut root = self.inner.write().await;
        let mut next = root.clone();
        f(&mut next)?;
        let data = serde_json::to_vec(&next).map_err(io_err)?;
        fs::write(&self.file_path, data).await.map_err(io_err)?;
        *root = next;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn fetch(&self, path: &RecordPath) -> Result<Option<Value>, StoreError> {
        let root = self.inner.read().await;
        Ok(tree::get(&root, path).cloned())
    }

    async fn merge(&self, path: &RecordPath, fields: Map<String, Value>) -> Result<(), StoreError> {
        debug!(%path, file = %self.file_path.display(), "file merge");
        self.update_tree(|root| tree::merge(root, path, fields)).await
    }

    async fn replace(&self, path: &RecordPath, record: Value) -> Result<(), StoreError> {
        debug!(%path, file = %self.file_path.display(), "file replace");
        self.update_tree(|root| {
            tree::replace(root, path, record);
            Ok(())
        })
        .await
    }

    async fn remove(&self, path: &RecordPath) -> Result<(), StoreError> {
        debug!(%path, file = %self.file_path.display(), "file remove");
        self.update_tree(|root| {
            tree::remove(root, path);
            Ok(())
        })
        .await
    }
}
