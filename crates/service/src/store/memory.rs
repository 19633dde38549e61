use async_trait::async_trait;
use models::RecordPath;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::debug;

use super::{tree, RecordStore};
use crate::errors::StoreError;

/// Injected failures, for exercising error paths without a network.
#[derive(Debug, Default, Clone)]
struct Faults {
    unavailable: bool,
    reject_under: Vec<String>,
}

impl Faults {
    fn rejects(&self, path: &RecordPath) -> bool {
        let path = path.to_string();
        self.reject_under
            .iter()
            .any(|prefix| path == *prefix || path.starts_with(&format!("{prefix}/")))
    }
}

/// In-process store holding the whole tree in one JSON value.
///
/// Each operation takes the lock once, so writes to the same path never
/// interleave: concurrent merges apply one after another, last writer wins.
#[derive(Debug)]
pub struct MemoryStore {
    root: RwLock<Value>,
    faults: RwLock<Faults>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_data(Value::Object(Map::new()))
    }
}

impl MemoryStore {
    /// Start from an existing tree, e.g. a seeded fixture.
    pub fn with_data(root: Value) -> Self {
        let root = if root.is_object() { root } else { Value::Object(Map::new()) };
        Self { root: RwLock::new(root), faults: RwLock::new(Faults::default()) }
    }

    /// Copy of the whole tree.
    pub async fn snapshot(&self) -> Value {
        self.root.read().await.clone()
    }

    /// Make every operation fail with `Unavailable` until switched back.
    pub async fn set_unavailable(&self, on: bool) {
        self.faults.write().await.unavailable = on;
    }

    /// Reject writes at or below `prefix` with `WriteRejected`.
    pub async fn reject_writes_under(&self, prefix: &str) {
        self.faults.write().await.reject_under.push(prefix.trim_matches('/').to_string());
    }

    async fn check(&self, path: &RecordPath, write: bool) -> Result<(), StoreError> {
        let faults = self.faults.read().await;
        if faults.unavailable {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        if write && faults.rejects(path) {
            return Err(StoreError::WriteRejected(format!("permission denied at {path}")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch(&self, path: &RecordPath) -> Result<Option<Value>, StoreError> {
        self.check(path, false).await?;
        let root = self.root.read().await;
        Ok(tree::get(&root, path).cloned())
    }

    async fn merge(&self, path: &RecordPath, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.check(path, true).await?;
        debug!(%path, fields = fields.len(), "memory merge");
        let mut root = self.root.write().await;
        tree::merge(&mut root, path, fields)
    }

    async fn replace(&self, path: &RecordPath, record: Value) -> Result<(), StoreError> {
        self.check(path, true).await?;
        debug!(%path, "memory replace");
        let mut root = self.root.write().await;
        tree::replace(&mut root, path, record);
        Ok(())
    }

    async fn remove(&self, path: &RecordPath) -> Result<(), StoreError> {
        self.check(path, true).await?;
        debug!(%path, "memory remove");
        let mut root = self.root.write().await;
        tree::remove(&mut root, path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use serde_json::json;

    fn p(s: &str) -> RecordPath {
        RecordPath::parse(s).unwrap()
    }

    fn fields(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn never_written_path_is_absent() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        assert_eq!(store.fetch(&p("planets/mars/nobody")).await?, None);
        assert_eq!(store.fetch(&p("admins")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn merge_preserves_fields() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        store.merge(&p("x/y"), fields(json!({ "a": 1 }))).await?;
        store.merge(&p("x/y"), fields(json!({ "b": 2 }))).await?;
        assert_eq!(store.fetch(&p("x/y")).await?, Some(json!({ "a": 1, "b": 2 })));
        Ok(())
    }

    #[tokio::test]
    async fn replace_overwrites() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        store.replace(&p("x/y"), json!({ "a": 1 })).await?;
        store.replace(&p("x/y"), json!({ "b": 2 })).await?;
        assert_eq!(store.fetch(&p("x/y")).await?, Some(json!({ "b": 2 })));
        Ok(())
    }

    #[tokio::test]
    async fn remove_then_fetch_absent_and_idempotent() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        store.replace(&p("x/y"), json!({ "a": 1 })).await?;
        store.remove(&p("x/y")).await?;
        assert_eq!(store.fetch(&p("x/y")).await?, None);
        store.remove(&p("x/y")).await?;
        store.remove(&p("never/there")).await?;
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_fails_every_operation() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        store.set_unavailable(true).await;
        assert!(matches!(store.fetch(&p("a")).await, Err(StoreError::Unavailable(_))));
        assert!(matches!(store.remove(&p("a")).await, Err(StoreError::Unavailable(_))));
        store.set_unavailable(false).await;
        assert_eq!(store.fetch(&p("a")).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_prefix_only_blocks_writes_below_it() -> Result<(), anyhow::Error> {
        let store = MemoryStore::default();
        store.reject_writes_under("planets/mars/locked").await;
        let err = store.merge(&p("planets/mars/locked"), fields(json!({ "a": 1 }))).await.unwrap_err();
        assert!(matches!(err, StoreError::WriteRejected(_)));
        store.merge(&p("planets/mars/lockedout"), fields(json!({ "a": 1 }))).await?;
        assert!(store.fetch(&p("planets/mars/locked")).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_merges_to_one_path_do_not_interleave() -> Result<(), anyhow::Error> {
        let store = Arc::new(MemoryStore::default());
        let path = p("planets/mars/ali");
        let mut tasks = tokio::task::JoinSet::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            let path = path.clone();
            tasks.spawn(async move {
                let mut body = fields(json!({ "balance": i.to_string(), "warnings": i.to_string() }));
                body.insert(format!("k{i}"), json!(true));
                store.merge(&path, body).await
            });
        }
        while let Some(res) = tasks.join_next().await {
            res??;
        }
        let rec = store.fetch(&path).await?.unwrap();
        // both fields come from the same (last applied) write
        assert_eq!(rec["balance"], rec["warnings"]);
        for i in 0..32 {
            assert_eq!(rec[format!("k{i}")], json!(true));
        }
        Ok(())
    }
}
