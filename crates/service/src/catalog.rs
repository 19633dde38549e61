use models::{CatalogItem, RecordPath, ShopItem, ShopItemPatch};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{errors::ServiceError, store::SharedStore};

/// Shop items stored under `shop/{id}`.
#[derive(Clone)]
pub struct ShopCatalog {
    store: SharedStore,
}

impl ShopCatalog {
    pub fn new(store: SharedStore) -> Self { Self { store } }

    /// All items, sorted by id, with display dimensions defaulted.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<CatalogItem>, ServiceError> {
        let Some(serde_json::Value::Object(items)) = self.store.fetch(&RecordPath::shop()).await? else {
            return Ok(Vec::new());
        };
        let mut out: Vec<CatalogItem> = items
            .into_iter()
            .filter_map(|(id, value)| CatalogItem::from_stored(&id, value))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<CatalogItem>, ServiceError> {
        let path = RecordPath::shop_item(id.trim())?;
        let found = self.store.fetch(&path).await?;
        Ok(found.and_then(|v| CatalogItem::from_stored(path.leaf(), v)))
    }

    /// Store a new item, replacing anything at its id. A fresh id is generated
    /// when none is given.
    #[instrument(skip(self, item), fields(name = %item.name))]
    pub async fn add(&self, id: Option<String>, item: ShopItem) -> Result<CatalogItem, ServiceError> {
        item.validate()?;
        let id = id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let path = RecordPath::shop_item(&id)?;
        self.store.replace(&path, item.clone().into_value()).await?;
        info!(%path, "shop item added");
        Ok(CatalogItem { id, item: item.with_default_dimensions() })
    }

    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: ShopItemPatch) -> Result<(), ServiceError> {
        let path = RecordPath::shop_item(id.trim())?;
        self.store.merge(&path, patch.into_fields()?).await?;
        info!(%path, "shop item updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let path = RecordPath::shop_item(id.trim())?;
        self.store.remove(&path).await?;
        info!(%path, "shop item deleted");
        Ok(())
    }

    /// WhatsApp order link for one item.
    pub async fn order_link(&self, id: &str, phone: &str) -> Result<String, ServiceError> {
        let entry = self.get(id).await?.ok_or_else(|| ServiceError::not_found("shop item"))?;
        Ok(entry.item.order_link(phone))
    }
}
