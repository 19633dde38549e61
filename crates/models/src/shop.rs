use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::{errors::ModelError, lenient};

pub const DEFAULT_WIDTH: f64 = 16.0;
pub const DEFAULT_HEIGHT: f64 = 9.0;
const FALLBACK_PADDING_PERCENT: f64 = 75.0;

/// An item stored at `shop/{id}`. The id is the key, not a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ShopItem {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub price: String,
    #[serde(default, deserialize_with = "lenient::string", skip_serializing_if = "String::is_empty")]
    pub cover: String,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A shop item as listed to shoppers: its key plus defaulted dimensions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogItem {
    pub id: String,
    #[serde(flatten)]
    pub item: ShopItem,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShopItemPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
}

fn positive(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite() && *x > 0.0)
}

fn number(v: f64) -> Value {
    Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null)
}

impl ShopItem {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::validation("item name required"));
        }
        Ok(())
    }

    /// Missing or zero dimensions fall back to 16:9.
    pub fn with_default_dimensions(mut self) -> Self {
        self.width = Some(positive(self.width).unwrap_or(DEFAULT_WIDTH));
        self.height = Some(positive(self.height).unwrap_or(DEFAULT_HEIGHT));
        self
    }

    /// Vertical padding that keeps the cover at its aspect ratio.
    pub fn aspect_padding_percent(&self) -> f64 {
        let ratio = match (self.width, self.height) {
            (Some(w), Some(h)) => h / w * 100.0,
            _ => f64::NAN,
        };
        if ratio.is_finite() && ratio != 0.0 { ratio } else { FALLBACK_PADDING_PERCENT }
    }

    /// Order message pre-filled in the WhatsApp chat.
    pub fn order_message(&self) -> String {
        format!(
            "مرحبًا، أود طلب المنتج: {}\n\nتفاصيل المنتج:\n{}\n\nالسعر: {} نجمة",
            self.name, self.description, self.price
        )
    }

    /// `https://wa.me/{phone}?text=...` deep link opening an order chat.
    pub fn order_link(&self, phone: &str) -> String {
        format!("https://wa.me/{}?text={}", phone.trim(), urlencoding::encode(&self.order_message()))
    }

    pub fn into_value(self) -> Value {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(self.name));
        fields.insert("description".into(), Value::String(self.description));
        fields.insert("price".into(), Value::String(self.price));
        if !self.cover.is_empty() {
            fields.insert("cover".into(), Value::String(self.cover));
        }
        if let Some(w) = positive(self.width) {
            fields.insert("width".into(), number(w));
        }
        if let Some(h) = positive(self.height) {
            fields.insert("height".into(), number(h));
        }
        Value::Object(fields)
    }
}

impl CatalogItem {
    /// Build a listing entry from a stored value; non-object values are skipped.
    pub fn from_stored(id: &str, value: Value) -> Option<CatalogItem> {
        if !value.is_object() {
            return None;
        }
        let item: ShopItem = serde_json::from_value(value).ok()?;
        Some(CatalogItem { id: id.to_string(), item: item.with_default_dimensions() })
    }
}

impl ShopItemPatch {
    pub fn into_fields(self) -> Result<Map<String, Value>, ModelError> {
        let mut fields = Map::new();
        if let Some(v) = self.name {
            if v.trim().is_empty() {
                return Err(ModelError::validation("item name required"));
            }
            fields.insert("name".into(), Value::String(v));
        }
        if let Some(v) = self.description {
            fields.insert("description".into(), Value::String(v));
        }
        if let Some(v) = self.price {
            fields.insert("price".into(), Value::String(v));
        }
        if let Some(v) = self.cover {
            fields.insert("cover".into(), Value::String(v));
        }
        if let Some(w) = positive(self.width) {
            fields.insert("width".into(), number(w));
        }
        if let Some(h) = positive(self.height) {
            fields.insert("height".into(), number(h));
        }
        if fields.is_empty() {
            return Err(ModelError::validation("nothing to update"));
        }
        Ok(fields)
    }
}
