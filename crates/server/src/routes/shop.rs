use axum::{
    extract::{Path, State},
    Json,
};
use models::CatalogItem;
use serde::Serialize;

use super::auth::ServerState;
use crate::errors::ApiError;

/// A catalog entry with what a shop card needs to render and order it.
#[derive(Debug, Serialize)]
pub struct ShopListing {
    #[serde(flatten)]
    pub entry: CatalogItem,
    /// Cover box height as a percentage of its width.
    pub padding_percent: f64,
    pub order_link: String,
}

#[derive(Debug, Serialize)]
pub struct OrderLink {
    pub url: String,
}

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<ShopListing>>, ApiError> {
    let items = state.catalog.list().await?;
    let listings = items
        .into_iter()
        .map(|entry| ShopListing {
            padding_percent: entry.item.aspect_padding_percent(),
            order_link: entry.item.order_link(&state.order_phone),
            entry,
        })
        .collect();
    Ok(Json(listings))
}

pub async fn order_link(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<OrderLink>, ApiError> {
    let url = state.catalog.order_link(&id, &state.order_phone).await?;
    Ok(Json(OrderLink { url }))
}
