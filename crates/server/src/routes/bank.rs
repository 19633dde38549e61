use axum::{
    extract::{Path, State},
    Json,
};
use models::{planet::is_public_planet, user::sanitize_nickname};
use serde::Serialize;
use tracing::info;

use super::auth::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Serialize)]
pub struct BankField {
    pub name: &'static str,
    pub value: String,
}

/// The public bank card for one nickname.
#[derive(Debug, Serialize)]
pub struct BankCard {
    pub planet: String,
    pub nickname: String,
    pub fields: Vec<BankField>,
}

/// Public lookup. The nickname is reduced to Arabic letters and spaces first;
/// only the public planets can be searched.
pub async fn lookup(
    State(state): State<ServerState>,
    Path((planet, nickname)): Path<(String, String)>,
) -> Result<Json<BankCard>, ApiError> {
    let planet = planet.trim().to_lowercase();
    let nickname = sanitize_nickname(&nickname).trim().to_string();
    if nickname.is_empty() || !is_public_planet(&planet) {
        return Err(ApiError::validation("Please enter a nickname and select a planet"));
    }

    let user = state
        .directory
        .lookup(&planet, &nickname)
        .await?
        .ok_or_else(|| ApiError::not_found("No data found for this nickname and planet"))?;
    info!(%planet, "bank card served");

    let fields = user
        .public_fields()
        .into_iter()
        .map(|(name, value)| BankField { name, value })
        .collect();
    Ok(Json(BankCard { planet, nickname, fields }))
}
