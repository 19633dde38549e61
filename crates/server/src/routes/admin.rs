use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use axum_extra::extract::WithRejection;
use models::{CatalogItem, NewUser, PlanetCollection, ShopItem, ShopItemPatch, UserPatch, UserRecord};
use serde::{Deserialize, Serialize};
use service::{BatchOutcome, SessionContext};
use tracing::info;

use super::auth::ServerState;
use crate::errors::ApiError;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub succeeded: usize,
    pub failed: usize,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

#[derive(Debug, Deserialize)]
pub struct NewShopItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub item: ShopItem,
}

fn actor(session: &SessionContext) -> &str {
    session.identity_id().unwrap_or("-")
}

pub async fn list_planets(State(state): State<ServerState>) -> Result<Json<Vec<PlanetCollection>>, ApiError> {
    Ok(Json(state.directory.list_planets().await?))
}

pub async fn get_user(
    State(state): State<ServerState>,
    Path((planet, username)): Path<(String, String)>,
) -> Result<Json<UserRecord>, ApiError> {
    state
        .directory
        .lookup(&planet, &username)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("No user found with this nickname"))
}

pub async fn add_user(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path(planet): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<NewUser>, ApiError>,
) -> Result<(StatusCode, Json<UserRecord>), ApiError> {
    let record = state.directory.add_user(&planet, input).await?;
    info!(actor = actor(&session), %planet, username = %record.username, "admin added user");
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn update_user(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path((planet, username)): Path<(String, String)>,
    WithRejection(Json(patch), _): WithRejection<Json<UserPatch>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.directory.update_user(&planet, &username, patch).await?;
    info!(actor = actor(&session), %planet, %username, "admin updated user");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_user(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path((planet, username)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    state.directory.delete_user(&planet, &username).await?;
    info!(actor = actor(&session), %planet, %username, "admin deleted user");
    Ok(StatusCode::NO_CONTENT)
}

/// 200 when every line landed, 207 with the per-line report otherwise.
pub async fn import(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path(planet): Path<String>,
    WithRejection(Json(req), _): WithRejection<Json<ImportRequest>, ApiError>,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let outcome = state.directory.import(&planet, &req.text).await?;
    let status = if outcome.is_complete_success() { StatusCode::OK } else { StatusCode::MULTI_STATUS };
    info!(actor = actor(&session), %planet, succeeded = outcome.succeeded(), failed = outcome.failed(), "admin import");
    Ok((
        status,
        Json(ImportResponse { succeeded: outcome.succeeded(), failed: outcome.failed(), outcome }),
    ))
}

pub async fn add_item(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    WithRejection(Json(input), _): WithRejection<Json<NewShopItem>, ApiError>,
) -> Result<(StatusCode, Json<CatalogItem>), ApiError> {
    let added = state.catalog.add(input.id, input.item).await?;
    info!(actor = actor(&session), id = %added.id, "admin added shop item");
    Ok((StatusCode::CREATED, Json(added)))
}

pub async fn update_item(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    WithRejection(Json(patch), _): WithRejection<Json<ShopItemPatch>, ApiError>,
) -> Result<StatusCode, ApiError> {
    state.catalog.update(&id, patch).await?;
    info!(actor = actor(&session), %id, "admin updated shop item");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_item(
    State(state): State<ServerState>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.catalog.delete(&id).await?;
    info!(actor = actor(&session), %id, "admin deleted shop item");
    Ok(StatusCode::NO_CONTENT)
}
