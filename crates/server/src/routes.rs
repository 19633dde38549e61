pub mod admin;
pub mod auth;
pub mod bank;
pub mod shop;

use axum::{
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use common::types::Health;

use self::auth::ServerState;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the full application router: public bank and shop, then the admin
/// console behind the allow-list.
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/bank/:planet/:nickname", get(bank::lookup))
        .route("/api/shop", get(shop::list))
        .route("/api/shop/:id/order-link", get(shop::order_link));

    // 仅限 allow-list 中的管理员
    let admin_only = Router::new()
        .route("/admin/planets", get(admin::list_planets))
        .route("/admin/planets/:planet/users", post(admin::add_user))
        .route(
            "/admin/planets/:planet/users/:username",
            get(admin::get_user).patch(admin::update_user).delete(admin::delete_user),
        )
        .route("/admin/planets/:planet/import", post(admin::import))
        .route("/admin/shop", post(admin::add_item))
        .route("/admin/shop/:id", patch(admin::update_item).delete(admin::delete_item))
        .route_layer(middleware::from_fn(auth::require_admin));

    // 会话解析在外层，先于 require_admin 执行
    let admin = Router::new()
        .route("/admin/session", get(auth::session))
        .merge(admin_only)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::resolve_session));

    public
        .merge(admin)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
