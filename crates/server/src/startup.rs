use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::errors::StartupError;
use crate::routes::{self, auth};
use service::store;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    let raw = format!("{}:{}", cfg.server.host, cfg.server.port);
    raw.parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {raw}: {e}")))
}

/// Connect the configured store and assemble the shared request state.
pub async fn build_state(cfg: &AppConfig) -> Result<auth::ServerState, StartupError> {
    let store = store::connect(&cfg.store).await?;
    Ok(auth::ServerState::new(
        store,
        auth::ServerAuthConfig { jwt_secret: cfg.auth.jwt_secret.clone() },
        cfg.shop.order_phone.clone(),
    ))
}

/// Public entry: build the app and run the HTTP server until it fails.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = bind_addr(&cfg)?;
    let state = build_state(&cfg).await?;
    let app: Router = routes::build_router(state, build_cors());

    info!(%addr, backend = ?cfg.store.backend, "starting planet bank server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
