use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use service::{AllowListGate, SessionContext, SharedStore, ShopCatalog, UserDirectory};
use tracing::debug;

use crate::errors::ApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerAuthConfig {
    pub jwt_secret: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub directory: UserDirectory,
    pub catalog: ShopCatalog,
    pub gate: AllowListGate,
    pub auth: ServerAuthConfig,
    pub order_phone: String,
}

impl ServerState {
    /// Every component shares the one store handle.
    pub fn new(store: SharedStore, auth: ServerAuthConfig, order_phone: impl Into<String>) -> Self {
        Self {
            directory: UserDirectory::new(store.clone()),
            catalog: ShopCatalog::new(store.clone()),
            gate: AllowListGate::new(store),
            auth,
            order_phone: order_phone.into(),
        }
    }
}

/// Identity token claims. `uid` wins over `sub` when both are present.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    pub exp: usize,
}

impl Claims {
    pub fn identity_id(&self) -> Option<&str> {
        [self.uid.as_deref(), self.sub.as_deref()]
            .into_iter()
            .flatten()
            .find(|id| !id.trim().is_empty())
    }
}

/// Verify an HS256 token and return its identity id. Bad or expired tokens
/// yield `None`, which the caller treats as signed out.
pub fn decode_identity(token: &str, secret: &str) -> Option<String> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    match decode::<Claims>(token, &key, &Validation::new(Algorithm::HS256)) {
        Ok(data) => data.claims.identity_id().map(str::to_string),
        Err(e) => {
            debug!(error = %e, "identity token rejected");
            None
        }
    }
}

// Authorization: Bearer 优先，其次 auth_token cookie
fn request_token(req: &Request, jar: &CookieJar) -> Option<String> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());
    bearer.or_else(|| jar.get(AUTH_COOKIE).map(|c| c.value().to_string()))
}

/// Resolve the caller's `SessionContext` through the allow-list and attach it
/// to the request. Runs for every admin route, including `/admin/session`.
pub async fn resolve_session(
    State(state): State<ServerState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = request_token(&req, &jar).and_then(|t| decode_identity(&t, &state.auth.jwt_secret));
    let session = SessionContext::resolve(&state.gate, identity.as_deref()).await;
    debug!(identity = ?session.identity_id(), admin = session.is_admin(), "session resolved");
    req.extensions_mut().insert(session);
    next.run(req).await
}

/// 401 without an identity, 403 when the identity is not on the allow-list.
pub async fn require_admin(
    Extension(session): Extension<SessionContext>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !session.is_authenticated() {
        return Err(ApiError::Unauthorized);
    }
    if !session.is_admin() {
        return Err(ApiError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// What the console shows before deciding to render admin content.
pub async fn session(Extension(session): Extension<SessionContext>) -> Json<SessionContext> {
    Json(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn token(claims: &Claims, secret: &str) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn far_future() -> usize { 4_102_444_800 }

    #[test]
    fn uid_preferred_over_sub() {
        let t = token(&Claims { uid: Some("u1".into()), sub: Some("s1".into()), exp: far_future() }, "k");
        assert_eq!(decode_identity(&t, "k").as_deref(), Some("u1"));
        let t = token(&Claims { uid: None, sub: Some("s1".into()), exp: far_future() }, "k");
        assert_eq!(decode_identity(&t, "k").as_deref(), Some("s1"));
        let t = token(&Claims { uid: Some(" ".into()), sub: Some("s1".into()), exp: far_future() }, "k");
        assert_eq!(decode_identity(&t, "k").as_deref(), Some("s1"));
    }

    #[test]
    fn bad_tokens_mean_signed_out() {
        let t = token(&Claims { uid: Some("u1".into()), sub: None, exp: far_future() }, "k");
        assert_eq!(decode_identity(&t, "other"), None);
        assert_eq!(decode_identity("not-a-jwt", "k"), None);
        let expired = token(&Claims { uid: Some("u1".into()), sub: None, exp: 1_000 }, "k");
        assert_eq!(decode_identity(&expired, "k"), None);
        let anonymous = token(&Claims { uid: None, sub: None, exp: far_future() }, "k");
        assert_eq!(decode_identity(&anonymous, "k"), None);
    }
}
