use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use models::RecordPath;
use serde_json::{json, Map, Value};
use service::{
    store::{FirebaseStore, MemoryStore, RecordStore},
    AllowListGate, StoreError, UserDirectory,
};
use tokio::net::TcpListener;

const TOKEN: &str = "test-secret";

/// Minimal stand-in for the Realtime Database REST API, backed by `MemoryStore`.
/// Anything under `locked/` refuses writes the way security rules would.
async fn node(
    State(mem): State<Arc<MemoryStore>>,
    method: Method,
    Path(raw): Path<String>,
    Query(q): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let denied = (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Permission denied" })));
    if q.get("auth").map(String::as_str) != Some(TOKEN) {
        return denied.into_response();
    }
    let Some(raw) = raw.strip_suffix(".json") else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "missing .json" }))).into_response();
    };
    let Ok(path) = RecordPath::parse(raw) else {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "Invalid path" }))).into_response();
    };
    if method != Method::GET && raw.starts_with("locked") {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "Permission denied" }))).into_response();
    }
    let parsed = || serde_json::from_slice::<Value>(&body).unwrap_or(Value::Null);
    let result = match method {
        Method::GET => mem.fetch(&path).await.map(|v| Json(v.unwrap_or(Value::Null)).into_response()),
        Method::PATCH => {
            let fields: Map<String, Value> = parsed().as_object().cloned().unwrap_or_default();
            mem.merge(&path, fields).await.map(|_| StatusCode::NO_CONTENT.into_response())
        }
        Method::PUT => mem.replace(&path, parsed()).await.map(|_| StatusCode::NO_CONTENT.into_response()),
        Method::DELETE => mem.remove(&path).await.map(|_| StatusCode::NO_CONTENT.into_response()),
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };
    result.unwrap_or_else(|e| (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": e.to_string() }))).into_response())
}

struct Fake {
    base_url: String,
    mem: Arc<MemoryStore>,
}

async fn start_fake(seed: Value) -> anyhow::Result<Fake> {
    let mem = Arc::new(MemoryStore::with_data(seed));
    let app = Router::new().route("/*path", any(node)).with_state(mem.clone());
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr: SocketAddr = listener.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await { eprintln!("fake server error: {}", e); }
    });
    Ok(Fake { base_url: format!("http://{}:{}", addr.ip(), addr.port()), mem })
}

fn client(base_url: &str, token: Option<&str>) -> Arc<FirebaseStore> {
    Arc::new(FirebaseStore::new(base_url, token.map(str::to_string), Duration::from_secs(2)).expect("firebase store"))
}

fn fields(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap_or_default()
}

#[tokio::test]
async fn crud_round_trips_over_rest() -> anyhow::Result<()> {
    let fake = start_fake(json!({})).await?;
    let store = client(&fake.base_url, Some(TOKEN));
    let path = RecordPath::user("mars", "علي")?;

    assert_eq!(store.fetch(&path).await?, None);

    store.merge(&path, fields(json!({ "a": 1 }))).await?;
    store.merge(&path, fields(json!({ "b": 2 }))).await?;
    assert_eq!(store.fetch(&path).await?, Some(json!({ "a": 1, "b": 2 })));

    store.replace(&path, json!({ "c": 3 })).await?;
    assert_eq!(store.fetch(&path).await?, Some(json!({ "c": 3 })));

    store.remove(&path).await?;
    assert_eq!(store.fetch(&path).await?, None);
    store.remove(&path).await?;

    // the unicode key reached the server decoded
    store.merge(&path, fields(json!({ "x": true }))).await?;
    assert_eq!(fake.mem.snapshot().await, json!({ "planets": { "mars": { "علي": { "x": true } } } }));
    Ok(())
}

#[tokio::test]
async fn refused_writes_are_write_rejected() -> anyhow::Result<()> {
    let fake = start_fake(json!({})).await?;
    let store = client(&fake.base_url, Some(TOKEN));
    let err = store.merge(&RecordPath::parse("locked/x")?, fields(json!({ "a": 1 }))).await.unwrap_err();
    assert!(matches!(err, StoreError::WriteRejected(ref m) if m.contains("Permission denied")), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn missing_token_surfaces_remote_message() -> anyhow::Result<()> {
    let fake = start_fake(json!({})).await?;
    let store = client(&fake.base_url, None);
    let read = store.fetch(&RecordPath::parse("shop")?).await.unwrap_err();
    assert!(matches!(read, StoreError::Unavailable(ref m) if m.contains("Permission denied")));
    let write = store.remove(&RecordPath::parse("shop")?).await.unwrap_err();
    assert!(matches!(write, StoreError::WriteRejected(_)));
    Ok(())
}

#[tokio::test]
async fn unreachable_store_is_unavailable() -> anyhow::Result<()> {
    let listener = TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0)).await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let store = client(&format!("http://{}", addr), Some(TOKEN));
    let err = store.fetch(&RecordPath::parse("shop")?).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
    Ok(())
}

#[tokio::test]
async fn gate_over_rest_fails_closed() -> anyhow::Result<()> {
    let fake = start_fake(json!({ "admins": { "boss": { "allowed": true }, "ex": { "allowed": false } } })).await?;
    let gate = AllowListGate::new(client(&fake.base_url, Some(TOKEN)));
    assert!(gate.is_allowed("boss").await);
    assert!(!gate.is_allowed("ex").await);
    assert!(!gate.is_allowed("stranger").await);

    let unauthenticated = AllowListGate::new(client(&fake.base_url, None));
    assert!(!unauthenticated.is_allowed("boss").await);
    Ok(())
}

#[tokio::test]
async fn bulk_import_over_rest() -> anyhow::Result<()> {
    let fake = start_fake(json!({})).await?;
    let dir = UserDirectory::new(client(&fake.base_url, Some(TOKEN)));
    let outcome = dir.import("mars", "ali|100|0|none\nsara|50||").await?;
    assert_eq!(outcome.succeeded(), 2);
    assert_eq!(dir.lookup("mars", "sara").await?.map(|u| u.balance), Some("50".to_string()));
    assert!(dir.lookup("venus", "sara").await?.is_none());
    Ok(())
}
