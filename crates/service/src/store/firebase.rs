use std::time::Duration;

use async_trait::async_trait;
use models::RecordPath;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::RecordStore;
use crate::errors::StoreError;

/// Realtime Database REST client.
///
/// Every operation is one HTTP round trip against `{base}/{path}.json`:
/// `GET` for fetch, `PATCH` for merge, `PUT` for replace and `DELETE` for
/// remove. Failures are mapped to [`StoreError`] with the server's message
/// attached and are never retried.
#[derive(Debug, Clone)]
pub struct FirebaseStore {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseStore {
    pub fn new(database_url: &str, auth_token: Option<String>, connect_timeout: Duration) -> Result<Self, StoreError> {
        let base_url = database_url.trim().trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| StoreError::Unavailable(format!("invalid database url {base_url:?}: {e}")))?;
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(Self { client, base_url, auth_token })
    }

    fn url(&self, path: &RecordPath) -> String {
        format!("{}/{}.json", self.base_url, path.to_url_path())
    }

    fn request(&self, method: Method, path: &RecordPath) -> RequestBuilder {
        let mut req = self.client.request(method.clone(), self.url(path));
        if let Some(token) = &self.auth_token {
            req = req.query(&[("auth", token.as_str())]);
        }
        if method != Method::GET {
            // skip echoing the written value back
            req = req.query(&[("print", "silent")]);
        }
        req
    }

    async fn send(&self, req: RequestBuilder, write: bool) -> Result<Response, StoreError> {
        let resp = req.send().await.map_err(|e| StoreError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify(status, &body, write))
    }
}

/// Pull the `{"error": "..."}` message out of a failure body, falling back to the raw text.
fn error_message(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if detail.is_empty() { status.to_string() } else { format!("{status}: {detail}") }
}

fn classify(status: StatusCode, body: &str, write: bool) -> StoreError {
    let msg = error_message(status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST if write => {
            StoreError::WriteRejected(msg)
        }
        _ => StoreError::Unavailable(msg),
    }
}

#[async_trait]
impl RecordStore for FirebaseStore {
    #[instrument(skip_all, fields(path = %path))]
    async fn fetch(&self, path: &RecordPath) -> Result<Option<Value>, StoreError> {
        let resp = self.send(self.request(Method::GET, path), false).await?;
        let value: Value = resp.json().await.map_err(|e| StoreError::Malformed(e.to_string()))?;
        debug!(found = !value.is_null(), "firebase fetch");
        Ok(if value.is_null() { None } else { Some(value) })
    }

    #[instrument(skip_all, fields(path = %path, count = fields.len()))]
    async fn merge(&self, path: &RecordPath, fields: Map<String, Value>) -> Result<(), StoreError> {
        self.send(self.request(Method::PATCH, path).json(&fields), true).await?;
        debug!("firebase merge");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn replace(&self, path: &RecordPath, record: Value) -> Result<(), StoreError> {
        self.send(self.request(Method::PUT, path).json(&record), true).await?;
        debug!("firebase replace");
        Ok(())
    }

    #[instrument(skip_all, fields(path = %path))]
    async fn remove(&self, path: &RecordPath) -> Result<(), StoreError> {
        self.send(self.request(Method::DELETE, path), true).await?;
        debug!("firebase remove");
        Ok(())
    }
}
