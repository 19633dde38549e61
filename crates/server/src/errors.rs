use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use service::{ServiceError, StoreError};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("sign in required")]
    Unauthorized,
    #[error("admin access required")]
    Forbidden,
    #[error("{}", .0.body_text())]
    Body(#[from] JsonRejection),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Service(ServiceError::Validation(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::Service(ServiceError::NotFound(msg.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Service(e) => match e {
                ServiceError::Validation(_) | ServiceError::Model(_) => StatusCode::BAD_REQUEST,
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::Store(StoreError::WriteRejected(_)) => StatusCode::FORBIDDEN,
                ServiceError::Store(StoreError::Unavailable(_) | StoreError::Malformed(_)) => StatusCode::BAD_GATEWAY,
            },
        }
    }

    /// Client-facing message. Validation and not-found carry their text bare.
    fn message(&self) -> String {
        match self {
            ApiError::Service(ServiceError::Validation(m) | ServiceError::NotFound(m)) => m.clone(),
            ApiError::Service(ServiceError::Model(e)) => e.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.message();
        if status.is_server_error() {
            error!(%status, error = %msg, "request failed");
        } else if status == StatusCode::FORBIDDEN {
            warn!(%status, error = %msg, "request refused");
        }
        (status, Json(serde_json::json!({ "error": msg }))).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("store connection failed: {0}")]
    Store(#[from] StoreError),
}
