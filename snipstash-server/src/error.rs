//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use snipstash_core::{Missing, StoreError};
use thiserror::Error;

/// Errors a handler can answer with. Rendered as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 400: a required field is missing or the body isn't valid JSON
    #[error("{0}")]
    BadRequest(String),

    /// 404: nothing active for the owner or id
    #[error("{0}")]
    NotFound(&'static str),

    /// 401: admin key mismatch
    #[error("Unauthorized")]
    Unauthorized,

    /// 413: request body over the size limit
    #[error("{0}")]
    PayloadTooLarge(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidArgument(message) => ApiError::BadRequest(message),
            StoreError::NotFound(Missing::Owner) => ApiError::NotFound("No code found for this name"),
            StoreError::NotFound(Missing::ActiveSnippets) => {
                ApiError::NotFound("No active code found for this name")
            }
            StoreError::NotFound(Missing::Snippet) => ApiError::NotFound("Snippet not found or expired"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => ApiError::PayloadTooLarge(rejection.body_text()),
            _ => ApiError::BadRequest(rejection.body_text()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
