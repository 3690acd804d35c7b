use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use snipstash_core::{truncate_for_log, AdminSnapshot, InsertedSnippet, Snippet, SnippetStore};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::admin_key_matches;
use crate::error::ApiError;

/// Maximum accepted request body (50 MiB)
const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    store: SnippetStore,
    admin_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(store: SnippetStore, admin_key: Option<String>) -> Self {
        Self {
            store,
            admin_key: admin_key.map(Arc::from),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasteRequest {
    name: Option<String>,
    code: Option<String>,
    language: Option<String>,
    /// Lifetime in milliseconds
    expires_in: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ViewRequest {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminRequest {
    admin_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ViewResponse {
    snippets: Vec<Snippet>,
}

/// Treats an absent field and an empty string alike
fn required(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.is_empty())
}

/// Builds the application router with CORS, tracing and the body limit applied.
pub fn router(state: AppState, cors_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(cors_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_credentials(true);

    Router::new()
        .route("/api/paste", post(paste))
        .route("/api/view", post(view))
        .route("/api/view/:snippet_id", post(view_one))
        .route("/api/admin", post(admin))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn paste(
    State(state): State<AppState>,
    payload: Result<Json<PasteRequest>, JsonRejection>,
) -> Result<Json<InsertedSnippet>, ApiError> {
    let Json(req) = payload?;
    let (Some(name), Some(code)) = (required(req.name), required(req.code)) else {
        return Err(ApiError::BadRequest("Name and code are required".into()));
    };

    tracing::debug!(
        "PASTE {} (language: {:?}, expires_in: {:?}ms)",
        truncate_for_log(&name),
        req.language,
        req.expires_in
    );

    let ttl = req.expires_in.map(Duration::from_millis);
    let inserted = state
        .store
        .insert(&name, &code, req.language.as_deref(), ttl)?;

    Ok(Json(inserted))
}

async fn view(
    State(state): State<AppState>,
    payload: Result<Json<ViewRequest>, JsonRejection>,
) -> Result<Json<ViewResponse>, ApiError> {
    let Json(req) = payload?;
    let Some(name) = required(req.name) else {
        return Err(ApiError::BadRequest("Name is required".into()));
    };
    tracing::debug!("VIEW {}", truncate_for_log(&name));

    let snippets = state.store.list_active(&name)?;
    Ok(Json(ViewResponse { snippets }))
}

async fn view_one(
    State(state): State<AppState>,
    Path(snippet_id): Path<String>,
    payload: Result<Json<ViewRequest>, JsonRejection>,
) -> Result<Json<Snippet>, ApiError> {
    let Json(req) = payload?;
    let (Some(name), false) = (required(req.name), snippet_id.is_empty()) else {
        return Err(ApiError::BadRequest("Name and snippet ID are required".into()));
    };
    tracing::debug!("VIEW {} / {}", truncate_for_log(&name), snippet_id);

    let snippet = state.store.get_by_id(&name, &snippet_id)?;
    Ok(Json(snippet))
}

async fn admin(
    State(state): State<AppState>,
    payload: Result<Json<AdminRequest>, JsonRejection>,
) -> Result<Json<AdminSnapshot>, ApiError> {
    let Json(req) = payload?;

    // Checked before the store is touched, so a rejected request purges nothing
    if !admin_key_matches(state.admin_key.as_deref(), req.admin_key.as_deref()) {
        return Err(ApiError::Unauthorized);
    }
    tracing::debug!("ADMIN snapshot");

    Ok(Json(state.store.admin_snapshot()))
}
