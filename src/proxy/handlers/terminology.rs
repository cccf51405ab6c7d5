// Terminology lookup handlers
use axum::{
    extract::State,
    http::Uri,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::proxy::server::AppState;
use crate::proxy::terminology::ProxyStats;

pub const LOOKUP_PREFIX: &str = "/api/terminology/";

/// Proxy service status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyStatus {
    pub running: bool,
    pub port: u16,
    pub base_url: String,
    pub cached_entries: usize,
    pub token_valid: bool,
    pub started_at: String,
    pub stats: ProxyStats,
}

/// GET /api/terminology/{+path}
///
/// Path and query are taken from the raw URI so they reach the cache key and
/// upstream URL without a decode/re-encode pass.
pub async fn handle_lookup(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    let path = uri.path().strip_prefix(LOOKUP_PREFIX).unwrap_or_default();

    let body = state.proxy.handle(path, uri.query()).await?;
    Ok(Json(body).into_response())
}

/// GET /status
pub async fn handle_status(State(state): State<AppState>) -> Json<ProxyStatus> {
    Json(ProxyStatus {
        running: true,
        port: state.port,
        base_url: state.proxy.base_url().to_string(),
        cached_entries: state.proxy.cache().len(),
        token_valid: state.proxy.token_manager().has_valid_token().await,
        started_at: state.started_at.to_rfc3339(),
        stats: state.proxy.stats(),
    })
}

/// Health check handler
pub async fn handle_health() -> Response {
    Json(serde_json::json!({
        "status": "ok"
    }))
    .into_response()
}
