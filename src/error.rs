use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::time::Duration;
use thiserror::Error;

/// Body returned to inbound callers for every failure kind
pub const PROXY_FAILURE_MESSAGE: &str = "Failed to proxy ValueSet";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("OIDC discovery failed: {0}")]
    Discovery(String),

    #[error("Token exchange failed: {0}")]
    Token(String),

    #[error("Terminology server error: {0}")]
    Upstream(String),

    #[error("Terminology request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Discovery and token failures both mean no usable credential could be obtained
    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Discovery(_) | AppError::Token(_))
    }
}

// Inbound callers only ever see a generic 500; the concrete kind stays in the logs
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!("Terminology proxy request failed: {}", self);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": PROXY_FAILURE_MESSAGE })),
        )
            .into_response()
    }
}

// Implement alias for Result to simplify usage
pub type AppResult<T> = Result<T, AppError>;
