use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

/// Failures surfaced to API callers. Detail stays in the logs; callers get a stable message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is not configured")]
    Config(&'static str),

    #[error("{upstream} unavailable: {detail}")]
    UpstreamUnavailable {
        upstream: &'static str,
        detail: String,
    },

    #[error("{0}")]
    Validation(String),

    /// Rejected search; the body still carries an empty result page for envelope readers.
    #[error("search query is required")]
    EmptyQuery,
}

impl ApiError {
    pub fn upstream(upstream: &'static str, err: anyhow::Error) -> Self {
        ApiError::UpstreamUnavailable {
            upstream,
            detail: format!("{:#}", err),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UpstreamUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) | ApiError::EmptyQuery => StatusCode::BAD_REQUEST,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Config(_) => "API key is not configured on the server.".to_string(),
            ApiError::UpstreamUnavailable { .. } => {
                "Failed to fetch data from external service.".to_string()
            }
            ApiError::Validation(msg) => msg.clone(),
            ApiError::EmptyQuery => "Search query is required".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Config(_) => error!("Configuration error: {}", self),
            ApiError::UpstreamUnavailable { .. } => warn!("Upstream failure: {}", self),
            ApiError::Validation(_) | ApiError::EmptyQuery => {}
        }
        let body = match &self {
            ApiError::EmptyQuery => Json(json!({
                "error": self.public_message(),
                "results": [],
                "total_results": 0,
                "page": 1,
                "total_pages": 0,
            })),
            _ => Json(json!({ "error": self.public_message() })),
        };
        (self.status(), body).into_response()
    }
}
