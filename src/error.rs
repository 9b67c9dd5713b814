//! Service error taxonomy.
//!
//! Every failure that reaches an HTTP client is one of the [`AppError`]
//! variants. Each variant maps to a fixed status code and is rendered as
//!
//! ```json
//! { "statusCode": 404, "timestamp": "2025-04-15T12:34:56Z", "path": "/api/v1/tracks/x", "error": "track x not found" }
//! ```
//!
//! The `path` is not known where the error is raised, so [`attach_request_path`]
//! fills it in on the way out.

use axum::{
    Json,
    extract::Request,
    http::{StatusCode, header::CONTENT_LENGTH},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required setting is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The upstream token endpoint refused or returned an unusable answer.
    #[error("upstream authentication failed (status {status:?}): {body}")]
    UpstreamAuth { status: Option<u16>, body: String },

    /// Retries exhausted, non-retryable upstream status or malformed payload.
    #[error("upstream unavailable (status {status:?}): {body}")]
    UpstreamUnavailable { status: Option<u16>, body: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Configuration(_) | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::UpstreamAuth { .. } | AppError::UpstreamUnavailable { .. } => {
                StatusCode::BAD_GATEWAY
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    /// Maps a unique-constraint violation to `Conflict(message)` and keeps
    /// every other database error as is.
    pub fn conflict_on_unique(err: sqlx::Error, message: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(message.to_string())
            }
            _ => AppError::Database(err),
        }
    }
}

/// Wire shape of an error response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub timestamp: String,
    pub path: String,
    pub error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::Database(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }

        let body = ErrorBody {
            status_code: status.as_u16(),
            timestamp: Utc::now().to_rfc3339(),
            path: String::new(),
            error: message,
        };

        let mut response = (status, Json(body.clone())).into_response();
        response.extensions_mut().insert(body);
        response
    }
}

/// Response middleware that writes the request path into error bodies.
pub async fn attach_request_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(mut body) = response.extensions().get::<ErrorBody>().cloned() else {
        return response;
    };
    body.path = path;

    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    (parts, Json(body)).into_response()
}
