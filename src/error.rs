//! Error types for todo-api operations

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::Serialize;

use crate::auth::{AuthorizationError, TokenError};

/// Crate-level error type
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Password hashing error: {0}")]
    Password(#[from] bcrypt::BcryptError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, TodoError>;

impl TodoError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TodoError::BadRequest(_) => StatusCode::BAD_REQUEST,
            TodoError::NotFound(_) => StatusCode::NOT_FOUND,
            TodoError::Conflict(_) => StatusCode::CONFLICT,
            TodoError::Authorization(err) => err.status_code(),
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to hand back to the caller
    fn public_detail(&self) -> String {
        match self {
            TodoError::BadRequest(detail)
            | TodoError::NotFound(detail)
            | TodoError::Conflict(detail) => detail.clone(),
            TodoError::Authorization(err) => err.public_detail().to_string(),
            _ => "internal server error".to_string(),
        }
    }
}

/// Problem body returned for every failed request (partial RFC 9457)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct ApiError {
    pub status: u16,
    pub title: String,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        let title = match status {
            StatusCode::BAD_REQUEST => "httperror:badrequest",
            StatusCode::UNAUTHORIZED => "httperror:unauthorized",
            StatusCode::FORBIDDEN => "httperror:forbidden",
            StatusCode::NOT_FOUND => "httperror:notfound",
            StatusCode::CONFLICT => "httperror:conflict",
            StatusCode::INTERNAL_SERVER_ERROR => "httperror:internalerror",
            _ => "httperror:unspecifiederror",
        };
        Self {
            status: status.as_u16(),
            title: title.to_string(),
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        ApiError::new(status, self.public_detail()).into_response()
    }
}
