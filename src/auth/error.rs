use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// Authorization-specific errors for token and ownership verification
///
/// The `Display` output carries the internal cause for logs. Responses only
/// ever contain [`AuthorizationError::public_detail`].
#[derive(Debug, thiserror::Error)]
pub enum AuthorizationError {
    /// No token header was provided
    #[error("Missing authentication token")]
    MissingToken,

    /// Token failed decoding or claim validation for the given reason
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Authenticated principal does not own the addressed resource
    #[error("Principal does not own the resource")]
    Forbidden,

    /// Addressed resource does not exist
    #[error("Resource not found")]
    NotFound,

    /// Ownership lookup could not be completed
    #[error("Ownership lookup failed: {0}")]
    Lookup(String),
}

impl AuthorizationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthorizationError::MissingToken | AuthorizationError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthorizationError::Forbidden => StatusCode::FORBIDDEN,
            AuthorizationError::NotFound => StatusCode::NOT_FOUND,
            AuthorizationError::Lookup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed message returned to the caller
    pub fn public_detail(&self) -> &'static str {
        match self {
            AuthorizationError::MissingToken | AuthorizationError::InvalidToken(_) => {
                "missing or invalid token"
            }
            AuthorizationError::Forbidden => "you do not have access to this resource",
            AuthorizationError::NotFound => "resource not found",
            AuthorizationError::Lookup(_) => "internal server error",
        }
    }
}

impl IntoResponse for AuthorizationError {
    fn into_response(self) -> Response {
        ApiError::new(self.status_code(), self.public_detail()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_error() {
        let err = AuthorizationError::MissingToken;
        assert_eq!(err.to_string(), "Missing authentication token");
    }

    #[test]
    fn test_invalid_token_error() {
        let err = AuthorizationError::InvalidToken("signature mismatch".to_string());
        assert_eq!(err.to_string(), "Invalid token: signature mismatch");
        assert_eq!(err.public_detail(), "missing or invalid token");
    }

    #[test]
    fn test_unauthorized_status() {
        let response = AuthorizationError::MissingToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AuthorizationError::InvalidToken("expired".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_forbidden_status() {
        let response = AuthorizationError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_not_found_status() {
        let response = AuthorizationError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_lookup_failure_hides_cause() {
        let err = AuthorizationError::Lookup("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.public_detail().contains("connection"));
    }
}
