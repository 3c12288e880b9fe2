//! Axum integration for todo-api authentication
//!
//! This module provides:
//! - Token extraction from the `x-jwt-token` request header
//! - A `FromRequestParts` extractor for the authenticated [`Principal`]
//!
//! # Example
//!
//! ```rust,ignore
//! use todo_api::auth::Principal;
//!
//! async fn protected_handler(principal: Principal) -> String {
//!     format!("Hello, {}!", principal)
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};

use crate::auth::{AuthorizationError, Principal};

/// Header carrying the session token, on requests and on the login response
pub const TOKEN_HEADER: &str = "x-jwt-token";

/// Extract the session token from the `x-jwt-token` header
///
/// Returns `None` when the header is absent, not visible ASCII, or blank.
///
/// # Example
///
/// ```rust,ignore
/// let mut headers = HeaderMap::new();
/// headers.insert("x-jwt-token", "abc.def.ghi".parse().unwrap());
/// assert_eq!(extract_token(&headers), Some("abc.def.ghi"));
/// ```
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads the [`Principal`] placed in the request extensions by
/// [`RequireToken`](crate::auth::RequireToken). Handlers mounted without the
/// layer reject with 401.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthorizationError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or(AuthorizationError::MissingToken)
    }
}
