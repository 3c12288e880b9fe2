//! Session tokens and authorization for todo-api
//!
//! This module provides the authorization core: issuing and decoding signed
//! session tokens, validating their claims, the tower layer guarding
//! protected routes, and the ownership check for resource-scoped routes.
//!
//! # Features
//!
//! - `TokenCodec` issues and decodes HS256 session tokens
//! - `ClaimValidator` checks issuer and expiry against an injected clock
//! - `RequireToken` middleware layer that attaches the `Principal`
//! - `authorize_owner` for author-of-todo checks
//!
//! # Example
//!
//! ```ignore
//! use axum::Router;
//! use todo_api::auth::{RequireToken, TokenCodec};
//!
//! let codec = Arc::new(TokenCodec::new(&config.auth));
//! let app = Router::new()
//!     .route("/v1/todo", get(list_todos))
//!     .layer(RequireToken::new(codec));
//! ```

pub mod claims;
pub mod error;
pub mod middleware;
pub mod ownership;
pub mod token;

pub use claims::{ClaimError, ClaimValidator, Claims, Principal};
pub use error::AuthorizationError;
pub use middleware::{RequireToken, TokenVerifier};
pub use ownership::{authorize_owner, OwnershipLookup};
pub use token::{TokenCodec, TokenDecoder, TokenError, DEFAULT_TOKEN_TTL, ISSUER};
