//! # todo-api
//!
//! REST backend for per-user todo lists with password login and signed
//! session tokens.
//!
//! ## Modules
//!
//! - `auth`: token issuance and decoding, claim validation, the
//!   `RequireToken` middleware layer and ownership checks
//! - `axum_integration`: token header extraction and the `Principal` extractor
//! - `routes` / `app`: the `/v1/user` and `/v1/todo` HTTP surface
//! - `store`: SQLite and in-memory persistence for users, todos and items
//! - `metrics`: Prometheus request counter served at `/prometheus`
//! - `config`: TOML configuration

pub mod app;
pub mod auth;
pub mod axum_integration;
pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod routes;
pub mod store;

pub use error::{ApiError, Result, TodoError};

pub use crate::auth::{Principal, RequireToken, TokenCodec};
pub use crate::config::TodoConfig;
