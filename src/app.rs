//! Router assembly and shared handler state

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::{middleware, Router};
use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::{RequireToken, TokenCodec};
use crate::config::TodoConfig;
use crate::routes::{access_log, prometheus, todo, user};
use crate::store::{SqliteStore, TodoStore};
use crate::Result;

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TodoStore>,
    pub codec: Arc<TokenCodec>,
    pub metrics: PrometheusHandle,
}

impl AppState {
    pub fn new(store: Arc<dyn TodoStore>, codec: Arc<TokenCodec>) -> Self {
        Self {
            store,
            codec,
            metrics: crate::metrics::install_recorder(),
        }
    }

    /// State backed by the SQLite database in `config.database` with a codec
    /// built from `config.auth`
    pub async fn connect(config: &TodoConfig) -> Result<Self> {
        let store = SqliteStore::connect(&config.database).await?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(TokenCodec::new(&config.auth)),
        ))
    }
}

/// Build the `/v1` API and `/prometheus`. Todo routes require a session token.
pub fn router(state: AppState, max_payload_size: usize) -> Router {
    let protected = todo::routes().route_layer(RequireToken::new(state.codec.clone()));

    Router::new()
        .nest("/v1/user", user::routes())
        .nest("/v1/todo", protected)
        .route("/prometheus", get(prometheus))
        .layer(middleware::from_fn(access_log))
        .layer(DefaultBodyLimit::max(max_payload_size))
        .with_state(state)
}
