//! HTTP handlers for `/v1/user`, `/v1/todo` and `/prometheus`

pub mod todo;
pub mod user;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Instant;

use crate::app::AppState;
use crate::models::Validate;
use crate::{Result, TodoError};

/// Unwrap a JSON body and reject it unless it validates
pub(crate) fn valid_body<T: Validate>(body: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    let Json(value) = body.map_err(|e| {
        tracing::debug!("Rejected request body: {}", e);
        TodoError::BadRequest("invalid data or malformed json".to_string())
    })?;

    if !value.is_valid() {
        return Err(TodoError::BadRequest(
            "invalid data or malformed json".to_string(),
        ));
    }
    Ok(value)
}

/// Log one line per request with endpoint, method, status and latency, and
/// count it in `http_requests_total`
pub async fn access_log(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let endpoint = request.uri().path().to_string();

    let response = next.run(request).await;

    tracing::info!(
        endpoint = %endpoint,
        method = %method,
        status = response.status().as_u16(),
        latency = ?start.elapsed(),
        "access"
    );
    crate::metrics::record_request(&endpoint);
    response
}

/// Prometheus text exposition of the process metrics
pub async fn prometheus(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
