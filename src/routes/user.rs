use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use super::valid_body;
use crate::app::AppState;
use crate::auth::TokenError;
use crate::axum_integration::TOKEN_HEADER;
use crate::models::{LoginResponse, UserRequest, UserResponse};
use crate::{Result, TodoError};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/login", post(login))
}

async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<Json<UserResponse>> {
    let request = valid_body(body)?;
    let user = state.store.register(request).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// Exchange email and password for a session token
///
/// Unknown email and wrong password produce the same 400.
async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<UserRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let invalid = || TodoError::BadRequest("invalid data".to_string());

    let request = valid_body(body).map_err(|_| invalid())?;
    let user = state
        .store
        .verify_credentials(&request.email, &request.password)
        .await?
        .ok_or_else(|| {
            tracing::debug!("Login rejected");
            invalid()
        })?;

    let token = state.codec.issue(&user.id)?;
    let header = HeaderValue::from_str(&token).map_err(|e| TokenError::Signing(e.to_string()))?;

    tracing::debug!(user_id = %user.id, "Issued session token");
    Ok(([(TOKEN_HEADER, header)], Json(LoginResponse { token })))
}
