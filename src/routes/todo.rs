//! Todo list and item handlers
//!
//! Every route here is mounted behind `RequireToken`. Routes addressing a
//! todo by id run the ownership check before reading the request body.

use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};

use super::valid_body;
use crate::app::AppState;
use crate::auth::{authorize_owner, AuthorizationError, Principal};
use crate::models::{Item, ItemRequest, ItemUpdate, Todo, TodoRequest};
use crate::{Result, TodoError};

const DEFAULT_PAGE: usize = 1;
const DEFAULT_LIMIT: usize = 10;

type Body<T> = std::result::Result<Json<T>, JsonRejection>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/{id}", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/{id}/items", get(list_items).post(create_item))
        .route("/{id}/items/{item_id}", put(update_item).delete(delete_item))
}

async fn create_todo(
    principal: Principal,
    State(state): State<AppState>,
    body: Body<TodoRequest>,
) -> Result<(StatusCode, Json<Todo>)> {
    let request = valid_body(body)?;
    if let Some(author_id) = &request.author_id {
        if author_id != principal.as_str() {
            return Err(AuthorizationError::Forbidden.into());
        }
    }

    let todo = state.store.create_todo(&principal, request).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Parse a positive integer query parameter, falling back on anything else
fn positive(query: &HashMap<String, String>, key: &str, default: usize) -> usize {
    query
        .get(key)
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

async fn list_todos(
    principal: Principal,
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<Todo>>> {
    let page = positive(&query, "page", DEFAULT_PAGE);
    let limit = positive(&query, "limit", DEFAULT_LIMIT);

    let todos = state.store.todos_for(&principal, limit, page).await?;
    if todos.is_empty() {
        return Err(TodoError::NotFound("no todos found for user".to_string()));
    }
    Ok(Json(todos))
}

async fn get_todo(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>> {
    authorize_owner(&principal, state.store.as_ref(), &id).await?;
    Ok(Json(state.store.get_todo(&id).await?))
}

async fn update_todo(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<TodoRequest>,
) -> Result<Json<Todo>> {
    authorize_owner(&principal, state.store.as_ref(), &id).await?;
    let request = valid_body(body)?;
    Ok(Json(state.store.rename_todo(&id, request.name).await?))
}

async fn delete_todo(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    authorize_owner(&principal, state.store.as_ref(), &id).await?;
    state.store.delete_todo(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_item(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Body<ItemRequest>,
) -> Result<(StatusCode, Json<Item>)> {
    authorize_owner(&principal, state.store.as_ref(), &id).await?;
    let request = valid_body(body)?;
    let item = state.store.add_item(&id, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn list_items(
    principal: Principal,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Item>>> {
    authorize_owner(&principal, state.store.as_ref(), &id).await?;
    Ok(Json(state.store.items(&id).await?))
}

async fn update_item(
    principal: Principal,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
    body: Body<ItemUpdate>,
) -> Result<Json<Item>> {
    authorize_owner(&principal, state.store.as_ref(), &id).await?;
    let update = valid_body(body)?;
    Ok(Json(state.store.update_item(&id, &item_id, update).await?))
}

async fn delete_item(
    principal: Principal,
    State(state): State<AppState>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<StatusCode> {
    authorize_owner(&principal, state.store.as_ref(), &id).await?;
    state.store.delete_item(&id, &item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_positive_falls_back() {
        assert_eq!(positive(&query(&[]), "page", 1), 1);
        assert_eq!(positive(&query(&[("page", "3")]), "page", 1), 3);
        assert_eq!(positive(&query(&[("page", "0")]), "page", 1), 1);
        assert_eq!(positive(&query(&[("page", "-2")]), "page", 1), 1);
        assert_eq!(positive(&query(&[("limit", "abc")]), "limit", 10), 10);
    }
}
