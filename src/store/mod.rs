//! Persistence for users, todo lists and items
//!
//! Handlers only see [`TodoStore`]. [`SqliteStore`] is what the server runs
//! on; [`MemoryStore`] keeps everything in process and backs the tests.
//! Both also answer the ownership question for
//! [`authorize_owner`](crate::auth::authorize_owner).

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::{OwnershipLookup, Principal};
use crate::models::{Item, ItemRequest, ItemUpdate, Todo, TodoRequest, User, UserRequest};
use crate::{Result, TodoError};

/// Storage operations behind the `/v1` routes
///
/// Resource ids handed to [`OwnershipLookup::owner_of`] are todo ids.
#[async_trait]
pub trait TodoStore: OwnershipLookup {
    /// Hash the password and store a new user. A taken email is a conflict.
    async fn register(&self, request: UserRequest) -> Result<User>;

    /// User with matching email and password, `None` when either is wrong
    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>>;

    async fn create_todo(&self, author: &Principal, request: TodoRequest) -> Result<Todo>;

    /// One page of the author's todos ordered by id. `page` starts at 1.
    async fn todos_for(&self, author: &Principal, limit: usize, page: usize) -> Result<Vec<Todo>>;

    async fn get_todo(&self, id: &str) -> Result<Todo>;

    async fn rename_todo(&self, id: &str, name: String) -> Result<Todo>;

    /// Remove the todo together with its items
    async fn delete_todo(&self, id: &str) -> Result<()>;

    async fn add_item(&self, todo_id: &str, request: ItemRequest) -> Result<Item>;

    /// Items of a todo ordered by their `order` field
    async fn items(&self, todo_id: &str) -> Result<Vec<Item>>;

    /// Edit an item. Items of other todos are not found.
    async fn update_item(&self, todo_id: &str, item_id: &str, update: ItemUpdate)
        -> Result<Item>;

    async fn delete_item(&self, todo_id: &str, item_id: &str) -> Result<()>;
}

// bcrypt is CPU bound, keep it off the async workers.
pub(crate) async fn hash_password(password: String, cost: u32) -> Result<String> {
    Ok(tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

pub(crate) async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    Ok(tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??)
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn new_item(todo_id: &str, request: ItemRequest) -> Item {
    Item {
        id: new_id(),
        todo_id: todo_id.to_string(),
        content: request.content,
        done: request.done,
        order: request.order,
    }
}

pub(crate) fn todo_not_found() -> TodoError {
    TodoError::NotFound("todo not found".to_string())
}

pub(crate) fn item_not_found() -> TodoError {
    TodoError::NotFound("item not found".to_string())
}

pub(crate) fn email_taken() -> TodoError {
    TodoError::Conflict("email already registered".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TEST_COST: u32 = 4;

    async fn stores() -> Vec<(&'static str, Box<dyn TodoStore>)> {
        vec![
            ("memory", Box::new(MemoryStore::with_hash_cost(TEST_COST))),
            (
                "sqlite",
                Box::new(
                    SqliteStore::in_memory()
                        .await
                        .unwrap()
                        .with_hash_cost(TEST_COST),
                ),
            ),
        ]
    }

    fn user_request(email: &str, password: &str) -> UserRequest {
        UserRequest {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn todo_request(name: &str) -> TodoRequest {
        TodoRequest {
            author_id: None,
            name: name.to_string(),
            items: Vec::new(),
        }
    }

    fn item_request(content: &str, order: u32) -> ItemRequest {
        ItemRequest {
            content: content.to_string(),
            done: false,
            order,
        }
    }

    #[tokio::test]
    async fn test_register_and_verify() {
        for (name, store) in stores().await {
            let user = store.register(user_request("a@example.com", "pw")).await.unwrap();
            assert_ne!(user.password_hash, "pw", "{name}");

            let found = store.verify_credentials("a@example.com", "pw").await.unwrap();
            assert_eq!(found.map(|u| u.id), Some(user.id), "{name}");

            let wrong_password = store.verify_credentials("a@example.com", "wrong").await;
            assert!(wrong_password.unwrap().is_none(), "{name}");
            let unknown_email = store.verify_credentials("b@example.com", "pw").await;
            assert!(unknown_email.unwrap().is_none(), "{name}");
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        for (name, store) in stores().await {
            store.register(user_request("a@example.com", "pw")).await.unwrap();

            let err = store
                .register(user_request("a@example.com", "other"))
                .await
                .unwrap_err();
            assert!(matches!(err, TodoError::Conflict(_)), "{name}: {err}");
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_password_hashing_leaves_runtime_responsive() {
        let store = MemoryStore::new();
        let timer = tokio::spawn(tokio::time::sleep(Duration::from_millis(5)));

        store.register(user_request("a@example.com", "pw")).await.unwrap();

        // The timer can only have completed if the runtime kept polling it
        // while the hash was computed.
        assert!(timer.is_finished());
        assert!(store
            .verify_credentials("a@example.com", "pw")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_owner_of_todo() {
        for (name, store) in stores().await {
            let alice = Principal::new("alice");
            let todo = store.create_todo(&alice, todo_request("chores")).await.unwrap();

            assert_eq!(store.owner_of(&todo.id).await.unwrap(), Some(alice), "{name}");
            assert_eq!(store.owner_of("missing").await.unwrap(), None, "{name}");
        }
    }

    #[tokio::test]
    async fn test_create_todo_with_items_sorted() {
        for (name, store) in stores().await {
            let alice = Principal::new("alice");
            let request = TodoRequest {
                author_id: None,
                name: "chores".to_string(),
                items: vec![item_request("second", 2), item_request("first", 1)],
            };

            let todo = store.create_todo(&alice, request).await.unwrap();
            assert_eq!(todo.author_id, "alice", "{name}");
            let contents: Vec<&str> = todo.items.iter().map(|i| i.content.as_str()).collect();
            assert_eq!(contents, ["first", "second"], "{name}");
            assert_eq!(store.get_todo(&todo.id).await.unwrap(), todo, "{name}");
        }
    }

    #[tokio::test]
    async fn test_todos_for_pages_only_own_todos() {
        for (name, store) in stores().await {
            let alice = Principal::new("alice");
            let bob = Principal::new("bob");
            for i in 0..5 {
                store
                    .create_todo(&alice, todo_request(&format!("a{i}")))
                    .await
                    .unwrap();
            }
            store.create_todo(&bob, todo_request("b")).await.unwrap();

            let first = store.todos_for(&alice, 2, 1).await.unwrap();
            let second = store.todos_for(&alice, 2, 2).await.unwrap();
            let third = store.todos_for(&alice, 2, 3).await.unwrap();
            let fourth = store.todos_for(&alice, 2, 4).await.unwrap();

            assert_eq!(first.len(), 2, "{name}");
            assert_eq!(second.len(), 2, "{name}");
            assert_eq!(third.len(), 1, "{name}");
            assert!(fourth.is_empty(), "{name}");
            assert!(first[0].id < first[1].id, "{name}");
            assert!(first[1].id < second[0].id, "{name}");
            assert!(first
                .iter()
                .chain(&second)
                .chain(&third)
                .all(|t| t.author_id == "alice"));
        }
    }

    #[tokio::test]
    async fn test_items_lifecycle() {
        for (name, store) in stores().await {
            let alice = Principal::new("alice");
            let todo = store.create_todo(&alice, todo_request("chores")).await.unwrap();

            let second = store.add_item(&todo.id, item_request("dishes", 2)).await.unwrap();
            let first = store.add_item(&todo.id, item_request("laundry", 1)).await.unwrap();

            let items = store.items(&todo.id).await.unwrap();
            assert_eq!(items, vec![first.clone(), second.clone()], "{name}");

            let updated = store
                .update_item(
                    &todo.id,
                    &first.id,
                    ItemUpdate {
                        content: "laundry + fold".to_string(),
                        done: true,
                    },
                )
                .await
                .unwrap();
            assert!(updated.done, "{name}");

            store.delete_item(&todo.id, &second.id).await.unwrap();
            assert_eq!(store.items(&todo.id).await.unwrap(), vec![updated], "{name}");

            let err = store.delete_item(&todo.id, &second.id).await.unwrap_err();
            assert!(matches!(err, TodoError::NotFound(_)), "{name}");
        }
    }

    #[tokio::test]
    async fn test_item_of_other_todo_is_not_found() {
        for (name, store) in stores().await {
            let alice = Principal::new("alice");
            let a = store.create_todo(&alice, todo_request("a")).await.unwrap();
            let b = store.create_todo(&alice, todo_request("b")).await.unwrap();
            let item = store.add_item(&a.id, item_request("x", 1)).await.unwrap();

            let err = store
                .update_item(
                    &b.id,
                    &item.id,
                    ItemUpdate {
                        content: "y".to_string(),
                        done: false,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, TodoError::NotFound(_)), "{name}");

            let err = store.delete_item(&b.id, &item.id).await.unwrap_err();
            assert!(matches!(err, TodoError::NotFound(_)), "{name}");
            assert_eq!(store.items(&a.id).await.unwrap(), vec![item], "{name}");
        }
    }

    #[tokio::test]
    async fn test_rename_and_delete_todo() {
        for (name, store) in stores().await {
            let alice = Principal::new("alice");
            let todo = store.create_todo(&alice, todo_request("old")).await.unwrap();
            store.add_item(&todo.id, item_request("x", 1)).await.unwrap();

            let renamed = store.rename_todo(&todo.id, "new".to_string()).await.unwrap();
            assert_eq!(renamed.name, "new", "{name}");

            store.delete_todo(&todo.id).await.unwrap();
            assert!(
                matches!(store.get_todo(&todo.id).await, Err(TodoError::NotFound(_))),
                "{name}"
            );
            assert!(
                matches!(store.items(&todo.id).await, Err(TodoError::NotFound(_))),
                "{name}"
            );
            assert!(
                matches!(store.delete_todo(&todo.id).await, Err(TodoError::NotFound(_))),
                "{name}"
            );
        }
    }

    #[tokio::test]
    async fn test_missing_todo_operations_are_not_found() {
        for (name, store) in stores().await {
            let rename = store.rename_todo("missing", "x".to_string()).await;
            assert!(matches!(rename, Err(TodoError::NotFound(_))), "{name}");

            let add = store.add_item("missing", item_request("x", 1)).await;
            assert!(matches!(add, Err(TodoError::NotFound(_))), "{name}");
        }
    }
}
