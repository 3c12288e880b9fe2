//! In-process store, lost on restart

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    email_taken, hash_password, item_not_found, new_id, new_item, todo_not_found,
    verify_password, TodoStore,
};
use crate::auth::{OwnershipLookup, Principal};
use crate::models::{Item, ItemRequest, ItemUpdate, Todo, TodoRequest, User, UserRequest};
use crate::Result;

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    todos: HashMap<String, Todo>,
}

/// Process-local store shared by all request handlers
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    hash_cost: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_hash_cost(bcrypt::DEFAULT_COST)
    }

    /// Store hashing passwords with the given bcrypt cost
    pub fn with_hash_cost(hash_cost: u32) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            hash_cost,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn register(&self, request: UserRequest) -> Result<User> {
        if self
            .tables
            .read()
            .await
            .users
            .values()
            .any(|u| u.email == request.email)
        {
            return Err(email_taken());
        }

        let password_hash = hash_password(request.password, self.hash_cost).await?;

        // Re-checked under the write lock, the email may have been taken
        // while hashing.
        let mut tables = self.tables.write().await;
        if tables.users.values().any(|u| u.email == request.email) {
            return Err(email_taken());
        }

        let user = User {
            id: new_id(),
            email: request.email,
            password_hash,
        };
        tables.users.insert(user.id.clone(), user.clone());
        tracing::debug!(user_id = %user.id, "Registered user");
        Ok(user)
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let user = {
            let tables = self.tables.read().await;
            tables.users.values().find(|u| u.email == email).cloned()
        };

        let Some(user) = user else {
            return Ok(None);
        };
        if verify_password(password, &user.password_hash).await? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    async fn create_todo(&self, author: &Principal, request: TodoRequest) -> Result<Todo> {
        let todo_id = new_id();
        let mut items: Vec<Item> = request
            .items
            .into_iter()
            .map(|item| new_item(&todo_id, item))
            .collect();
        items.sort_by_key(|item| item.order);

        let todo = Todo {
            id: todo_id,
            author_id: author.as_str().to_string(),
            name: request.name,
            items,
        };

        self.tables
            .write()
            .await
            .todos
            .insert(todo.id.clone(), todo.clone());
        tracing::debug!(todo_id = %todo.id, author = %author, "Created todo");
        Ok(todo)
    }

    async fn todos_for(&self, author: &Principal, limit: usize, page: usize) -> Result<Vec<Todo>> {
        let tables = self.tables.read().await;
        let mut todos: Vec<&Todo> = tables
            .todos
            .values()
            .filter(|t| t.author_id == author.as_str())
            .collect();
        todos.sort_by(|a, b| a.id.cmp(&b.id));

        let offset = page.saturating_sub(1).saturating_mul(limit);
        Ok(todos.into_iter().skip(offset).take(limit).cloned().collect())
    }

    async fn get_todo(&self, id: &str) -> Result<Todo> {
        self.tables
            .read()
            .await
            .todos
            .get(id)
            .cloned()
            .ok_or_else(todo_not_found)
    }

    async fn rename_todo(&self, id: &str, name: String) -> Result<Todo> {
        let mut tables = self.tables.write().await;
        let todo = tables.todos.get_mut(id).ok_or_else(todo_not_found)?;
        todo.name = name;
        Ok(todo.clone())
    }

    async fn delete_todo(&self, id: &str) -> Result<()> {
        self.tables
            .write()
            .await
            .todos
            .remove(id)
            .map(|_| ())
            .ok_or_else(todo_not_found)
    }

    async fn add_item(&self, todo_id: &str, request: ItemRequest) -> Result<Item> {
        let mut tables = self.tables.write().await;
        let todo = tables.todos.get_mut(todo_id).ok_or_else(todo_not_found)?;

        let item = new_item(todo_id, request);
        todo.items.push(item.clone());
        todo.items.sort_by_key(|item| item.order);
        Ok(item)
    }

    async fn items(&self, todo_id: &str) -> Result<Vec<Item>> {
        Ok(self.get_todo(todo_id).await?.items)
    }

    async fn update_item(
        &self,
        todo_id: &str,
        item_id: &str,
        update: ItemUpdate,
    ) -> Result<Item> {
        let mut tables = self.tables.write().await;
        let item = tables
            .todos
            .get_mut(todo_id)
            .and_then(|todo| todo.items.iter_mut().find(|item| item.id == item_id))
            .ok_or_else(item_not_found)?;

        item.content = update.content;
        item.done = update.done;
        Ok(item.clone())
    }

    async fn delete_item(&self, todo_id: &str, item_id: &str) -> Result<()> {
        let mut tables = self.tables.write().await;
        let items = &mut tables.todos.get_mut(todo_id).ok_or_else(todo_not_found)?.items;

        let before = items.len();
        items.retain(|item| item.id != item_id);
        if items.len() == before {
            return Err(item_not_found());
        }
        Ok(())
    }
}

#[async_trait]
impl OwnershipLookup for MemoryStore {
    async fn owner_of(&self, resource_id: &str) -> Result<Option<Principal>> {
        Ok(self
            .tables
            .read()
            .await
            .todos
            .get(resource_id)
            .map(|todo| Principal::new(todo.author_id.clone())))
    }
}
