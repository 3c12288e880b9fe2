//! Request and entity types for users, todo lists and items

use serde::{Deserialize, Serialize};

/// Request bodies check themselves before any handler acts on them
pub trait Validate {
    fn is_valid(&self) -> bool;
}

/// Registered user
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
}

/// Registration and login body
#[derive(Debug, Clone, Deserialize)]
pub struct UserRequest {
    pub email: String,
    pub password: String,
}

impl Validate for UserRequest {
    fn is_valid(&self) -> bool {
        is_email(&self.email) && !self.password.is_empty()
    }
}

/// Public view of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
        }
    }
}

/// Body of a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub author_id: String,
    pub name: String,
    pub items: Vec<Item>,
}

/// Create or rename a todo list
#[derive(Debug, Clone, Deserialize)]
pub struct TodoRequest {
    /// When present it must name the caller
    #[serde(default)]
    pub author_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ItemRequest>,
}

impl Validate for TodoRequest {
    fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && self.items.iter().all(Validate::is_valid)
    }
}

/// Single entry of a todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub todo_id: String,
    pub content: String,
    pub done: bool,
    pub order: u32,
}

/// New item
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRequest {
    pub content: String,
    #[serde(default)]
    pub done: bool,
    pub order: u32,
}

impl Validate for ItemRequest {
    fn is_valid(&self) -> bool {
        !self.content.trim().is_empty() && self.order > 0
    }
}

/// Item edit
#[derive(Debug, Clone, Deserialize)]
pub struct ItemUpdate {
    pub content: String,
    pub done: bool,
}

impl Validate for ItemUpdate {
    fn is_valid(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

/// Loose `local@domain.tld` shape check
fn is_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}
