//! SQLite store on a sqlx connection pool

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};

use super::{
    email_taken, hash_password, item_not_found, new_id, new_item, todo_not_found,
    verify_password, TodoStore,
};
use crate::auth::{OwnershipLookup, Principal};
use crate::config::DatabaseConfig;
use crate::models::{Item, ItemRequest, ItemUpdate, Todo, TodoRequest, User, UserRequest};
use crate::Result;

const SCHEMA: [&str; 4] = [
    r#"CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL
    );"#,
    r#"CREATE TABLE IF NOT EXISTS todos (
        id TEXT PRIMARY KEY,
        author_id TEXT NOT NULL,
        name TEXT NOT NULL
    );"#,
    r#"CREATE INDEX IF NOT EXISTS todos_author_id ON todos (author_id);"#,
    r#"CREATE TABLE IF NOT EXISTS items (
        id TEXT PRIMARY KEY,
        todo_id TEXT NOT NULL REFERENCES todos (id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        done BOOLEAN NOT NULL,
        position INTEGER NOT NULL
    );"#,
];

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TodoRow {
    id: String,
    author_id: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: String,
    todo_id: String,
    content: String,
    done: bool,
    position: u32,
}

impl From<ItemRow> for Item {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            todo_id: row.todo_id,
            content: row.content,
            done: row.done,
            order: row.position,
        }
    }
}

/// Users, todos and items persisted in SQLite
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    hash_cost: u32,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `config.url` and make sure
    /// the tables exist
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        tracing::info!(url = %config.url, "Connected to SQLite");
        Self::with_pool(pool).await
    }

    /// Private in-memory database that lives as long as the store
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self {
            pool,
            hash_cost: bcrypt::DEFAULT_COST,
        })
    }

    /// Hash passwords with the given bcrypt cost
    pub fn with_hash_cost(mut self, hash_cost: u32) -> Self {
        self.hash_cost = hash_cost;
        self
    }

    async fn todo_exists(&self, id: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT 1 FROM todos WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    async fn load_items(&self, todo_id: &str) -> Result<Vec<Item>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"SELECT id, todo_id, content, done, position FROM items
               WHERE todo_id = ?1 ORDER BY position, rowid"#,
        )
        .bind(todo_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Item::from).collect())
    }

    async fn with_items(&self, row: TodoRow) -> Result<Todo> {
        let items = self.load_items(&row.id).await?;
        Ok(Todo {
            id: row.id,
            author_id: row.author_id,
            name: row.name,
            items,
        })
    }
}

async fn insert_item(conn: &mut SqliteConnection, item: &Item) -> Result<()> {
    sqlx::query(
        r#"INSERT INTO items (id, todo_id, content, done, position)
           VALUES (?1, ?2, ?3, ?4, ?5)"#,
    )
    .bind(&item.id)
    .bind(&item.todo_id)
    .bind(&item.content)
    .bind(item.done)
    .bind(item.order)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl TodoStore for SqliteStore {
    async fn register(&self, request: UserRequest) -> Result<User> {
        let user = User {
            id: new_id(),
            password_hash: hash_password(request.password, self.hash_cost).await?,
            email: request.email,
        };

        let inserted = sqlx::query("INSERT INTO users (id, email, password_hash) VALUES (?1, ?2, ?3)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await;

        match inserted {
            Ok(_) => {
                tracing::debug!(user_id = %user.id, "Registered user");
                Ok(user)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(email_taken()),
            Err(e) => Err(e.into()),
        }
    }

    async fn verify_credentials(&self, email: &str, password: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        if verify_password(password, &row.password_hash).await? {
            Ok(Some(row.into()))
        } else {
            Ok(None)
        }
    }

    async fn create_todo(&self, author: &Principal, request: TodoRequest) -> Result<Todo> {
        let todo_id = new_id();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO todos (id, author_id, name) VALUES (?1, ?2, ?3)")
            .bind(&todo_id)
            .bind(author.as_str())
            .bind(&request.name)
            .execute(&mut *tx)
            .await?;
        for item in request.items {
            insert_item(&mut tx, &new_item(&todo_id, item)).await?;
        }
        tx.commit().await?;

        tracing::debug!(todo_id = %todo_id, author = %author, "Created todo");
        self.get_todo(&todo_id).await
    }

    async fn todos_for(&self, author: &Principal, limit: usize, page: usize) -> Result<Vec<Todo>> {
        let offset = page.saturating_sub(1).saturating_mul(limit);
        let rows = sqlx::query_as::<_, TodoRow>(
            r#"SELECT id, author_id, name FROM todos
               WHERE author_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3"#,
        )
        .bind(author.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut todos = Vec::with_capacity(rows.len());
        for row in rows {
            todos.push(self.with_items(row).await?);
        }
        Ok(todos)
    }

    async fn get_todo(&self, id: &str) -> Result<Todo> {
        let row = sqlx::query_as::<_, TodoRow>("SELECT id, author_id, name FROM todos WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(todo_not_found)?;
        self.with_items(row).await
    }

    async fn rename_todo(&self, id: &str, name: String) -> Result<Todo> {
        let updated = sqlx::query("UPDATE todos SET name = ?1 WHERE id = ?2")
            .bind(&name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(todo_not_found());
        }
        self.get_todo(id).await
    }

    async fn delete_todo(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM items WHERE todo_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let deleted = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(todo_not_found());
        }
        tx.commit().await?;
        Ok(())
    }

    async fn add_item(&self, todo_id: &str, request: ItemRequest) -> Result<Item> {
        if !self.todo_exists(todo_id).await? {
            return Err(todo_not_found());
        }
        let item = new_item(todo_id, request);
        let mut conn = self.pool.acquire().await?;
        insert_item(&mut conn, &item).await?;
        Ok(item)
    }

    async fn items(&self, todo_id: &str) -> Result<Vec<Item>> {
        if !self.todo_exists(todo_id).await? {
            return Err(todo_not_found());
        }
        self.load_items(todo_id).await
    }

    async fn update_item(
        &self,
        todo_id: &str,
        item_id: &str,
        update: ItemUpdate,
    ) -> Result<Item> {
        let updated =
            sqlx::query("UPDATE items SET content = ?1, done = ?2 WHERE id = ?3 AND todo_id = ?4")
                .bind(&update.content)
                .bind(update.done)
                .bind(item_id)
                .bind(todo_id)
                .execute(&self.pool)
                .await?;
        if updated.rows_affected() == 0 {
            return Err(item_not_found());
        }

        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, todo_id, content, done, position FROM items WHERE id = ?1",
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn delete_item(&self, todo_id: &str, item_id: &str) -> Result<()> {
        let deleted = sqlx::query("DELETE FROM items WHERE id = ?1 AND todo_id = ?2")
            .bind(item_id)
            .bind(todo_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(item_not_found());
        }
        Ok(())
    }
}

#[async_trait]
impl OwnershipLookup for SqliteStore {
    async fn owner_of(&self, resource_id: &str) -> Result<Option<Principal>> {
        let author = sqlx::query_scalar::<_, String>("SELECT author_id FROM todos WHERE id = ?1")
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author.map(Principal::new))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_data_survives_reconnect() {
        let path = std::env::temp_dir().join(format!("todo-api-{}.db", new_id()));
        let config = DatabaseConfig {
            url: format!("sqlite://{}", path.display()),
            max_connections: 2,
        };

        let store = SqliteStore::connect(&config).await.unwrap().with_hash_cost(4);
        let user = store
            .register(UserRequest {
                email: "a@example.com".to_string(),
                password: "pw".to_string(),
            })
            .await
            .unwrap();
        let author = Principal::new(user.id.clone());
        let todo = store
            .create_todo(
                &author,
                TodoRequest {
                    author_id: None,
                    name: "persisted".to_string(),
                    items: Vec::new(),
                },
            )
            .await
            .unwrap();
        store.pool.close().await;

        let reopened = SqliteStore::connect(&config).await.unwrap();
        assert_eq!(reopened.get_todo(&todo.id).await.unwrap(), todo);
        assert_eq!(reopened.owner_of(&todo.id).await.unwrap(), Some(author));
        assert!(reopened
            .verify_credentials("a@example.com", "pw")
            .await
            .unwrap()
            .is_some());
        reopened.pool.close().await;

        let _ = std::fs::remove_file(&path);
    }
}
