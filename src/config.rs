//! Configuration parsing module for todo-api
//!
//! Configuration is loaded from a TOML file. Every section is optional and
//! falls back to defaults, except the signing secret which must be supplied
//! either in the file or by the caller before [`TodoConfig::validate`] runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use todo_api::config::load_config;
//!
//! let mut config = load_config("todo.toml")?;
//! config.auth.secret = std::env::var("JWT_SECRET_KEY")?;
//! config.validate()?;
//! ```

use crate::auth::{DEFAULT_TOKEN_TTL, ISSUER};
use crate::{Result, TodoError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Longest accepted token lifetime (one year)
pub const MAX_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TodoConfig {
    /// HTTP server section
    #[serde(default)]
    pub server: ServerConfig,

    /// Token signing section
    #[serde(default)]
    pub auth: AuthConfig,

    /// Storage section
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging section
    #[serde(default)]
    pub log: LogConfig,
}

impl TodoConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        load_config(path)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret.is_empty() {
            return Err(TodoError::Config(
                "auth.secret must be set (or JWT_SECRET_KEY)".to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(TodoError::Config(
                "auth.token_ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.token_ttl_secs > MAX_TOKEN_TTL_SECS {
            return Err(TodoError::Config(format!(
                "auth.token_ttl_secs must be at most {}",
                MAX_TOKEN_TTL_SECS
            )));
        }
        if self.auth.issuer.is_empty() {
            return Err(TodoError::Config("auth.issuer must not be empty".to_string()));
        }
        if self.database.url.is_empty() {
            return Err(TodoError::Config(
                "database.url must be set (or CONNECTION_STRING)".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(TodoError::Config(
                "database.max_connections must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the listener binds to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Largest accepted request body in bytes
    #[serde(default = "default_max_payload_size")]
    pub max_payload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_payload_size: default_max_payload_size(),
        }
    }
}

/// Token signing configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric HMAC secret
    #[serde(default)]
    pub secret: String,

    /// Value written to and expected in the `iss` claim
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Token lifetime in seconds
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

impl AuthConfig {
    /// Config with the default issuer and lifetime
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ..Self::default()
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: default_issuer(),
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .finish()
    }
}

/// SQLite storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// sqlx connection URL, e.g. "sqlite:todo.db" or "sqlite::memory:"
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive, e.g. "info" or "todo_api=debug"
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_max_payload_size() -> usize {
    1024 * 1024
}

fn default_issuer() -> String {
    ISSUER.to_string()
}

fn default_token_ttl_secs() -> u64 {
    DEFAULT_TOKEN_TTL.as_secs()
}

fn default_database_url() -> String {
    "sqlite:todo.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "debug".to_string()
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// A `Result<TodoConfig>` containing the parsed configuration or an error
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TodoConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| TodoError::Config(format!("Failed to read config file: {}", e)))?;

    toml::from_str(&content)
        .map_err(|e| TodoError::Config(format!("Failed to parse TOML config: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config: TodoConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.server.max_payload_size, 1024 * 1024);
        assert_eq!(config.auth.issuer, "todo");
        assert_eq!(config.auth.token_ttl_secs, 1800);
        assert_eq!(config.log.level, "debug");
        assert_eq!(config.database.url, "sqlite:todo.db");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.auth.secret.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
[server]
listen_addr = "127.0.0.1:9000"
max_payload_size = 4096

[auth]
secret = "s3cr3t"
token_ttl_secs = 600

[database]
url = "sqlite:///var/lib/todo/todo.db"

[log]
level = "info"
"#;
        let config: TodoConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.server.max_payload_size, 4096);
        assert_eq!(config.auth.secret, "s3cr3t");
        assert_eq!(config.auth.token_ttl(), Duration::from_secs(600));
        assert_eq!(config.auth.issuer, "todo");
        assert_eq!(config.log.level, "info");
        assert_eq!(config.database.url, "sqlite:///var/lib/todo/todo.db");
        assert_eq!(config.database.max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_secret() {
        let config = TodoConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, TodoError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = TodoConfig::default();
        config.auth.secret = "secret".to_string();
        config.auth.token_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_ttl() {
        let mut config = TodoConfig::default();
        config.auth.secret = "secret".to_string();

        config.auth.token_ttl_secs = MAX_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());

        for ttl in [MAX_TOKEN_TTL_SECS + 1, i64::MAX as u64, u64::MAX] {
            config.auth.token_ttl_secs = ttl;
            assert!(matches!(config.validate(), Err(TodoError::Config(_))));
        }
    }

    #[test]
    fn test_validate_rejects_empty_database_url() {
        let mut config = TodoConfig::default();
        config.auth.secret = "secret".to_string();
        config.database.url.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let auth = AuthConfig::new("hunter2");
        let printed = format!("{:?}", auth);
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
