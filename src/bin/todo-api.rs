//! todo-api binary.
//!
//! Loads configuration, installs logging and serves the `/v1` API until
//! Ctrl-C.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use todo_api::app::{router, AppState};
use todo_api::config::{load_config, TodoConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, env = "TODO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8000 (a bare port binds 0.0.0.0)
    #[arg(long, env = "PORT")]
    pub listen_addr: Option<String>,

    /// Token signing secret
    #[arg(long, env = "JWT_SECRET_KEY", hide_env_values = true)]
    pub secret: Option<String>,

    /// sqlx SQLite connection URL, e.g. sqlite:todo.db
    #[arg(long, env = "CONNECTION_STRING")]
    pub database_url: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, env = "TOKEN_EXPIRY")]
    pub token_ttl_secs: Option<u64>,

    /// Log filter, e.g. "info" or "todo_api=debug"
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl Cli {
    /// File configuration (or defaults) with command line values on top
    fn resolve_config(&self) -> anyhow::Result<TodoConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => TodoConfig::default(),
        };

        if let Some(addr) = &self.listen_addr {
            config.server.listen_addr = match addr.parse::<u16>() {
                Ok(port) => format!("0.0.0.0:{port}"),
                Err(_) => addr.clone(),
            };
        }
        if let Some(secret) = &self.secret {
            config.auth.secret = secret.clone();
        }
        if let Some(url) = &self.database_url {
            config.database.url = url.clone();
        }
        if let Some(ttl) = self.token_ttl_secs {
            config.auth.token_ttl_secs = ttl;
        }
        if let Some(level) = &self.log_level {
            config.log.level = level.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log.level)),
        )
        .with_target(true)
        .init();

    info!(
        listen_addr = %config.server.listen_addr,
        auth = ?config.auth,
        database = %config.database.url,
        "todo-api starting up"
    );

    let state = AppState::connect(&config)
        .await
        .with_context(|| format!("opening {}", config.database.url))?;
    let app = router(state, config.server.max_payload_size);
    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.server.listen_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Shutdown signal received");
        })
        .await?;

    info!("todo-api stopped");
    Ok(())
}
