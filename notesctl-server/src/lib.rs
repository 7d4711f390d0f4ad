//! notesctl-server: note storage and its HTTP API
//!
//! Notes are kept in PostgreSQL and listed newest first with keyset
//! pagination; a non-empty query switches listing to full-text search over
//! titles. The HTTP layer talks to storage only through [`NoteStore`].

pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod store;

use std::sync::Arc;

pub use config::{Config, ConfigError};
pub use error::{Result, ServerError};
pub use store::NoteStore;

use db::{create_pool, ensure_schema, NoteRepo};
use http::{run_server, ServerConfig};

/// Connect to PostgreSQL, prepare the repository and serve until shutdown.
pub async fn serve(config: Config, cors_permissive: bool) -> Result<()> {
    let database_url = config.require_database_url()?;

    let pool = create_pool(database_url, &config.pool).await?;
    tracing::info!(
        max_connections = config.pool.max_connections,
        "database pool ready"
    );

    ensure_schema(&pool).await?;
    let repo = NoteRepo::new(pool).await?;

    let server_config = ServerConfig {
        bind_addr: config.http_addr,
        cors_permissive,
        request_timeout: config.request_timeout,
    };
    run_server(Arc::new(repo), server_config).await
}
