//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits and eviction.

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Pool sizing and eviction settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept warm while idle
    pub min_connections: u32,
    /// Connections older than this are closed on release
    pub max_lifetime: Duration,
    /// Idle connections above `min_connections` are closed after this
    pub idle_timeout: Duration,
    /// Bound on waiting for a connection, including the first connect
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 10,
            max_lifetime: Duration::from_secs(30 * 60),
            idle_timeout: Duration::from_secs(5 * 60),
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

impl PoolSettings {
    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections.min(self.max_connections))
            .max_lifetime(self.max_lifetime)
            .idle_timeout(self.idle_timeout)
            .acquire_timeout(self.acquire_timeout)
    }
}

/// Create a PostgreSQL connection pool.
///
/// Opens one connection eagerly, so an unreachable database fails here
/// within `acquire_timeout` instead of on the first request.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/notes", &PoolSettings::default()).await?;
/// ```
pub async fn create_pool(database_url: &str, settings: &PoolSettings) -> Result<PgPool, sqlx::Error> {
    settings.options().connect(database_url).await
}
