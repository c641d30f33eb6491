//! Database connection pool management
//!
//! Uses sqlx PgPool with explicit connection limits.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseSettings;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a PostgreSQL connection pool from settings.
///
/// # Errors
///
/// Returns an error if the connection fails.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DatabaseSettings::from_env()).await?;
/// ```
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(settings, DEFAULT_MAX_CONNECTIONS).await
}

/// Create a PostgreSQL connection pool with a custom connection limit.
pub async fn create_pool_with_options(
    settings: &DatabaseSettings,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    tracing::debug!(
        host = %settings.host,
        port = %settings.port,
        database = %settings.database,
        max_connections,
        "connecting to postgres"
    );

    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&settings.database_url())
        .await
}
