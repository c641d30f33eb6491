//! Schema bootstrap command

use anyhow::{Context, Result};

use quickstart_server::db::{create_pool, migrations};
use quickstart_server::DatabaseSettings;

/// Create the users table and exit
pub async fn run_migrate() -> Result<()> {
    let settings = DatabaseSettings::from_env();
    tracing::info!(?settings, "Database settings loaded");

    let pool = create_pool(&settings)
        .await
        .context("Failed to create database pool")?;

    migrations::run(&pool)
        .await
        .context("Failed to run schema migrations")?;

    pool.close().await;
    Ok(())
}
