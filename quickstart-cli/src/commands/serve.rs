//! HTTP server command
//!
//! Builds the database settings from the environment, connects, bootstraps
//! the schema and serves the API until Ctrl+C / SIGTERM.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;

use quickstart_server::db::{create_pool_with_options, migrations, pool::DEFAULT_MAX_CONNECTIONS};
use quickstart_server::{run_server, AppState, DatabaseSettings, MemoryUserRepo, PgUserRepo, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Origins allowed for CORS (repeatable or comma-separated)
    #[arg(
        long = "cors-origin",
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost:3000"
    )]
    pub cors_origins: Vec<String>,

    /// Maximum pooled database connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Keep users in memory instead of Postgres (data is lost on exit)
    #[arg(long)]
    pub in_memory: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let config = ServerConfig {
        bind_addr: args.bind,
        cors_origins: args.cors_origins,
    };

    let state = if args.in_memory {
        tracing::warn!("Using in-memory user storage; data will not persist");
        AppState::new(MemoryUserRepo::new())
    } else {
        let settings = DatabaseSettings::from_env();
        tracing::info!(?settings, "Database settings loaded");

        let pool = create_pool_with_options(&settings, args.max_connections)
            .await
            .context("Failed to create database pool")?;

        migrations::run(&pool)
            .await
            .context("Failed to run schema migrations")?;

        AppState::new(PgUserRepo::new(pool))
    };

    tracing::info!("Starting quickstart server on {}", config.bind_addr);

    // Run server (blocks until shutdown)
    run_server(state, config).await.context("Server error")?;

    Ok(())
}
