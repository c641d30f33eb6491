//! quickstart-server: user CRUD API over Postgres
//!
//! Configuration is read once from the environment into
//! [`DatabaseSettings`] and passed explicitly to the pool and router;
//! nothing here holds global state.

pub mod config;
pub mod db;
pub mod http;
pub mod models;

pub use config::{DatabaseSettings, API_PREFIX};
pub use db::{create_pool, create_pool_with_options, MemoryUserRepo, PgUserRepo, UserRepository};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
