//! HTTP server layer
//!
//! Axum server with:
//! - Correlation ids and request tracing
//! - Security headers on every response
//! - CORS restricted to configured origins
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{build_router, run_server, ServerConfig, ServerError};
pub use state::AppState;
