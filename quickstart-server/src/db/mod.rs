//! Database layer - connection pool, schema bootstrap and repositories
//!
//! - Connection pool; each repository call borrows a connection and
//!   returns it when the call completes
//! - Rely on DB constraints, handle conflicts - no check-then-insert
//! - Write paths run in a transaction that is rolled back on failure

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
