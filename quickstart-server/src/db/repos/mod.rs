//! Repository implementations for user storage
//!
//! [`UserRepository`] is the seam handlers depend on. [`PgUserRepo`]
//! talks to Postgres; [`MemoryUserRepo`] keeps rows in memory with the
//! same conflict and absence semantics.

pub mod memory;
pub mod users;

use async_trait::async_trait;

use crate::models::{NewUser, Range, User};

pub use memory::MemoryUserRepo;
pub use users::PgUserRepo;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("conflict: {resource} with {field} '{value}' already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Data access for the user table
///
/// Absence is reported as `Ok(None)` and duplicate emails as
/// `DbError::Conflict`; neither is an unexpected failure.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fetch a user by primary key.
    async fn get(&self, id: i32) -> Result<Option<User>, DbError>;

    /// List users ordered by id.
    async fn get_range(&self, range: Range) -> Result<Vec<User>, DbError>;

    /// Insert a user and return it with its assigned id.
    async fn create(&self, new_user: NewUser) -> Result<User, DbError>;

    /// Delete a user, returning the row as it was before deletion.
    async fn remove(&self, id: i32) -> Result<Option<User>, DbError>;
}
