//! Postgres user repository
//!
//! - create: INSERT ... RETURNING, unique violation becomes a conflict
//! - remove: DELETE ... RETURNING, no separate existence check
//! - get_range: explicit ORDER BY id so pages are stable

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{DbError, UserRepository};
use crate::models::{NewUser, Range, User};

/// User repository backed by a Postgres pool
#[derive(Clone)]
pub struct PgUserRepo {
    pool: PgPool,
}

impl PgUserRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Roll back after a failed write, keeping the original error.
async fn rollback(tx: Transaction<'_, Postgres>, op: &'static str) {
    if let Err(e) = tx.rollback().await {
        tracing::warn!(op, error = %e, "rollback failed");
    } else {
        tracing::debug!(op, "transaction rolled back");
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

#[async_trait]
impl UserRepository for PgUserRepo {
    async fn get(&self, id: i32) -> Result<Option<User>, DbError> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn get_range(&self, range: Range) -> Result<Vec<User>, DbError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(range.limit())
        .bind(range.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id, name, email",
        )
        .bind(new_user.name.as_str())
        .bind(new_user.email.as_str())
        .fetch_one(&mut *tx)
        .await;

        match inserted {
            Ok(user) => {
                tx.commit().await?;
                Ok(user)
            }
            Err(e) => {
                rollback(tx, "create_user").await;
                if is_unique_violation(&e) {
                    Err(DbError::Conflict {
                        resource: "user",
                        field: "email",
                        value: new_user.email.as_str().to_owned(),
                    })
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn remove(&self, id: i32) -> Result<Option<User>, DbError> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, User>(
            "DELETE FROM users WHERE id = $1 RETURNING id, name, email",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await;

        match deleted {
            Ok(user) => {
                tx.commit().await?;
                Ok(user)
            }
            Err(e) => {
                rollback(tx, "remove_user").await;
                Err(e.into())
            }
        }
    }
}
