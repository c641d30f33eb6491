//! In-memory user repository
//!
//! Mirrors the Postgres semantics: sequential ids starting at 1, unique
//! email, id-ordered listing. Used by handler tests and for running the
//! API without a database.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{DbError, UserRepository};
use crate::models::{NewUser, Range, User};

#[derive(Default)]
struct Table {
    last_id: i32,
    rows: BTreeMap<i32, User>,
}

/// User repository holding rows in process memory
#[derive(Default)]
pub struct MemoryUserRepo {
    table: Mutex<Table>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepo {
    async fn get(&self, id: i32) -> Result<Option<User>, DbError> {
        Ok(self.table.lock().await.rows.get(&id).cloned())
    }

    async fn get_range(&self, range: Range) -> Result<Vec<User>, DbError> {
        let table = self.table.lock().await;
        Ok(table
            .rows
            .values()
            .skip(range.skip as usize)
            .take(range.limit as usize)
            .cloned()
            .collect())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, DbError> {
        let mut table = self.table.lock().await;

        let email = new_user.email.as_str();
        if table.rows.values().any(|u| u.email == email) {
            return Err(DbError::Conflict {
                resource: "user",
                field: "email",
                value: email.to_owned(),
            });
        }

        // Like a sequence, ids are never reused after a delete.
        table.last_id += 1;
        let user = User {
            id: table.last_id,
            name: new_user.name.as_str().to_owned(),
            email: email.to_owned(),
        };
        table.rows.insert(user.id, user.clone());

        Ok(user)
    }

    async fn remove(&self, id: i32) -> Result<Option<User>, DbError> {
        Ok(self.table.lock().await.rows.remove(&id))
    }
}
