//! Application state shared across handlers

use std::sync::Arc;

use crate::db::repos::UserRepository;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    users: Box<dyn UserRepository>,
}

impl AppState {
    pub fn new<R>(users: R) -> Self
    where
        R: UserRepository + 'static,
    {
        Self {
            inner: Arc::new(AppStateInner {
                users: Box::new(users),
            }),
        }
    }

    pub fn users(&self) -> &dyn UserRepository {
        self.inner.users.as_ref()
    }
}
