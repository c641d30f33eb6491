//! User endpoints
//!
//! Mounted under the API prefix. Absent rows become 404, duplicate
//! emails 409, anything else from storage a logged 500.

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::DbError;
use crate::http::error::ApiError;
use crate::http::extractors::{ApiJson, ApiQuery, UserId};
use crate::http::state::AppState;
use crate::models::{EmailAddress, NewUser, Range, RangeParams, User, UserName};

/// Create user request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
}

impl CreateUserRequest {
    fn validate(&self) -> Result<NewUser, ApiError> {
        Ok(NewUser {
            name: UserName::new(&self.name)?,
            email: EmailAddress::new(&self.email)?,
        })
    }
}

/// User response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub user_id: i32,
    pub name: String,
    pub email: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            user_id: u.id,
            name: u.name,
            email: u.email,
        }
    }
}

/// GET /user - list users by offset
async fn list_users(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<RangeParams>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let range = Range::from(params);
    tracing::info!(skip = range.skip, limit = range.limit, "Fetching users");

    let users = state.users().get_range(range).await.map_err(|e| {
        tracing::error!(error = %e, skip = range.skip, limit = range.limit, "Failed to fetch users");
        ApiError::Internal {
            message: "Failed to fetch users".to_string(),
        }
    })?;

    tracing::info!(count = users.len(), "Users fetched successfully");
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// POST /user - create a user
async fn create_user(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let new_user = req.validate()?;
    tracing::info!(email = %new_user.email.as_str(), name = %new_user.name.as_str(), "Creating user");

    let user = match state.users().create(new_user).await {
        Ok(user) => user,
        Err(e @ DbError::Conflict { .. }) => {
            tracing::warn!(error = %e, email = %req.email, "User creation failed - email taken");
            return Err(e.into());
        }
        Err(e) => {
            tracing::error!(error = %e, email = %req.email, "User creation failed");
            return Err(e.into());
        }
    };

    tracing::info!(user_id = user.id, email = %user.email, "User created successfully");
    Ok(Json(UserResponse::from(user)))
}

/// GET /user/{id} - get a single user
async fn get_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    Ok(Json(UserResponse::from(user)))
}

/// DELETE /user/{id} - delete a user, returning it as it was
async fn delete_user(
    State(state): State<AppState>,
    UserId(id): UserId,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users()
        .remove(id)
        .await?
        .ok_or_else(|| ApiError::user_not_found(id))?;

    tracing::info!(user_id = user.id, "User deleted");
    Ok(Json(UserResponse::from(user)))
}

/// User routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users).post(create_user))
        .route("/user/", get(list_users).post(create_user))
        .route("/user/{id}", get(get_user).delete(delete_user))
}
