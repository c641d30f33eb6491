//! Route handlers organized by resource

pub mod root;
pub mod users;

use super::error::ApiError;

/// Fallback for unmatched paths
pub async fn not_found() -> ApiError {
    ApiError::NotFound {
        resource: "route",
        id: "requested path".to_string(),
    }
}
