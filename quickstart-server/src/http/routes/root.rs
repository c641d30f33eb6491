//! Root verification endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

/// Root response
#[derive(Serialize)]
pub struct RootResponse {
    pub message: &'static str,
}

/// GET /
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Route verification endpoints",
    })
}

/// Root routes
pub fn router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/", get(root))
}
