//! Axum server setup
//!
//! Middleware order, outermost first: correlation id, request tracing,
//! id propagation, security headers, CORS. Security headers sit outside
//! CORS so their writes are final, including on preflight responses.

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::middleware::{make_span, on_request, on_response, security_headers, MakeCorrelationId};
use super::routes;
use super::state::AppState;
use crate::config::API_PREFIX;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:3000)
    pub bind_addr: SocketAddr,

    /// Origins allowed to make credentialed cross-origin requests
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

/// CORS policy for the configured origins.
///
/// Methods and headers are mirrored from the request because wildcards
/// are not allowed together with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "CORS: ignoring invalid origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

/// Build the application router with all routes and middleware.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeCorrelationId))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(make_span::<Body>)
                .on_request(on_request::<Body>)
                .on_response(on_response::<Body>),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(axum::middleware::from_fn(security_headers))
        .layer(cors_layer(&config.cors_origins));

    Router::new()
        .merge(routes::root::router())
        .nest(API_PREFIX, routes::users::router())
        .fallback(routes::not_found)
        .layer(middleware)
        .with_state(state)
}

/// Run the HTTP server.
///
/// # Example
///
/// ```ignore
/// let pool = create_pool(&DatabaseSettings::from_env()).await?;
/// let state = AppState::new(PgUserRepo::new(pool));
/// run_server(state, ServerConfig::default()).await?;
/// ```
pub async fn run_server(state: AppState, config: ServerConfig) -> Result<(), ServerError> {
    tracing::info!(origins = ?config.cors_origins, "CORS origins configured");
    let app = build_router(state, &config);

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    // Run with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::{header, Method, Request, Response, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::db::repos::{MemoryUserRepo, UserRepository};
    use crate::models::{EmailAddress, NewUser, UserName};

    fn app() -> Router {
        build_router(AppState::new(MemoryUserRepo::new()), &ServerConfig::default())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_user(name: &str, email: &str) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/user")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "name": name, "email": email }).to_string()))
            .unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method(Method::DELETE)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
        app.clone().oneshot(request).await.unwrap()
    }

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000"]);
    }

    #[tokio::test]
    async fn root_endpoint() {
        let response = send(&app(), get("/")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body, json!({ "message": "Route verification endpoints" }));
    }

    #[tokio::test]
    async fn create_then_get_returns_same_user() {
        let app = app();

        let response = send(&app, post_user("Ada Lovelace", "ada@example.com")).await;
        assert_eq!(response.status(), StatusCode::OK);
        let created = body_json(response).await;
        let id = created["user_id"].as_i64().unwrap();

        let response = send(&app, get(&format!("/api/v1/user/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let fetched = body_json(response).await;
        assert_eq!(fetched["name"], "Ada Lovelace");
        assert_eq!(fetched["email"], "ada@example.com");
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict_and_first_user_survives() {
        let app = app();

        let first = body_json(send(&app, post_user("First", "dup@example.com")).await).await;

        let response = send(&app, post_user("Second", "dup@example.com")).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"], "conflict");

        let id = first["user_id"].as_i64().unwrap();
        let response = send(&app, get(&format!("/api/v1/user/{id}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["name"], "First");
    }

    #[tokio::test]
    async fn missing_user_is_404_for_get_and_delete() {
        let app = app();

        let response = send(&app, get("/api/v1/user/999")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, delete("/api/v1/user/999")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_then_get_is_404() {
        let app = app();
        let created = body_json(send(&app, post_user("Temp", "temp@example.com")).await).await;
        let uri = format!("/api/v1/user/{}", created["user_id"]);

        let response = send(&app, delete(&uri)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, created);

        let response = send(&app, get(&uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn pagination_limits_results() {
        let app = app();
        send(&app, post_user("One", "one@example.com")).await;
        send(&app, post_user("Two", "two@example.com")).await;

        let body = body_json(send(&app, get("/api/v1/user?skip=0&limit=1")).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "One");

        let body = body_json(send(&app, get("/api/v1/user?skip=1")).await).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Two");

        let body = body_json(send(&app, get("/api/v1/user/")).await).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn zero_limit_is_empty_page() {
        let app = app();
        send(&app, post_user("One", "one@example.com")).await;

        let response = send(&app, get("/api/v1/user?limit=0")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn large_limit_is_not_capped() {
        let repo = MemoryUserRepo::new();
        for i in 0..150 {
            let new_user = NewUser {
                name: UserName::new("U").unwrap(),
                email: EmailAddress::new(&format!("u{i}@example.com")).unwrap(),
            };
            repo.create(new_user).await.unwrap();
        }
        let app = build_router(AppState::new(repo), &ServerConfig::default());

        let body = body_json(send(&app, get("/api/v1/user?limit=150")).await).await;
        assert_eq!(body.as_array().unwrap().len(), 150);

        let body = body_json(send(&app, get("/api/v1/user")).await).await;
        assert_eq!(body.as_array().unwrap().len(), 100);
    }

    #[tokio::test]
    async fn invalid_input_is_422() {
        let app = app();

        let response = send(&app, post_user("Ada", "not-an-email")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "validation_error");

        let response = send(&app, get("/api/v1/user/abc")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let response = send(&app, get("/api/v1/user?limit=-1")).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn body_errors_are_422() {
        let app = app();

        let malformed = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/user")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"name\": "))
            .unwrap();
        let response = send(&app, malformed).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let untyped = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/user")
            .body(Body::from(json!({ "name": "Ada", "email": "ada@example.com" }).to_string()))
            .unwrap();
        let response = send(&app, untyped).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body_json(response).await["error"], "invalid_request");
    }

    #[tokio::test]
    async fn plain_http_gets_no_hsts() {
        let response = send(&app(), get("/")).await;
        let headers = response.headers();

        assert!(!headers.contains_key(header::STRICT_TRANSPORT_SECURITY));
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert_eq!(
            headers[header::CONTENT_SECURITY_POLICY],
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert_eq!(headers[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
        assert!(!headers.contains_key(header::SERVER));
        assert!(!headers.contains_key("x-powered-by"));
    }

    #[tokio::test]
    async fn forwarded_https_gets_hsts() {
        let request = Request::builder()
            .uri("/")
            .header("X-Forwarded-Proto", "https")
            .body(Body::empty())
            .unwrap();
        let response = send(&app(), request).await;

        let hsts = response.headers()[header::STRICT_TRANSPORT_SECURITY]
            .to_str()
            .unwrap();
        assert!(hsts.contains("max-age=31536000"));
        assert!(hsts.contains("includeSubDomains"));
        assert!(hsts.contains("preload"));
    }

    #[tokio::test]
    async fn cache_control_depends_on_path() {
        let app = app();

        let response = send(&app, get("/api/v1/user")).await;
        let headers = response.headers();
        let cache = headers[header::CACHE_CONTROL].to_str().unwrap();
        assert!(cache.contains("no-store"));
        assert!(cache.contains("private"));
        assert_eq!(headers[header::PRAGMA], "no-cache");
        assert_eq!(headers[header::EXPIRES], "0");

        let response = send(&app, get("/")).await;
        let cache = response.headers()[header::CACHE_CONTROL].to_str().unwrap();
        assert!(cache.contains("public, max-age=3600"));
        assert!(cache.contains("must-revalidate"));
    }

    #[tokio::test]
    async fn error_responses_carry_security_headers() {
        let app = app();

        let response = send(&app, get("/nonexistent")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");

        let request = Request::builder()
            .method(Method::POST)
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert!(response.status().is_client_error());
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn request_id_is_generated_or_propagated() {
        let app = app();

        let response = send(&app, get("/")).await;
        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());

        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "upstream-123")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.headers()["x-request-id"], "upstream-123");
    }

    #[tokio::test]
    async fn cors_allows_configured_origin_only() {
        let app = app();

        let preflight = |origin: &str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/v1/user")
                .header(header::ORIGIN, origin)
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap()
        };

        let response = send(&app, preflight("http://localhost:3000")).await;
        let headers = response.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3000"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");

        let response = send(&app, preflight("http://evil.example")).await;
        assert!(!response
            .headers()
            .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
