//! Correlation identifiers for request logging.
//!
//! Each request gets a UUID `x-request-id` (an incoming one is kept),
//! recorded on the request span so every log line emitted while handling
//! the request carries it, and echoed back on the response.

use std::time::Duration;

use axum::http::{HeaderValue, Request, Response};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::{Level, Span};
use uuid::Uuid;

/// Header carrying the correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generates a fresh UUID v4 per request
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeCorrelationId;

impl MakeRequestId for MakeCorrelationId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Path polled by health checks
const PROBE_PATH: &str = "/";

/// Build the per-request span.
pub fn make_span<B>(request: &Request<B>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let path = request.uri().path();

    if path == PROBE_PATH {
        tracing::debug_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %path,
        )
    } else {
        tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %request.method(),
            path = %path,
        )
    }
}

// Disabled spans keep their metadata, so this holds whatever the filter.
fn is_probe(span: &Span) -> bool {
    span.metadata()
        .is_some_and(|meta| *meta.level() == Level::DEBUG)
}

/// Log the start of a request.
pub fn on_request<B>(_request: &Request<B>, span: &Span) {
    if is_probe(span) {
        tracing::debug!("started processing request");
    } else {
        tracing::info!("started processing request");
    }
}

/// Log the response status and latency.
pub fn on_response<B>(response: &Response<B>, latency: Duration, span: &Span) {
    let status = response.status().as_u16();
    let latency_ms = latency.as_millis() as u64;

    if is_probe(span) {
        tracing::debug!(status, latency_ms, "finished processing request");
    } else {
        tracing::info!(status, latency_ms, "finished processing request");
    }
}
