//! Response middleware
//!
//! Outermost to innermost, as assembled in [`crate::http::build_router`]:
//! correlation id + request logging, security headers, CORS.

pub mod request_id;
pub mod security_headers;

pub use request_id::{make_span, on_request, on_response, MakeCorrelationId};
pub use security_headers::security_headers;
