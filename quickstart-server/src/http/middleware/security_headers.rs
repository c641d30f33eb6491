//! Security response headers
//!
//! Every response gets the static hardening headers, loses server
//! disclosure headers and has its cookies pinned to `SameSite=Strict`.
//! HSTS is only sent when the request arrived over HTTPS, directly or
//! behind a proxy that sets `X-Forwarded-Proto`. Cache policy depends on
//! whether the path is a versioned API path.
//!
//! Writes use `insert`, so these values replace anything set by inner
//! layers or handlers.

use axum::extract::Request;
use axum::http::header::{
    HeaderMap, HeaderName, HeaderValue, CACHE_CONTROL, CONTENT_SECURITY_POLICY, EXPIRES, PRAGMA,
    REFERRER_POLICY, SET_COOKIE, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};
use axum::middleware::Next;
use axum::response::Response;

const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
const PERMISSIONS_POLICY: HeaderName = HeaderName::from_static("permissions-policy");

const HSTS: &str = "max-age=31536000; includeSubDomains; preload";
const CSP: &str = "default-src 'none'; frame-ancestors 'none'";
const PERMISSIONS: &str = "geolocation=(), microphone=(), camera=(), payment=(), usb=(), \
                           magnetometer=(), gyroscope=(), speaker=()";
const API_CACHE_CONTROL: &str = "no-store, no-cache, must-revalidate, private";
const PUBLIC_CACHE_CONTROL: &str = "public, max-age=3600, must-revalidate";
const SAME_SITE_STRICT: &str = "SameSite=Strict";

/// Headers that disclose server or proxy details
const DISCLOSURE_HEADERS: [&str; 5] = [
    "server",
    "x-powered-by",
    "via",
    "x-aspnet-version",
    "x-aspnetmvc-version",
];

/// Middleware entry point for `axum::middleware::from_fn`.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let https = is_https(&request);
    let api = is_versioned_api_path(request.uri().path());

    let mut response = next.run(request).await;
    apply(response.headers_mut(), https, api);
    response
}

/// Whether the effective request scheme is HTTPS.
///
/// Only the first `X-Forwarded-Proto` entry counts; it was written by the
/// proxy closest to the client.
pub fn is_https<B>(request: &axum::http::Request<B>) -> bool {
    if request.uri().scheme_str() == Some("https") {
        return true;
    }

    request
        .headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|proto| proto.trim().eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

/// Whether a path belongs to a versioned API: `/api/v`, `/api/v<digit>`,
/// or `/api/v<digit>/...`.
///
/// # Example
/// ```
/// use quickstart_server::http::middleware::security_headers::is_versioned_api_path;
///
/// assert!(is_versioned_api_path("/api/v1/user"));
/// assert!(!is_versioned_api_path("/api/version"));
/// assert!(!is_versioned_api_path("/api-docs"));
/// ```
pub fn is_versioned_api_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix("/api/v") else {
        return false;
    };

    let mut chars = rest.chars();
    match chars.next() {
        None => true,
        Some(c) if c.is_ascii_digit() => matches!(chars.next(), None | Some('/')),
        Some(_) => false,
    }
}

/// Apply the header policy to a response header map.
pub fn apply(headers: &mut HeaderMap, https: bool, api: bool) {
    headers.insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(CONTENT_SECURITY_POLICY, HeaderValue::from_static(CSP));
    headers.insert(
        REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(PERMISSIONS_POLICY, HeaderValue::from_static(PERMISSIONS));

    if https {
        headers.insert(STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS));
    } else {
        headers.remove(STRICT_TRANSPORT_SECURITY);
    }

    for name in DISCLOSURE_HEADERS {
        headers.remove(name);
    }

    if api {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(API_CACHE_CONTROL));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));
    } else {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(PUBLIC_CACHE_CONTROL));
    }

    pin_cookies_same_site(headers);
}

/// Rewrite every `Set-Cookie` so it carries `SameSite=Strict`.
fn pin_cookies_same_site(headers: &mut HeaderMap) {
    if !headers.contains_key(SET_COOKIE) {
        return;
    }

    let cookies: Vec<HeaderValue> = headers
        .get_all(SET_COOKIE)
        .iter()
        .map(|value| match value.to_str() {
            Ok(cookie) => HeaderValue::from_str(&same_site_strict(cookie))
                .unwrap_or_else(|_| value.clone()),
            Err(_) => value.clone(),
        })
        .collect();

    headers.remove(SET_COOKIE);
    for cookie in cookies {
        headers.append(SET_COOKIE, cookie);
    }
}

/// Force a cookie's `SameSite` attribute to `Strict`.
///
/// An existing attribute (any value, any case, spaces around `=`) is
/// replaced. A missing one is inserted before the first `HttpOnly`,
/// `Secure` or `Path` attribute, or appended.
pub fn same_site_strict(cookie: &str) -> String {
    if cookie.trim().is_empty() {
        return cookie.to_owned();
    }

    let mut parts: Vec<&str> = cookie
        .split(';')
        .map(str::trim)
        .enumerate()
        .filter(|(i, part)| *i == 0 || !part.is_empty())
        .map(|(_, part)| part)
        .collect();

    let existing = parts
        .iter()
        .skip(1)
        .position(|p| attribute_name(p) == "samesite");

    match existing {
        Some(pos) => parts[pos + 1] = SAME_SITE_STRICT,
        None => {
            let at = parts
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, p)| {
                    matches!(attribute_name(p).as_str(), "httponly" | "secure" | "path")
                })
                .map(|(i, _)| i)
                .unwrap_or(parts.len());
            parts.insert(at, SAME_SITE_STRICT);
        }
    }

    parts.join("; ")
}

fn attribute_name(part: &str) -> String {
    part.split('=')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
