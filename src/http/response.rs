//! HTTP response building module
//!
//! The shared body type and builders for the non-file responses, decoupled
//! from resolution and serving logic.

use crate::logger;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION, SERVER};
use hyper::{Response, StatusCode};

/// Response body used across all handlers. Boxing lets in-memory bodies and
/// streamed file windows share one response type.
pub type Body = BoxBody<Bytes, std::io::Error>;

/// Body over an in-memory buffer.
pub fn full_body(data: impl Into<Bytes>) -> Body {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Empty body.
pub fn empty_body() -> Body {
    full_body(Bytes::new())
}

/// Plain-text response carrying just the status line's reason phrase.
pub fn build_status_response(status: StatusCode) -> Response<Body> {
    let text = status.canonical_reason().unwrap_or_default();
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header(CONTENT_LENGTH, text.len())
        .body(full_body(text))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(empty_body())
        })
}

/// Permanent redirect to `location` with an empty body.
pub fn build_redirect_response(location: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_LENGTH, 0)
        .body(empty_body())
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::MOVED_PERMANENTLY, &e);
            Response::new(empty_body())
        })
}

/// HTML response with the given status.
pub fn build_html_response(
    status: StatusCode,
    content: String,
    server_name: &str,
) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(SERVER, server_name)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, content.len())
        .body(full_body(content))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(empty_body())
        })
}

fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    logger::log_error(&format!("Failed to build {status} response: {error}"));
}
