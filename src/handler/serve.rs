//! Request orchestration module
//!
//! Entry point for HTTP request handling: path resolution and redirect
//! rules, directory index fallback, delegation to the file and vanity
//! responders, response post-processing (CORS, operator headers, access
//! log) and the fallback error mapper.

use crate::config::AppState;
use crate::handler::{static_files, vanity, ServeError};
use crate::http::{path, response};
use crate::http::response::Body;
use crate::logger::{self, AccessLogEntry};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN};
use hyper::http::request::Parts;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;

/// Request headers advertised for cross-origin use.
const CORS_ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept, Range";

/// Main entry point for HTTP request handling. Method-agnostic: every
/// method resolves and serves the same way.
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Body>, Infallible> {
    let (parts, body) = req.into_parts();

    let response = match create_response(&parts, &state).await {
        Ok(response) => response,
        Err(ServeError::MalformedPath) => {
            logger::log_warning(&format!("Rejecting undecodable path {}", parts.uri.path()));
            response::build_status_response(StatusCode::BAD_REQUEST)
        }
        Err(ServeError::NotFound) => {
            drain(body).await;
            vanity::not_found(parts.uri.path(), &state).await
        }
        Err(ServeError::Io(err)) => {
            logger::log_error(&format!("{} {}: {err}", parts.method, parts.uri.path()));
            response::build_status_response(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(finalize(response, &parts, &state))
}

/// Resolve the request path and produce the raw response for it.
async fn create_response(parts: &Parts, state: &AppState) -> Result<Response<Body>, ServeError> {
    let serve = &state.config.serve;

    let decoded =
        path::decode(parts.uri.path()).map_err(|_| ServeError::MalformedPath)?;
    let normalized = path::normalize(&decoded);

    // The mount prefix is mandatory when configured.
    if let Some(url_root) = &serve.url_root {
        if !normalized.starts_with(&mount_prefix(url_root)) {
            return Err(ServeError::NotFound);
        }
    }

    // Redirect paths like `/foo////bar` and `/foo/bar/////` to their
    // normalized form instead of resolving them, so every file has exactly
    // one canonical URL.
    if normalized != decoded {
        return Ok(redirect(&normalized, parts));
    }

    let mut relative = normalized.as_str();
    if let Some(url_root) = &serve.url_root {
        relative = relative
            .strip_prefix(&mount_prefix(url_root))
            .unwrap_or(relative);
    }
    // A trailing slash would turn the file stat into ENOENT.
    let relative = relative.strip_suffix('/').unwrap_or(relative);

    let fs_path = path::safe_join(&serve.fs_root, relative).ok_or(ServeError::NotFound)?;
    let meta = tokio::fs::metadata(&fs_path).await?;

    let trailing_slash = normalized.ends_with('/');

    // For files, the canonical URL has no trailing slash.
    if meta.is_file() && trailing_slash {
        let target = normalized.strip_suffix('/').unwrap_or(&normalized);
        return Ok(redirect(target, parts));
    }
    // For directories it must have one, so that relative links in any index
    // content resolve against the directory rather than its parent.
    if meta.is_dir() && !trailing_slash {
        return Ok(redirect(&format!("{normalized}/"), parts));
    }

    if meta.is_file() {
        return static_files::serve_file(&parts.headers, &fs_path, &meta, state).await;
    }

    // Directory: fall back to the first matching index file.
    for name in &serve.index_files {
        let candidate = fs_path.join(name);
        match tokio::fs::symlink_metadata(&candidate).await {
            Ok(index_meta) if index_meta.is_file() => {
                return static_files::serve_file(&parts.headers, &candidate, &index_meta, state)
                    .await;
            }
            Ok(_) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err.into()),
        }
    }
    Err(ServeError::NotFound)
}

fn mount_prefix(url_root: &str) -> String {
    format!("/{}", url_root.trim_matches('/'))
}

/// Permanent redirect preserving the query string. The target is re-encoded
/// because it is emitted back into URL space.
fn redirect(target: &str, parts: &Parts) -> Response<Body> {
    let mut location = path::encode(target);
    if let Some(query) = parts.uri.query() {
        location.push('?');
        location.push_str(query);
    }
    response::build_redirect_response(&location)
}

/// Append CORS and operator headers (redirects excepted) and emit the
/// access-log line for the terminal response.
fn finalize(mut response: Response<Body>, parts: &Parts, state: &AppState) -> Response<Body> {
    let is_redirect = response.status().is_redirection();

    if state.config.serve.cors && !is_redirect {
        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(CORS_ALLOW_HEADERS),
        );
    }

    if !is_redirect {
        for (name, value) in &state.extra_headers {
            response.headers_mut().append(name.clone(), value.clone());
        }
    }

    if !state.config.serve.quiet {
        let entry = AccessLogEntry::new(
            parts.method.as_str(),
            parts.uri.path(),
            parts.uri.query(),
            response.status().as_u16(),
        );
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    response
}

/// Read off whatever body the client attached, so the connection is left in
/// a reusable state before an unrelated response is written.
async fn drain(body: Incoming) {
    let _ = body.collect().await;
}
