//! Static file response module
//!
//! Builds the response for a resolved regular file: content negotiation
//! headers, the conditional-request short-circuit, and whole-file or
//! byte-range bodies streamed from a file handle scoped to the response.

use crate::config::AppState;
use crate::handler::ServeError;
use crate::http::cache;
use crate::http::range::parse_range_header;
use crate::http::response::{empty_body, Body};
use crate::logger;
use futures_util::TryStreamExt;
use http_body_util::{BodyExt, StreamBody};
use httpdate::fmt_http_date;
use hyper::body::Frame;
use hyper::header::{
    HeaderMap, ACCEPT_RANGES, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, DATE, ETAG,
    LAST_MODIFIED, RANGE, SERVER,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use std::fs::Metadata;
use std::io::SeekFrom;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

/// Serve one regular file. The caller has already resolved the path and
/// ruled out directories; `meta` comes from the stat it performed.
pub async fn serve_file(
    headers: &HeaderMap,
    path: &Path,
    meta: &Metadata,
    state: &AppState,
) -> Result<Response<Body>, ServeError> {
    let mut response = Response::builder()
        .header(SERVER, state.config.serve.server_name.as_str())
        .header(ACCEPT_RANGES, "bytes");

    if let Ok(accessed) = meta.accessed() {
        response = response.header(DATE, fmt_http_date(accessed));
    }

    let conditional = cache::evaluate(
        meta,
        headers,
        state.config.serve.etag_algorithm,
        state.fallback_etag.as_deref(),
    );
    if let Some(modified) = conditional.validator.last_modified {
        response = response.header(LAST_MODIFIED, fmt_http_date(modified));
    }
    if let Some(etag) = &conditional.validator.etag {
        response = response.header(ETAG, etag.as_str());
    }
    if conditional.not_modified {
        let response = response.status(StatusCode::NOT_MODIFIED);
        return Ok(finish(response, empty_body()));
    }

    if let Some(mime) = mime_guess::from_path(path).first() {
        response = response.header(CONTENT_TYPE, mime.as_ref());
    }

    let size = meta.len();

    // Some clients attach a Range header to every request. For an empty
    // file the header is ignored and a plain 200 is produced instead of a
    // degenerate 416.
    let range_header = headers
        .get(RANGE)
        .and_then(|value| value.to_str().ok())
        .filter(|_| size > 0);

    if let Some(value) = range_header {
        // Unparseable ranges fall through to the whole-file response.
        if let Some(range) = parse_range_header(value, size) {
            let last = i64::try_from(size).unwrap_or(i64::MAX) - 1;

            if range.end < 0 || range.end < range.start || range.start > last {
                let response = response
                    .status(StatusCode::RANGE_NOT_SATISFIABLE)
                    .header(CONTENT_RANGE, format!("bytes */{size}"));
                return Ok(finish(response, empty_body()));
            }

            let start = u64::try_from(range.start.max(0)).unwrap_or(0);
            let end = u64::try_from(range.end.min(last)).unwrap_or(0);
            let length = end - start + 1;

            let response = response
                .status(StatusCode::PARTIAL_CONTENT)
                .header(CONTENT_RANGE, format!("bytes {start}-{end}/{size}"))
                .header(CONTENT_LENGTH, length);
            return Ok(finish(response, stream_window(path, start, length).await?));
        }
    }

    let response = response
        .status(StatusCode::OK)
        .header(CONTENT_LENGTH, size);
    Ok(finish(response, stream_window(path, 0, size).await?))
}

/// Open `path` and produce a body covering `length` bytes starting at
/// `start`. The handle lives inside the stream and is dropped when the body
/// is fully consumed or the client goes away.
async fn stream_window(path: &Path, start: u64, length: u64) -> Result<Body, ServeError> {
    let mut file = File::open(path).await?;
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    let stream = ReaderStream::new(file.take(length));
    Ok(StreamBody::new(stream.map_ok(Frame::data)).boxed())
}

fn finish(builder: Builder, body: Body) -> Response<Body> {
    builder.body(body).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build file response: {e}"));
        Response::new(empty_body())
    })
}
