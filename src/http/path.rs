//! Request path resolution module
//!
//! Percent-decoding, POSIX-style normalization and traversal-safe joins
//! from URL space onto the filesystem root.

use percent_encoding::{percent_decode_str, percent_encode, AsciiSet, CONTROLS};
use std::path::{Component, Path, PathBuf};
use std::str::Utf8Error;

/// Characters that must not appear raw when a decoded path is emitted back
/// into URL space (redirect `Location` values).
const PATH_ESC_CHARSET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'#')
    .add(b'%');

/// Percent-decode a request path. Sequences that do not decode to valid
/// UTF-8 are rejected; the orchestrator maps that to 400.
pub fn decode(raw: &str) -> Result<String, Utf8Error> {
    Ok(percent_decode_str(raw).decode_utf8()?.into_owned())
}

/// Re-encode a decoded path for use in a `Location` header.
pub fn encode(path: &str) -> String {
    percent_encode(path.as_bytes(), PATH_ESC_CHARSET).to_string()
}

/// Normalize an absolute URL path using POSIX rules: collapse repeated
/// separators and `.` segments, resolve `..` against preceding segments
/// (never above the root). A single trailing slash survives, mirroring
/// `posix.normalize` - the orchestrator's redirect rules depend on it.
pub fn normalize(path: &str) -> String {
    let trailing_slash = path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    let mut normalized = String::from("/");
    normalized.push_str(&segments.join("/"));
    if trailing_slash && normalized.len() > 1 {
        normalized.push('/');
    }
    normalized
}

/// Join a normalized, root-relative URL path onto the filesystem root.
///
/// Only plain path segments are accepted: a residual `..`, an absolute
/// component or a platform prefix (anything that could step outside `root`)
/// refuses the join. This guards traversal independently of [`normalize`],
/// which matters for separators smuggled in through percent-encoding.
pub fn safe_join(root: &Path, relative: &str) -> Option<PathBuf> {
    let mut path = root.to_path_buf();
    for segment in relative.split('/') {
        if segment.is_empty() || segment == "." {
            continue;
        }
        if segment == ".." {
            return None;
        }
        let segment = Path::new(segment);
        let mut components = segment.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => path.push(segment),
            _ => return None,
        }
    }
    Some(path)
}
