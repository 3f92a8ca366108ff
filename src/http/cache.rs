//! HTTP cache validation module
//!
//! Validator (`ETag` / `Last-Modified`) computation and evaluation of the
//! `If-None-Match` and `If-Modified-Since` conditional request headers.

use httpdate::parse_http_date;
use hyper::header::{HeaderMap, IF_MODIFIED_SINCE, IF_NONE_MATCH};
use serde::Deserialize;
use sha2::{Digest, Sha256, Sha512};
use std::fs::Metadata;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Digest used for strong validator computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum EtagAlgorithm {
    #[default]
    #[serde(rename = "sha-256")]
    Sha256,
    #[serde(rename = "sha-512")]
    Sha512,
}

impl EtagAlgorithm {
    fn digest_hex(self, material: &[u8]) -> String {
        match self {
            Self::Sha256 => hex::encode(Sha256::digest(material)),
            Self::Sha512 => hex::encode(Sha512::digest(material)),
        }
    }
}

/// Validator pair for one file as served in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    /// Entity tag, either strong (from file metadata) or the process-wide
    /// weak fallback when the file has no modification time
    pub etag: Option<String>,
    /// Last modification time when the filesystem provides one
    pub last_modified: Option<SystemTime>,
}

impl Validator {
    /// Conditional headers are only consulted when there is something to
    /// compare against.
    pub fn has_value(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

/// Outcome of evaluating a request's conditional headers against a file.
#[derive(Debug)]
pub struct Conditional {
    pub validator: Validator,
    /// When set, the caller must answer 304 with an empty body and never
    /// open the file's data stream
    pub not_modified: bool,
}

/// Strong validator: quoted hex digest over modification time and size.
fn strong_etag(modified: SystemTime, size: u64, algorithm: EtagAlgorithm) -> String {
    let nanos = modified
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    let material = format!("{nanos:x}-{size:x}");
    format!("\"{}\"", algorithm.digest_hex(material.as_bytes()))
}

/// Weak process-wide fallback validator, derived once at startup from a
/// deployment identifier. Every file lacking a modification time shares it,
/// so it cannot distinguish such files from one another.
pub fn weak_etag(seed: &str, algorithm: EtagAlgorithm) -> String {
    format!("W/\"{}\"", algorithm.digest_hex(seed.as_bytes()))
}

/// Compute the validator for a file from its metadata. Files without a
/// modification time fall back to the shared weak validator, if any.
pub fn file_validator(
    meta: &Metadata,
    algorithm: EtagAlgorithm,
    fallback: Option<&str>,
) -> Validator {
    let modified = meta.modified().ok();
    let etag = match modified {
        Some(mtime) => Some(strong_etag(mtime, meta.len(), algorithm)),
        None => fallback.map(str::to_owned),
    };
    Validator {
        etag,
        last_modified: modified,
    }
}

/// Entity-tag comparison for `If-None-Match`.
///
/// Returns true when the client's cached copy is stale, i.e. none of the
/// listed tags pairs with the current validator. Comparison is weak: `W/`
/// prefixes are ignored on both sides; `*` pairs with any validator.
pub fn if_none_match(header: Option<&str>, etag: Option<&str>) -> bool {
    let (Some(header), Some(etag)) = (header, etag) else {
        return true;
    };
    if header.trim() == "*" {
        return false;
    }
    let etag = etag.strip_prefix("W/").unwrap_or(etag);
    !header
        .split(',')
        .map(str::trim)
        .map(|tag| tag.strip_prefix("W/").unwrap_or(tag))
        .any(|tag| tag == etag)
}

/// Evaluate a request's conditional headers against a file.
///
/// A 304 is produced when `If-None-Match` is present and one of its tags
/// pairs with the current validator. `If-Modified-Since` applies only when
/// `If-None-Match` is absent: 304 when the file's modification time is
/// strictly earlier than the header time plus a one-second tolerance.
pub fn evaluate(
    meta: &Metadata,
    headers: &HeaderMap,
    algorithm: EtagAlgorithm,
    fallback: Option<&str>,
) -> Conditional {
    let validator = file_validator(meta, algorithm, fallback);

    let client_etags = headers.get(IF_NONE_MATCH).and_then(|v| v.to_str().ok());
    let not_modified = if !validator.has_value() {
        false
    } else if client_etags.is_some() {
        !if_none_match(client_etags, validator.etag.as_deref())
    } else {
        let since = headers
            .get(IF_MODIFIED_SINCE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| parse_http_date(v).ok());
        match (validator.last_modified, since) {
            (Some(modified), Some(since)) => modified < since + Duration::from_secs(1),
            _ => false,
        }
    };

    Conditional {
        validator,
        not_modified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpdate::fmt_http_date;
    use hyper::header::HeaderValue;
    use std::io::Write;

    fn temp_file_metadata(content: &[u8]) -> (tempfile::TempDir, Metadata) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content).unwrap();
        let meta = std::fs::metadata(&path).unwrap();
        (dir, meta)
    }

    #[test]
    fn test_strong_etag_is_quoted_and_stable() {
        let mtime = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let a = strong_etag(mtime, 42, EtagAlgorithm::Sha256);
        let b = strong_etag(mtime, 42, EtagAlgorithm::Sha256);
        assert_eq!(a, b);
        assert!(a.starts_with('"') && a.ends_with('"'));
        // Different size, different tag
        assert_ne!(a, strong_etag(mtime, 43, EtagAlgorithm::Sha256));
        // Different algorithm, different tag
        assert_ne!(a, strong_etag(mtime, 42, EtagAlgorithm::Sha512));
    }

    #[test]
    fn test_weak_etag_prefix() {
        let tag = weak_etag("deploy-1", EtagAlgorithm::Sha256);
        assert!(tag.starts_with("W/\""));
        assert!(tag.ends_with('"'));
    }

    #[test]
    fn test_if_none_match_pairing() {
        let etag = Some("\"abc\"");
        // No header or no validator: client copy counts as stale
        assert!(if_none_match(None, etag));
        assert!(if_none_match(Some("\"abc\""), None));
        // Exact and listed matches
        assert!(!if_none_match(Some("\"abc\""), etag));
        assert!(!if_none_match(Some("\"xyz\", \"abc\""), etag));
        // Wildcard pairs with anything
        assert!(!if_none_match(Some("*"), etag));
        // Weak comparison ignores W/ on either side
        assert!(!if_none_match(Some("W/\"abc\""), etag));
        assert!(!if_none_match(Some("\"abc\""), Some("W/\"abc\"")));
        // Mismatch
        assert!(if_none_match(Some("\"other\""), etag));
    }

    #[test]
    fn test_evaluate_if_none_match_hit() {
        let (_dir, meta) = temp_file_metadata(b"hello");
        let first = evaluate(&meta, &HeaderMap::new(), EtagAlgorithm::Sha256, None);
        assert!(!first.not_modified);
        let etag = first.validator.etag.unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_str(&etag).unwrap());
        let second = evaluate(&meta, &headers, EtagAlgorithm::Sha256, None);
        assert!(second.not_modified);
    }

    #[test]
    fn test_evaluate_if_modified_since() {
        let (_dir, meta) = temp_file_metadata(b"hello");
        let modified = meta.modified().unwrap();

        // A cached copy as fresh as the file itself: 304 thanks to the
        // one-second tolerance.
        let mut headers = HeaderMap::new();
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(modified)).unwrap(),
        );
        assert!(
            evaluate(&meta, &headers, EtagAlgorithm::Sha256, None).not_modified
        );

        // A copy from well before the modification: stale, serve the body.
        let mut headers = HeaderMap::new();
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(modified - Duration::from_secs(3600))).unwrap(),
        );
        assert!(
            !evaluate(&meta, &headers, EtagAlgorithm::Sha256, None).not_modified
        );
    }

    #[test]
    fn test_if_none_match_takes_precedence() {
        let (_dir, meta) = temp_file_metadata(b"hello");
        let modified = meta.modified().unwrap();

        // Non-matching If-None-Match wins over a matching If-Modified-Since.
        let mut headers = HeaderMap::new();
        headers.insert(IF_NONE_MATCH, HeaderValue::from_static("\"stale\""));
        headers.insert(
            IF_MODIFIED_SINCE,
            HeaderValue::from_str(&fmt_http_date(modified)).unwrap(),
        );
        assert!(
            !evaluate(&meta, &headers, EtagAlgorithm::Sha256, None).not_modified
        );
    }
}
