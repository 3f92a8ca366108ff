//! HTTP Range request parsing module
//!
//! Single-range `Range` header parsing against a known file size.

/// Byte interval requested by a `Range` header.
///
/// Bounds are inclusive and deliberately unclamped: the suffix form
/// `bytes=-N` with `N` larger than the file yields a negative `start`.
/// Clamping and satisfiability checks are the response builder's job and
/// decide between 200, 206 and 416.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First requested byte offset
    pub start: i64,
    /// Last requested byte offset (inclusive)
    pub end: i64,
}

/// Parse an HTTP `Range` header value (single range, bytes unit only)
///
/// Supported forms:
/// - `bytes=0-99` - explicit interval, returned as-is
/// - `bytes=100-` - from offset 100 to the end of the file
/// - `bytes=-100` - the last 100 bytes
///
/// Multi-range values (`bytes=0-10, 20-30`) and anything else that does not
/// match the single-range grammar return `None`; the caller falls back to a
/// whole-file response.
///
/// # Examples
/// ```
/// use docserve::http::range::{parse_range_header, ByteRange};
///
/// assert_eq!(
///     parse_range_header("bytes=0-", 500),
///     Some(ByteRange { start: 0, end: 499 })
/// );
/// assert_eq!(
///     parse_range_header("bytes=-100", 500),
///     Some(ByteRange { start: 400, end: 499 })
/// );
/// assert_eq!(parse_range_header("bytes=invalid", 500), None);
/// ```
pub fn parse_range_header(value: &str, file_size: u64) -> Option<ByteRange> {
    let size = i64::try_from(file_size).ok()?;
    let rest = value.trim().strip_prefix("bytes=")?;
    let (start, end) = rest.split_once('-')?;
    let (start, end) = (start.trim(), end.trim());

    match (parse_bound(start), parse_bound(end)) {
        (Some(start), Some(end)) => Some(ByteRange { start, end }),
        (Some(start), None) if end.is_empty() => Some(ByteRange {
            start,
            end: size - 1,
        }),
        (None, Some(suffix)) if start.is_empty() => Some(ByteRange {
            start: size - suffix,
            end: size - 1,
        }),
        _ => None,
    }
}

/// A bound is a plain run of ASCII digits; signs and anything fancier are
/// rejected so `str::parse` cannot widen the accepted grammar.
fn parse_bound(bound: &str) -> Option<i64> {
    if bound.is_empty() || !bound.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    bound.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_range() {
        assert_eq!(
            parse_range_header("bytes=0-99", 1000),
            Some(ByteRange { start: 0, end: 99 })
        );
        // The parser does not clamp; out-of-bounds intervals pass through.
        assert_eq!(
            parse_range_header("bytes=10-10000", 500),
            Some(ByteRange {
                start: 10,
                end: 10000
            })
        );
        assert_eq!(
            parse_range_header("bytes=5-2", 500),
            Some(ByteRange { start: 5, end: 2 })
        );
    }

    #[test]
    fn test_open_range() {
        assert_eq!(
            parse_range_header("bytes=0-", 500),
            Some(ByteRange { start: 0, end: 499 })
        );
        assert_eq!(
            parse_range_header("bytes=400-", 500),
            Some(ByteRange {
                start: 400,
                end: 499
            })
        );
    }

    #[test]
    fn test_suffix_range() {
        assert_eq!(
            parse_range_header("bytes=-100", 500),
            Some(ByteRange {
                start: 400,
                end: 499
            })
        );
        // A suffix longer than the file goes negative; the response builder
        // clamps it back to the start of the file.
        assert_eq!(
            parse_range_header("bytes=-2000", 500),
            Some(ByteRange {
                start: -1500,
                end: 499
            })
        );
    }

    #[test]
    fn test_unparseable() {
        assert_eq!(parse_range_header("bytes=invalid", 500), None);
        assert_eq!(parse_range_header("bytes=-", 500), None);
        assert_eq!(parse_range_header("bytes=", 500), None);
        assert_eq!(parse_range_header("0-99", 500), None);
        assert_eq!(parse_range_header("items=0-99", 500), None);
        assert_eq!(parse_range_header("bytes=+5-9", 500), None);
    }

    #[test]
    fn test_multiple_ranges_unsupported() {
        assert_eq!(parse_range_header("bytes=0-10, 20-30", 500), None);
        assert_eq!(parse_range_header("bytes=0-10,20-30", 500), None);
    }

    #[test]
    fn test_whitespace_tolerated() {
        assert_eq!(
            parse_range_header(" bytes=0 - 99 ", 500),
            Some(ByteRange { start: 0, end: 99 })
        );
    }
}
