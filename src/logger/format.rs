//! Access log format module
//!
//! Formats one line per terminal response. Supported formats:
//! - `plain` - `[2024-05-15 15:34:21] [GET] /path?query 200`
//! - `json` - one JSON object per line
//! - anything else is treated as a custom pattern with `$variables`

use chrono::{DateTime, Local};

/// One access-log line: timestamp, method, path, query and final status.
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    /// Response timestamp
    pub time: DateTime<Local>,
    /// HTTP method
    pub method: String,
    /// Request URI path (as received, undecoded)
    pub path: String,
    /// Query string without the leading `?`
    pub query: Option<String>,
    /// Response status code
    pub status: u16,
}

impl AccessLogEntry {
    /// Create an entry stamped with the current local time.
    pub fn new(method: &str, path: &str, query: Option<&str>, status: u16) -> Self {
        Self {
            time: Local::now(),
            method: method.to_owned(),
            path: path.to_owned(),
            query: query.map(str::to_owned),
            status,
        }
    }

    /// Format the entry according to the configured access-log format.
    pub fn format(&self, format: &str) -> String {
        match format {
            "plain" => self.format_plain(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(query) => format!("{}?{}", self.path, query),
            None => self.path.clone(),
        }
    }

    /// `[2024-05-15 15:34:21] [GET] /path?query 200`
    fn format_plain(&self) -> String {
        format!(
            "[{}] [{}] {} {}",
            self.time.format("%Y-%m-%d %H:%M:%S"),
            self.method,
            self.request_uri(),
            self.status,
        )
    }

    /// JSON structured log format
    fn format_json(&self) -> String {
        // Manual JSON building; the shape is too small to warrant serde
        let query_json = self
            .query
            .as_ref()
            .map_or_else(|| "null".to_string(), |q| format!("\"{}\"", escape_json(q)));

        format!(
            r#"{{"time":"{}","method":"{}","path":"{}","query":{},"status":{}}}"#,
            self.time.to_rfc3339(),
            escape_json(&self.method),
            escape_json(&self.path),
            query_json,
            self.status,
        )
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables:
    /// - `$time_iso8601` - ISO 8601 timestamp
    /// - `$request_method` - HTTP method
    /// - `$request_uri` - path with query string
    /// - `$status` - response status code
    fn format_custom(&self, pattern: &str) -> String {
        pattern
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.request_uri())
            .replace("$status", &self.status.to_string())
    }
}

/// Escape special characters for a JSON string value
fn escape_json(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        AccessLogEntry::new("GET", "/docs/index.html", Some("page=1"), 200)
    }

    #[test]
    fn test_format_plain() {
        let log = create_test_entry().format("plain");
        assert!(log.contains("[GET]"));
        assert!(log.contains("/docs/index.html?page=1 200"));
    }

    #[test]
    fn test_format_plain_without_query() {
        let entry = AccessLogEntry::new("GET", "/docs", None, 301);
        let log = entry.format("plain");
        assert!(log.contains("/docs 301"));
        assert!(!log.contains('?'));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        assert!(log.contains(r#""method":"GET""#));
        assert!(log.contains(r#""path":"/docs/index.html""#));
        assert!(log.contains(r#""query":"page=1""#));
        assert!(log.contains(r#""status":200"#));
    }

    #[test]
    fn test_format_custom() {
        let log = create_test_entry().format("$request_method $request_uri -> $status");
        assert_eq!(log, "GET /docs/index.html?page=1 -> 200");
    }
}
