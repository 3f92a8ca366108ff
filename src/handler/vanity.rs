//! Not-found and vanity import response module
//!
//! Requests whose path resolves to nothing get either a generic 404 page
//! or, for single-segment module-like paths with a lookup hit, a 200 HTML
//! page carrying `go-import` and `go-source` meta tags. Import-resolution
//! tooling fetches the page and reads the tags, so a hit must stay a 200
//! rather than a redirect.

use crate::config::AppState;
use crate::http::response::{build_html_response, Body};
use crate::logger;
use hyper::{Response, StatusCode};

/// Respond to a request whose path did not resolve to any file.
pub async fn not_found(path: &str, state: &AppState) -> Response<Body> {
    let server_name = state.config.serve.server_name.as_str();

    let Some(module) = module_name(path) else {
        return build_html_response(StatusCode::NOT_FOUND, not_found_page(), server_name);
    };

    match state.lookup.lookup(module).await {
        Ok(Some(repo)) => build_html_response(
            StatusCode::OK,
            vanity_page(&state.config.vanity.host, module, &repo),
            server_name,
        ),
        Ok(None) => build_html_response(StatusCode::NOT_FOUND, not_found_page(), server_name),
        Err(err) => {
            logger::log_error(&format!("Vanity lookup for {module:?} failed: {err}"));
            build_html_response(StatusCode::NOT_FOUND, not_found_page(), server_name)
        }
    }
}

/// A module path is a single segment of lowercase ASCII letters, digits and
/// hyphens, starting with a letter.
fn module_name(path: &str) -> Option<&str> {
    let name = path.strip_prefix('/')?;
    if name.is_empty() || name.contains('/') {
        return None;
    }
    if !name.as_bytes()[0].is_ascii_lowercase() {
        return None;
    }
    let plausible = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    plausible.then_some(name)
}

/// HTML page pointing import-resolution tooling at the real repository.
fn vanity_page(host: &str, module: &str, repo: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width" />
  <meta name="go-import" content="{host}/{module} git https://{repo}">
  <meta name="go-source" content="{host}/{module} https://{repo} https://{repo}/tree/main{{/dir}} https://{repo}/blob/main{{/dir}}/{{file}}#L{{line}}">
  <title>{host}/{module}</title>
</head>
<body>
  <a href="https://{host}">https://{host}</a>
</body>
</html>
"#
    )
}

fn not_found_page() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>404 Not Found</title>
</head>
<body>
  <h1>404 Not Found</h1>
</body>
</html>
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lookup::{DisabledLookup, LookupError, VanityLookup};
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use std::sync::Arc;

    #[derive(Debug)]
    struct StubLookup(Option<String>);

    #[async_trait]
    impl VanityLookup for StubLookup {
        async fn lookup(&self, _module: &str) -> Result<Option<String>, LookupError> {
            Ok(self.0.clone())
        }
    }

    fn state_with(lookup: Arc<dyn VanityLookup>) -> AppState {
        let mut config = Config::default();
        config.vanity.host = "example.dev".to_string();
        AppState {
            config,
            extra_headers: Vec::new(),
            fallback_etag: None,
            lookup,
        }
    }

    async fn body_string(response: Response<Body>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("/mymod"), Some("mymod"));
        assert_eq!(module_name("/my-mod2"), Some("my-mod2"));
        assert_eq!(module_name("/"), None);
        assert_eq!(module_name("/a/b"), None);
        assert_eq!(module_name("/2mod"), None);
        assert_eq!(module_name("/MyMod"), None);
        assert_eq!(module_name("/my_mod"), None);
    }

    #[tokio::test]
    async fn test_vanity_hit() {
        let state = state_with(Arc::new(StubLookup(Some(
            "github.com/org/mymod".to_string(),
        ))));
        let response = not_found("/mymod", &state).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains(
            r#"<meta name="go-import" content="example.dev/mymod git https://github.com/org/mymod">"#
        ));
        assert!(body.contains("go-source"));
        assert!(body.contains("https://github.com/org/mymod/tree/main{/dir}"));
    }

    #[tokio::test]
    async fn test_vanity_miss_is_404() {
        let state = state_with(Arc::new(DisabledLookup));
        let response = not_found("/mymod", &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_string(response).await.contains("404"));
    }

    #[tokio::test]
    async fn test_non_module_path_skips_lookup() {
        let state = state_with(Arc::new(StubLookup(Some("github.com/org/x".to_string()))));
        let response = not_found("/a/b/c", &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_lookup_failure_degrades_to_404() {
        #[derive(Debug)]
        struct FailingLookup;

        #[async_trait]
        impl VanityLookup for FailingLookup {
            async fn lookup(&self, _module: &str) -> Result<Option<String>, LookupError> {
                Err(LookupError::Cancelled)
            }
        }

        let state = state_with(Arc::new(FailingLookup));
        let response = not_found("/mymod", &state).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
