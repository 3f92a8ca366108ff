//! Configuration module
//!
//! Serve options, configuration file loading, CLI overrides and the shared
//! per-process application state. Precedence, lowest to highest: built-in
//! defaults, TOML configuration file, `DOCSERVE__*` environment variables,
//! command-line arguments.

use crate::http::cache::{self, EtagAlgorithm};
use crate::logger;
use crate::lookup::{DisabledLookup, KvLookup, VanityLookup};
use clap::Parser;
use hyper::header::{HeaderName, HeaderValue};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments. Every option mirrors a TOML key; CLI wins.
#[derive(Debug, Default, Parser)]
#[command(name = "docserve", version, about = "Serves a local directory over HTTP")]
pub struct Args {
    /// Directory to serve (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// URL prefix that must precede every request path
    #[arg(long)]
    pub url_root: Option<String>,

    /// Extra "Name: value" header set on every non-redirect response
    /// (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// Disable cross-origin resource sharing headers
    #[arg(long)]
    pub no_cors: bool,

    /// Suppress per-request logging
    #[arg(short, long)]
    pub quiet: bool,

    /// ETag digest algorithm (sha-256 or sha-512)
    #[arg(long)]
    pub etag_algorithm: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub serve: ServeConfig,
    pub logging: LoggingConfig,
    pub vanity: VanityConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Worker threads for the runtime; defaults to the CPU count
    #[serde(default)]
    pub workers: Option<usize>,
}

/// Serving options, applied per request
#[derive(Debug, Clone, Deserialize)]
pub struct ServeConfig {
    /// Base directory for path resolution
    pub fs_root: PathBuf,
    /// Mandatory URL prefix, stripped before resolution
    #[serde(default)]
    pub url_root: Option<String>,
    /// Suppress per-request logging
    pub quiet: bool,
    /// Append CORS headers to non-redirect responses
    pub cors: bool,
    /// Digest used for strong validators
    pub etag_algorithm: EtagAlgorithm,
    /// `Server` header value
    pub server_name: String,
    /// Raw `"Name: value"` specs appended to every non-redirect response
    #[serde(default)]
    pub headers: Vec<String>,
    /// Index file candidates for directory requests, in order
    #[serde(default = "default_index_files")]
    pub index_files: Vec<String>,
}

fn default_index_files() -> Vec<String> {
    vec!["index.html".to_string()]
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Access log format: `plain`, `json`, or a `$variable` pattern
    pub access_log_format: String,
    /// Access log file path (stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// Vanity import configuration
#[derive(Debug, Clone, Deserialize)]
pub struct VanityConfig {
    /// Host under which modules are imported, e.g. `example.dev`
    pub host: String,
    /// Path to the sled store mapping module names to repositories;
    /// vanity pages are disabled when unset
    #[serde(default)]
    pub store: Option<PathBuf>,
}

impl Config {
    /// Load configuration: defaults, then the TOML file (required only when
    /// named explicitly), then environment variables, then CLI arguments.
    pub fn load(args: &Args) -> Result<Self, config::ConfigError> {
        let config_file = args.config.as_deref().unwrap_or("docserve");
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name(config_file).required(args.config.is_some()))
            .add_source(config::Environment::with_prefix("DOCSERVE").separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 4507)?
            .set_default("serve.fs_root", ".")?
            .set_default("serve.quiet", false)?
            .set_default("serve.cors", true)?
            .set_default("serve.etag_algorithm", "sha-256")?
            .set_default("serve.server_name", "docserve")?
            .set_default("logging.access_log_format", "plain")?
            .set_default("vanity.host", "localhost")?;

        if let Some(root) = &args.root {
            builder = builder.set_override("serve.fs_root", root.display().to_string())?;
        }
        if let Some(host) = &args.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = args.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url_root) = &args.url_root {
            builder = builder.set_override("serve.url_root", url_root.as_str())?;
        }
        if !args.headers.is_empty() {
            builder = builder.set_override("serve.headers", args.headers.clone())?;
        }
        if args.no_cors {
            builder = builder.set_override("serve.cors", false)?;
        }
        if args.quiet {
            builder = builder.set_override("serve.quiet", true)?;
        }
        if let Some(algorithm) = &args.etag_algorithm {
            builder = builder.set_override("serve.etag_algorithm", algorithm.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 4507,
                workers: None,
            },
            serve: ServeConfig {
                fs_root: PathBuf::from("."),
                url_root: None,
                quiet: false,
                cors: true,
                etag_algorithm: EtagAlgorithm::Sha256,
                server_name: "docserve".to_string(),
                headers: Vec::new(),
                index_files: vec!["index.html".to_string()],
            },
            logging: LoggingConfig {
                access_log_format: "plain".to_string(),
                access_log_file: None,
                error_log_file: None,
            },
            vanity: VanityConfig {
                host: "localhost".to_string(),
                store: None,
            },
        }
    }
}

/// Shared application state, read-only after startup.
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    /// Operator headers parsed from `serve.headers`
    pub extra_headers: Vec<(HeaderName, HeaderValue)>,
    /// Weak validator reused for every file lacking a modification time;
    /// derived from the deployment identifier once at startup
    pub fallback_etag: Option<String>,
    /// Vanity import lookup collaborator
    pub lookup: Arc<dyn VanityLookup>,
}

impl AppState {
    /// Build the process-wide state: parse operator headers, derive the
    /// weak fallback validator and open the vanity lookup store.
    pub fn new(config: Config, deployment_id: Option<&str>) -> Result<Self, sled::Error> {
        let fallback_etag = deployment_id
            .filter(|id| !id.is_empty())
            .map(|id| cache::weak_etag(id, config.serve.etag_algorithm));

        let lookup: Arc<dyn VanityLookup> = match &config.vanity.store {
            Some(path) => Arc::new(KvLookup::open(path)?),
            None => Arc::new(DisabledLookup),
        };

        let extra_headers = parse_extra_headers(&config.serve.headers);

        Ok(Self {
            config,
            extra_headers,
            fallback_etag,
            lookup,
        })
    }
}

/// Parse `"Name: value"` specs, skipping (with a warning) anything that is
/// not a valid HTTP header.
fn parse_extra_headers(specs: &[String]) -> Vec<(HeaderName, HeaderValue)> {
    let mut headers = Vec::with_capacity(specs.len());
    for spec in specs {
        let parsed = spec.split_once(':').and_then(|(name, value)| {
            let name = HeaderName::try_from(name.trim()).ok()?;
            let value = HeaderValue::try_from(value.trim()).ok()?;
            Some((name, value))
        });
        match parsed {
            Some(header) => headers.push(header),
            None => logger::log_warning(&format!("Ignoring malformed header option: {spec}")),
        }
    }
    headers
}
