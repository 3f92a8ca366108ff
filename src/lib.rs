//! docserve - static documentation site server
//!
//! Serves a directory tree over HTTP with safe path resolution, canonical-
//! URL redirects, conditional requests (`ETag` / `Last-Modified`), byte
//! ranges, directory index fallback, and vanity go-import pages for
//! unmatched module paths backed by an external key-value store.
//!
//! The crate is a thin library around [`handler::handle_request`] plus the
//! daemon pieces (`config`, `logger`, `server`) that `main` wires together.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod lookup;
pub mod server;
