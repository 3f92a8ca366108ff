//! Vanity import lookup module
//!
//! The one piece of external mutable state the server consults: an
//! asynchronous key-value read mapping a module name to its source
//! repository location. The interface is pluggable so deployments without a
//! store run with the lookup disabled outright; the server never writes to
//! the store.

use async_trait::async_trait;
use std::fmt::Debug;
use std::path::Path;
use thiserror::Error;

/// Failures surfaced by a lookup backend. Lookups are fallible and slow by
/// contract; the caller degrades them to a plain 404.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),
    #[error("stored value is not valid UTF-8")]
    Encoding,
    #[error("lookup task was cancelled")]
    Cancelled,
}

/// Asynchronous module-name to repository lookup.
#[async_trait]
pub trait VanityLookup: Debug + Send + Sync {
    /// Resolve a module name to a repository location such as
    /// `github.com/org/mod`. `None` means the module is unknown.
    async fn lookup(&self, module: &str) -> Result<Option<String>, LookupError>;
}

/// Lookup that never resolves anything; vanity pages are effectively off.
#[derive(Debug, Default)]
pub struct DisabledLookup;

#[async_trait]
impl VanityLookup for DisabledLookup {
    async fn lookup(&self, _module: &str) -> Result<Option<String>, LookupError> {
        Ok(None)
    }
}

/// Lookup backed by a sled store maintained by an external process.
#[derive(Debug, Clone)]
pub struct KvLookup {
    db: sled::Db,
}

impl KvLookup {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, sled::Error> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }
}

#[async_trait]
impl VanityLookup for KvLookup {
    async fn lookup(&self, module: &str) -> Result<Option<String>, LookupError> {
        let db = self.db.clone();
        let key = module.to_owned();
        // sled reads may touch disk; keep them off the request workers.
        let value = tokio::task::spawn_blocking(move || db.get(key))
            .await
            .map_err(|_| LookupError::Cancelled)??;
        match value {
            Some(raw) => String::from_utf8(raw.to_vec())
                .map(Some)
                .map_err(|_| LookupError::Encoding),
            None => Ok(None),
        }
    }
}
