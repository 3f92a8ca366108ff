//! Request handler module
//!
//! Request orchestration and the static-file and vanity responders.

pub mod serve;
pub mod static_files;
pub mod vanity;

pub use serve::handle_request;

use thiserror::Error;

/// Error taxonomy for a single request. No variant is ever fatal to the
/// process; each is scoped to the request that raised it.
#[derive(Debug, Error)]
pub enum ServeError {
    /// Request path failed percent-decoding; mapped to 400
    #[error("malformed request path")]
    MalformedPath,
    /// Target does not exist; recovered into a 404 or vanity response
    #[error("no such file or directory")]
    NotFound,
    /// Any other filesystem failure; mapped to 500, detail stays in the
    /// server-side log
    #[error("i/o failure: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for ServeError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(err)
        }
    }
}
