//! HTTP protocol layer module
//!
//! The pure pieces of the protocol surface: range parsing, path
//! resolution, cache validation and response building. Everything here is
//! independent of the filesystem layout and the serving policy.

pub mod cache;
pub mod path;
pub mod range;
pub mod response;
