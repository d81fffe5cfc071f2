// ABOUTME: Crate-level error types for healthping.
// ABOUTME: Uses thiserror for ergonomic error handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme {scheme:?} in {endpoint} (expected http or https)")]
    UnsupportedScheme { endpoint: String, scheme: String },
}

pub type Result<T> = std::result::Result<T, Error>;
