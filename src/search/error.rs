//! Retrieval provider errors

use thiserror::Error;

/// Errors surfaced by the retrieval backends
///
/// The evidence gatherer absorbs these into an empty result set; they
/// only propagate from client constructors and the health check.
#[derive(Debug, Error)]
pub enum SearchError {
    /// HTTP transport failure
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider rejected the request
    #[error("provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// Provider response could not be decoded
    #[error("failed to decode provider response: {0}")]
    Decode(String),
}
