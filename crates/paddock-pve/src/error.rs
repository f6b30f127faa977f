//! Error types for paddock-pve.

use thiserror::Error;

/// Result type alias for Proxmox API operations.
pub type Result<T> = std::result::Result<T, PveError>;

/// Errors that can occur while talking to a Proxmox VE host.
#[derive(Debug, Error)]
pub enum PveError {
    /// Transport-level failure (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code returned by the API
        status: u16,
        /// Response body, as far as it could be read
        message: String,
    },

    /// Authentication was rejected or the ticket response was unusable.
    #[error("authentication failed for {0}")]
    Auth(String),

    /// A response body did not decode into the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The `data` envelope was empty where a payload was required.
    #[error("missing data in response from {0}")]
    MissingData(String),
}
