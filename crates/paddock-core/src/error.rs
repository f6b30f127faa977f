//! Error types for paddock-core.

use crate::provision::ProvisionStep;
use paddock_pve::PveError;
use thiserror::Error;

/// Result type alias for core bridge operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors surfaced by registry, aggregation and provisioning operations.
///
/// None of these are fatal: every caller renders them into a reply or an
/// HTTP response and keeps serving.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The host has no registry entry and no reconnect was attempted.
    #[error("host {0} is not connected")]
    HostNotConnected(String),

    /// The host's handle was stale and the single reconnect attempt failed.
    #[error("cannot connect to host {0}")]
    HostUnavailable(String),

    /// Node or VM enumeration failed; the whole host scan is aborted.
    #[error("enumerating guests on {host} failed: {source}")]
    Enumeration {
        host: String,
        #[source]
        source: PveError,
    },

    /// A provisioning step failed. Steps already completed are not undone.
    #[error("provisioning failed at {step}: {source}")]
    Provision {
        step: ProvisionStep,
        #[source]
        source: PveError,
    },
}
