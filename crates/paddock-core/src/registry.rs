//! Process-scoped registry of authenticated hypervisor handles.
//!
//! One [`HostRegistry`] is built at startup and shared by reference into both
//! entry points (chat dispatch and the HTTP handlers). The map is guarded by a
//! read-write lock; handles are replaced wholesale on reconnect, never mutated
//! in place.

use paddock_pve::{Connect, HostApi};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry of live handles, keyed by configured host identifier.
///
/// Invariant: every entry present was successfully authenticated at some
/// point. A host that fails its initial connection is simply absent (logged,
/// non-fatal) until something asks for it again via [`reconnect`].
///
/// Validity is never cached. Callers that need freshness probe the handle
/// with [`is_valid`] and then call [`reconnect`] themselves — probing before
/// every operation trades latency for freshness, so it is opt-in per call
/// site. There is exactly one reconnect attempt per validation failure.
///
/// [`reconnect`]: Self::reconnect
/// [`is_valid`]: Self::is_valid
pub struct HostRegistry {
    connector: Arc<dyn Connect>,
    hosts: Vec<String>,
    handles: RwLock<HashMap<String, Arc<dyn HostApi>>>,
}

impl HostRegistry {
    /// Connect to every configured host, omitting the ones that fail.
    ///
    /// Partial failure — even total failure — is not an error: hosts come and
    /// go, and each is independently recoverable later.
    pub async fn connect(connector: Arc<dyn Connect>, hosts: Vec<String>) -> Self {
        let mut handles = HashMap::new();
        for host in &hosts {
            match connector.connect(host).await {
                Ok(handle) => {
                    tracing::info!(host = %host, "Connected to hypervisor host");
                    handles.insert(host.clone(), handle);
                }
                Err(error) => {
                    tracing::warn!(host = %host, %error, "Initial connection failed, omitting host");
                }
            }
        }

        tracing::info!(
            connected = handles.len(),
            configured = hosts.len(),
            "Host registry initialized"
        );

        Self {
            connector,
            hosts,
            handles: RwLock::new(handles),
        }
    }

    /// Configured host identifiers, in configuration order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Current handle for `host`, or `None` if absent.
    ///
    /// Never triggers a reconnect; callers needing freshness must probe with
    /// [`is_valid`](Self::is_valid) and call [`reconnect`](Self::reconnect)
    /// explicitly.
    pub async fn get(&self, host: &str) -> Option<Arc<dyn HostApi>> {
        self.handles.read().await.get(host).cloned()
    }

    /// Probe a handle with a cheap read-only call.
    ///
    /// Returns false on any error; never propagates.
    pub async fn is_valid(handle: &Arc<dyn HostApi>) -> bool {
        match handle.list_nodes().await {
            Ok(_) => true,
            Err(error) => {
                tracing::warn!(%error, "Handle validation failed");
                false
            }
        }
    }

    /// Re-authenticate a single host, replacing its entry wholesale.
    ///
    /// On failure the stale entry is removed so later callers see the host as
    /// disconnected rather than holding a dead handle.
    pub async fn reconnect(&self, host: &str) -> bool {
        tracing::info!(host, "Reconnecting to hypervisor host");
        match self.connector.connect(host).await {
            Ok(handle) => {
                self.handles.write().await.insert(host.to_string(), handle);
                tracing::info!(host, "Reconnected");
                true
            }
            Err(error) => {
                tracing::error!(host, %error, "Reconnect failed, dropping stale handle");
                self.handles.write().await.remove(host);
                false
            }
        }
    }

    /// Number of hosts currently holding a handle.
    pub async fn connected_count(&self) -> usize {
        self.handles.read().await.len()
    }
}
