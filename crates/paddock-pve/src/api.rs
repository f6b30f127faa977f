//! Trait seams over the Proxmox client.
//!
//! Everything above this crate programs against [`HostApi`] and [`Connect`]
//! so registry, aggregation and provisioning logic can be exercised with mock
//! hosts instead of a live cluster.

use crate::client::{Credentials, PveClient};
use crate::error::Result;
use crate::types::{CreateVmRequest, NodeEntry, VmConfig, VmEntry, VmStatus};
use async_trait::async_trait;
use std::sync::Arc;

/// Operations the bridge needs from one hypervisor host.
///
/// This is intentionally the full surface and nothing more: node listing,
/// per-node VM listing, per-VM status/config reads, config writes and start.
#[async_trait]
pub trait HostApi: Send + Sync {
    /// List all sub-nodes behind this host's management plane.
    async fn list_nodes(&self) -> Result<Vec<NodeEntry>>;

    /// List all VMs on one sub-node.
    async fn list_vms(&self, node: &str) -> Result<Vec<VmEntry>>;

    /// Fetch the current run state of one VM.
    async fn vm_status(&self, node: &str, vmid: u32) -> Result<VmStatus>;

    /// Fetch the full configuration map of one VM.
    async fn vm_config(&self, node: &str, vmid: u32) -> Result<VmConfig>;

    /// Create a VM.
    async fn create_vm(&self, node: &str, request: &CreateVmRequest) -> Result<()>;

    /// Set configuration entries on an existing VM.
    async fn set_vm_config(&self, node: &str, vmid: u32, entries: &[(String, String)])
        -> Result<()>;

    /// Start a VM.
    async fn start_vm(&self, node: &str, vmid: u32) -> Result<()>;
}

#[async_trait]
impl HostApi for PveClient {
    async fn list_nodes(&self) -> Result<Vec<NodeEntry>> {
        PveClient::list_nodes(self).await
    }

    async fn list_vms(&self, node: &str) -> Result<Vec<VmEntry>> {
        PveClient::list_vms(self, node).await
    }

    async fn vm_status(&self, node: &str, vmid: u32) -> Result<VmStatus> {
        PveClient::vm_status(self, node, vmid).await
    }

    async fn vm_config(&self, node: &str, vmid: u32) -> Result<VmConfig> {
        PveClient::vm_config(self, node, vmid).await
    }

    async fn create_vm(&self, node: &str, request: &CreateVmRequest) -> Result<()> {
        PveClient::create_vm(self, node, request).await
    }

    async fn set_vm_config(
        &self,
        node: &str,
        vmid: u32,
        entries: &[(String, String)],
    ) -> Result<()> {
        PveClient::set_vm_config(self, node, vmid, entries).await
    }

    async fn start_vm(&self, node: &str, vmid: u32) -> Result<()> {
        PveClient::start_vm(self, node, vmid).await
    }
}

/// Factory for authenticated host handles.
///
/// The registry goes through this seam both at startup and on reconnect, so
/// tests can swap in connectors that fail for chosen hosts.
#[async_trait]
pub trait Connect: Send + Sync {
    /// Establish a fresh authenticated handle for `host`.
    async fn connect(&self, host: &str) -> Result<Arc<dyn HostApi>>;
}

/// Production connector: ticket-authenticated [`PveClient`]s built from one
/// shared credential pair.
pub struct TicketConnector {
    credentials: Credentials,
}

impl TicketConnector {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl Connect for TicketConnector {
    async fn connect(&self, host: &str) -> Result<Arc<dyn HostApi>> {
        let client = PveClient::connect(host, &self.credentials).await?;
        Ok(Arc::new(client))
    }
}
