//! GPU workstation provisioning.
//!
//! Issues the create → attach-GPU → start sequence against one host. The
//! sequence is not transactional: a failed step surfaces the hypervisor's
//! error verbatim and completed steps are not undone.

use crate::error::{CoreError, Result};
use crate::registry::HostRegistry;
use paddock_pve::CreateVmRequest;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied description of the VM to create.
///
/// Validated only by the upstream API; the bridge adds no schema of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmSpec {
    /// Target host identifier (must be a registry entry).
    pub host: String,
    /// Numeric VM id, unique per host.
    pub vmid: u32,
    pub name: String,
    pub cores: u32,
    pub memory_mb: u32,
    pub disk_gb: u32,
    /// PCI address of the GPU to pass through (e.g. `0000:81:00`).
    pub gpu_pci_id: String,
}

/// Which step of the provisioning sequence failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
    Create,
    AttachGpu,
    Start,
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => write!(f, "creation"),
            Self::AttachGpu => write!(f, "GPU attach"),
            Self::Start => write!(f, "start"),
        }
    }
}

/// Create, configure and start a VM with GPU passthrough.
///
/// Fails immediately (before any API call) if the target host has no registry
/// entry. The GPU is attached as `hostpci0` with PCIe and primary-display
/// flags enabled.
pub async fn provision_vm(registry: &HostRegistry, spec: &VmSpec) -> Result<String> {
    let handle = registry
        .get(&spec.host)
        .await
        .ok_or_else(|| CoreError::HostNotConnected(spec.host.clone()))?;

    tracing::info!(
        host = %spec.host,
        vmid = spec.vmid,
        name = %spec.name,
        cores = spec.cores,
        memory_mb = spec.memory_mb,
        disk_gb = spec.disk_gb,
        gpu = %spec.gpu_pci_id,
        "Provisioning VM"
    );

    let request = CreateVmRequest::with_defaults(
        spec.vmid,
        &spec.name,
        spec.cores,
        spec.memory_mb,
        spec.disk_gb,
    );
    handle
        .create_vm(&spec.host, &request)
        .await
        .map_err(|source| CoreError::Provision {
            step: ProvisionStep::Create,
            source,
        })?;
    tracing::debug!(vmid = spec.vmid, "VM created");

    let passthrough = (
        "hostpci0".to_string(),
        format!("{},pcie=1,x-vga=1", spec.gpu_pci_id),
    );
    if let Err(source) = handle
        .set_vm_config(&spec.host, spec.vmid, &[passthrough])
        .await
    {
        tracing::warn!(
            host = %spec.host,
            vmid = spec.vmid,
            "VM left behind after failed GPU attach; manual cleanup may be needed"
        );
        return Err(CoreError::Provision {
            step: ProvisionStep::AttachGpu,
            source,
        });
    }
    tracing::debug!(vmid = spec.vmid, gpu = %spec.gpu_pci_id, "GPU attached");

    if let Err(source) = handle.start_vm(&spec.host, spec.vmid).await {
        tracing::warn!(
            host = %spec.host,
            vmid = spec.vmid,
            "VM left behind after failed start; manual cleanup may be needed"
        );
        return Err(CoreError::Provision {
            step: ProvisionStep::Start,
            source,
        });
    }

    tracing::info!(host = %spec.host, vmid = spec.vmid, name = %spec.name, "VM provisioned");
    Ok(format!(
        "virtual machine {} ({}) created and started on {}",
        spec.name, spec.vmid, spec.host
    ))
}
