//! Per-host GPU usage aggregation.
//!
//! Walks every sub-node behind a host's management plane, inspects each
//! running VM's configuration and reports which VMs hold PCI passthrough
//! devices. Records are built fresh per query and never cached.

use crate::error::{CoreError, Result};
use crate::registry::HostRegistry;
use paddock_pve::{HostApi, VmEntry};
use serde::{Deserialize, Serialize};

/// GPU usage of one running VM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpuUsageRecord {
    /// VM name as reported by the hypervisor.
    pub vm_name: String,
    /// Raw passthrough descriptors, one per assigned device.
    pub pci_devices: Vec<String>,
    /// Number of GPUs this VM holds (= number of descriptors).
    pub used_gpus: u32,
}

/// GPU usage summary for one host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostReport {
    /// Host identifier the report was collected from.
    pub host: String,
    /// Running VMs holding at least one passthrough device, in scan order.
    pub vms: Vec<GpuUsageRecord>,
    /// Total GPUs in use on this host; equals the sum of the per-VM counts.
    pub used_gpus: u32,
}

/// Collect the GPU usage report for one host.
///
/// Resolves the host's handle, probing it first and reconnecting at most once
/// if the probe fails. A fault while inspecting a single VM skips that VM and
/// keeps scanning; a fault in node or VM enumeration aborts the whole call.
///
/// A host with no sub-nodes or no running VMs yields an empty report, not an
/// error.
pub async fn gpu_status(registry: &HostRegistry, host: &str) -> Result<HostReport> {
    tracing::info!(host, "Collecting GPU status");

    let mut handle = registry.get(host).await;
    let valid = match &handle {
        Some(handle) => HostRegistry::is_valid(handle).await,
        None => false,
    };
    if !valid {
        tracing::warn!(host, "Handle missing or stale, attempting reconnect");
        if !registry.reconnect(host).await {
            return Err(CoreError::HostUnavailable(host.to_string()));
        }
        handle = registry.get(host).await;
    }
    let Some(handle) = handle else {
        return Err(CoreError::HostUnavailable(host.to_string()));
    };

    let enumeration = |source| CoreError::Enumeration {
        host: host.to_string(),
        source,
    };

    let nodes = handle.list_nodes().await.map_err(enumeration)?;
    tracing::debug!(host, nodes = nodes.len(), "Enumerated sub-nodes");

    let mut vms = Vec::new();
    let mut used_gpus = 0u32;

    for node in &nodes {
        let entries = handle.list_vms(&node.node).await.map_err(enumeration)?;
        tracing::debug!(host, node = %node.node, vms = entries.len(), "Scanning node");

        for vm in entries {
            match scan_vm(handle.as_ref(), &node.node, &vm).await {
                Ok(Some(record)) => {
                    used_gpus += record.used_gpus;
                    vms.push(record);
                }
                Ok(None) => {}
                Err(error) => {
                    // One VM's fault must not take down the host report.
                    tracing::warn!(
                        host,
                        node = %node.node,
                        vmid = vm.vmid,
                        %error,
                        "Skipping VM after fault"
                    );
                }
            }
        }
    }

    tracing::info!(host, used_gpus, vms = vms.len(), "GPU status collected");
    Ok(HostReport {
        host: host.to_string(),
        vms,
        used_gpus,
    })
}

/// Inspect one VM; `None` means "not part of the report" (not running, or no
/// passthrough devices).
async fn scan_vm(
    handle: &dyn HostApi,
    node: &str,
    vm: &VmEntry,
) -> paddock_pve::Result<Option<GpuUsageRecord>> {
    let status = handle.vm_status(node, vm.vmid).await?;
    if !status.is_running() {
        return Ok(None);
    }

    let config = handle.vm_config(node, vm.vmid).await?;
    let pci_devices = config.passthrough_devices();
    if pci_devices.is_empty() {
        return Ok(None);
    }

    let used_gpus = pci_devices.len() as u32;
    tracing::debug!(node, vmid = vm.vmid, name = %vm.name, gpus = used_gpus, "VM holds GPUs");
    Ok(Some(GpuUsageRecord {
        vm_name: vm.name.clone(),
        pci_devices,
        used_gpus,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockConnector, MockHost};
    use std::sync::Arc;

    async fn registry_with(host: &str, mock: Arc<MockHost>) -> HostRegistry {
        let connector = Arc::new(MockConnector::new());
        connector.add(host, mock);
        HostRegistry::connect(connector, vec![host.to_string()]).await
    }

    #[tokio::test]
    async fn test_empty_host_is_success() {
        let mock = Arc::new(MockHost::healthy());
        let registry = registry_with("pve1", mock).await;

        let report = gpu_status(&registry, "pve1").await.unwrap();
        assert_eq!(report.host, "pve1");
        assert!(report.vms.is_empty());
        assert_eq!(report.used_gpus, 0);
    }

    #[tokio::test]
    async fn test_running_with_passthrough_included() {
        // A is running with 2 passthrough keys; B is stopped with 1
        let mock = Arc::new(MockHost::healthy());
        mock.add_vm("node1", 100, "A", "running", &["0000:81:00", "0000:82:00"]);
        mock.add_vm("node1", 101, "B", "stopped", &["0000:83:00"]);
        let registry = registry_with("pve1", mock).await;

        let report = gpu_status(&registry, "pve1").await.unwrap();
        assert_eq!(report.vms.len(), 1);
        assert_eq!(report.vms[0].vm_name, "A");
        assert_eq!(report.vms[0].used_gpus, 2);
        assert_eq!(report.used_gpus, 2);
    }

    #[tokio::test]
    async fn test_running_without_passthrough_excluded() {
        let mock = Arc::new(MockHost::healthy());
        mock.add_vm("node1", 100, "cpu-only", "running", &[]);
        let registry = registry_with("pve1", mock).await;

        let report = gpu_status(&registry, "pve1").await.unwrap();
        assert!(report.vms.is_empty());
        assert_eq!(report.used_gpus, 0);
    }

    #[tokio::test]
    async fn test_host_count_equals_sum_of_vm_counts() {
        let mock = Arc::new(MockHost::healthy());
        mock.add_node("node2");
        mock.add_vm("node1", 100, "A", "running", &["0000:81:00"]);
        mock.add_vm("node1", 101, "B", "running", &["0000:82:00", "0000:83:00"]);
        mock.add_vm("node2", 200, "C", "running", &["0000:01:00"]);
        let registry = registry_with("pve1", mock).await;

        let report = gpu_status(&registry, "pve1").await.unwrap();
        let sum: u32 = report.vms.iter().map(|vm| vm.used_gpus).sum();
        assert_eq!(report.used_gpus, sum);
        assert_eq!(report.used_gpus, 4);
    }

    #[tokio::test]
    async fn test_faulty_vm_is_skipped_not_fatal() {
        let mock = Arc::new(MockHost::healthy());
        mock.add_vm("node1", 100, "good", "running", &["0000:81:00"]);
        mock.add_vm("node1", 101, "bad", "running", &["0000:82:00"]);
        mock.fail_config_for(101);
        let registry = registry_with("pve1", mock).await;

        let report = gpu_status(&registry, "pve1").await.unwrap();
        assert_eq!(report.vms.len(), 1);
        assert_eq!(report.vms[0].vm_name, "good");
        assert_eq!(report.used_gpus, 1);
    }

    #[tokio::test]
    async fn test_status_fault_also_skips_vm() {
        let mock = Arc::new(MockHost::healthy());
        mock.add_vm("node1", 100, "good", "running", &["0000:81:00"]);
        mock.add_vm("node1", 101, "bad", "running", &["0000:82:00"]);
        mock.fail_status_for(101);
        let registry = registry_with("pve1", mock).await;

        let report = gpu_status(&registry, "pve1").await.unwrap();
        assert_eq!(report.vms.len(), 1);
        assert_eq!(report.used_gpus, 1);
    }

    #[tokio::test]
    async fn test_enumeration_fault_aborts_call() {
        let mock = Arc::new(MockHost::healthy());
        mock.add_vm("node1", 100, "A", "running", &["0000:81:00"]);
        mock.fail_list_vms();
        let registry = registry_with("pve1", mock).await;

        let err = gpu_status(&registry, "pve1").await.unwrap_err();
        assert!(matches!(err, CoreError::Enumeration { .. }));
    }

    #[tokio::test]
    async fn test_stale_handle_reconnects_exactly_once() {
        let connector = Arc::new(MockConnector::new());
        let stale = MockHost::healthy();
        stale.fail_list_nodes();
        connector.add("pve1", stale);

        let registry = HostRegistry::connect(connector.clone(), vec!["pve1".to_string()]).await;
        assert_eq!(connector.attempts("pve1"), 1);

        // Replacement handle works; the query must recover through one reconnect
        let fresh = Arc::new(MockHost::healthy());
        fresh.add_vm("node1", 100, "A", "running", &["0000:81:00"]);
        connector.add("pve1", fresh);

        let report = gpu_status(&registry, "pve1").await.unwrap();
        assert_eq!(report.used_gpus, 1);
        assert_eq!(connector.attempts("pve1"), 2);
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_unavailable() {
        let connector = Arc::new(MockConnector::new());
        connector.refuse("pve9");
        let registry = HostRegistry::connect(connector.clone(), vec!["pve9".to_string()]).await;
        assert_eq!(connector.attempts("pve9"), 1);

        let err = gpu_status(&registry, "pve9").await.unwrap_err();
        assert!(matches!(err, CoreError::HostUnavailable(_)));
        // Exactly one reconnect attempt during the query, no retry storm
        assert_eq!(connector.attempts("pve9"), 2);
    }
}
