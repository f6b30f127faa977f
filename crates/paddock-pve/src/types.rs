//! Wire types for the Proxmox VE `api2/json` surface.
//!
//! Only the fields this bridge reads are modeled; the API returns many more
//! and serde ignores them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Configuration-key prefix marking a PCI passthrough device (`hostpci0`,
/// `hostpci1`, ...). Each such key on a VM is one assigned GPU.
pub const PASSTHROUGH_PREFIX: &str = "hostpci";

/// One sub-node as listed by `GET /nodes`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeEntry {
    /// Node name within the cluster.
    pub node: String,
    /// Reported node status (e.g. "online").
    #[serde(default)]
    pub status: String,
}

/// One virtual machine as listed by `GET /nodes/{node}/qemu`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VmEntry {
    pub vmid: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: String,
}

/// Current run state from `GET /nodes/{node}/qemu/{vmid}/status/current`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VmStatus {
    pub status: String,
}

impl VmStatus {
    /// Whether the VM is in the "running" state.
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

/// Full VM configuration map from `GET /nodes/{node}/qemu/{vmid}/config`.
///
/// The config is an open key-value bag (the API grows keys with every
/// release), so it is kept as an ordered map rather than a struct.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct VmConfig(pub BTreeMap<String, serde_json::Value>);

impl VmConfig {
    /// PCI passthrough descriptors on this VM, in key order.
    ///
    /// Every `hostpci*` key contributes one descriptor; the value is the raw
    /// device string (e.g. `"0000:81:00,pcie=1,x-vga=1"`).
    pub fn passthrough_devices(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|(key, _)| key.starts_with(PASSTHROUGH_PREFIX))
            .map(|(_, value)| match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            })
            .collect()
    }
}

/// Parameters for `POST /nodes/{node}/qemu`.
///
/// Carries the caller-supplied identity and sizing plus the fixed defaults
/// every GPU workstation VM gets: a virtio NIC on `vmbr0`, the installer ISO
/// on ide2 and a local-lvm primary disk.
#[derive(Debug, Clone)]
pub struct CreateVmRequest {
    pub vmid: u32,
    pub name: String,
    pub cores: u32,
    pub memory_mb: u32,
    pub net0: String,
    pub ide2: String,
    pub scsi0: String,
}

impl CreateVmRequest {
    /// Build a request with the standard defaults and a primary disk sized
    /// from `disk_gb`.
    pub fn with_defaults(vmid: u32, name: &str, cores: u32, memory_mb: u32, disk_gb: u32) -> Self {
        Self {
            vmid,
            name: name.to_string(),
            cores,
            memory_mb,
            net0: "virtio,bridge=vmbr0".to_string(),
            ide2: "local:iso/ubuntu-22.04.iso,media=cdrom".to_string(),
            scsi0: format!("local-lvm:vm-{vmid}-disk-0,size={disk_gb}G"),
        }
    }

    /// Render as form fields for the creation POST.
    pub fn as_form(&self) -> Vec<(&'static str, String)> {
        vec![
            ("vmid", self.vmid.to_string()),
            ("name", self.name.clone()),
            ("cores", self.cores.to_string()),
            ("memory", self.memory_mb.to_string()),
            ("net0", self.net0.clone()),
            ("ide2", self.ide2.clone()),
            ("scsi0", self.scsi0.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vm_status_running() {
        let status: VmStatus = serde_json::from_str(r#"{"status":"running"}"#).unwrap();
        assert!(status.is_running());

        let status: VmStatus = serde_json::from_str(r#"{"status":"stopped"}"#).unwrap();
        assert!(!status.is_running());
    }

    #[test]
    fn test_vm_entry_tolerates_missing_name() {
        // Templates and half-created VMs come back without a name
        let entry: VmEntry = serde_json::from_str(r#"{"vmid":101,"status":"stopped"}"#).unwrap();
        assert_eq!(entry.vmid, 101);
        assert_eq!(entry.name, "");
    }

    #[test]
    fn test_passthrough_scan_matches_prefix_only() {
        let config: VmConfig = serde_json::from_str(
            r#"{
                "cores": 8,
                "hostpci0": "0000:81:00,pcie=1,x-vga=1",
                "hostpci1": "0000:82:00,pcie=1",
                "hostname": "not-a-device",
                "net0": "virtio=AA:BB:CC:DD:EE:FF,bridge=vmbr0"
            }"#,
        )
        .unwrap();

        let devices = config.passthrough_devices();
        assert_eq!(
            devices,
            vec!["0000:81:00,pcie=1,x-vga=1", "0000:82:00,pcie=1"]
        );
    }

    #[test]
    fn test_passthrough_scan_empty_config() {
        let config = VmConfig::default();
        assert!(config.passthrough_devices().is_empty());
    }

    #[test]
    fn test_create_request_defaults() {
        let req = CreateVmRequest::with_defaults(9001, "trainer-01", 16, 65536, 200);
        assert_eq!(req.net0, "virtio,bridge=vmbr0");
        assert_eq!(req.scsi0, "local-lvm:vm-9001-disk-0,size=200G");

        let form = req.as_form();
        assert!(form.contains(&("vmid", "9001".to_string())));
        assert!(form.contains(&("memory", "65536".to_string())));
    }
}
