//! Mock hypervisor hosts and connectors shared by the crate's tests.

use async_trait::async_trait;
use paddock_pve::{
    Connect, CreateVmRequest, HostApi, NodeEntry, PveError, VmConfig, VmEntry, VmStatus,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn api_error(message: &str) -> PveError {
    PveError::Api {
        status: 500,
        message: message.to_string(),
    }
}

/// Build a VM config map with one `hostpci{i}` key per device string.
pub fn gpu_config(devices: &[&str]) -> VmConfig {
    let mut map = BTreeMap::new();
    map.insert("cores".to_string(), serde_json::json!(4));
    for (i, device) in devices.iter().enumerate() {
        map.insert(format!("hostpci{i}"), serde_json::json!(device));
    }
    VmConfig(map)
}

/// In-memory stand-in for one hypervisor host.
#[derive(Default)]
pub struct MockHost {
    nodes: Mutex<Vec<NodeEntry>>,
    vms: Mutex<HashMap<String, Vec<VmEntry>>>,
    statuses: Mutex<HashMap<u32, String>>,
    configs: Mutex<HashMap<u32, VmConfig>>,

    fail_list_nodes: AtomicBool,
    fail_list_vms: AtomicBool,
    fail_status_for: Mutex<HashSet<u32>>,
    fail_config_for: Mutex<HashSet<u32>>,
    fail_create: AtomicBool,
    fail_set_config: AtomicBool,
    fail_start: AtomicBool,

    pub total_calls: AtomicUsize,
    pub created: Mutex<Vec<(String, CreateVmRequest)>>,
    pub config_writes: Mutex<Vec<(u32, Vec<(String, String)>)>>,
    pub started: Mutex<Vec<u32>>,
}

impl MockHost {
    /// A host with one empty sub-node that answers every probe.
    pub fn healthy() -> Self {
        let mock = Self::default();
        mock.add_node("node1");
        mock
    }

    pub fn add_node(&self, name: &str) {
        self.nodes.lock().unwrap().push(NodeEntry {
            node: name.to_string(),
            status: "online".to_string(),
        });
    }

    /// Register a VM on `node` with the given run state and passthrough
    /// device strings (one `hostpci*` key each).
    pub fn add_vm(&self, node: &str, vmid: u32, name: &str, status: &str, devices: &[&str]) {
        self.vms
            .lock()
            .unwrap()
            .entry(node.to_string())
            .or_default()
            .push(VmEntry {
                vmid,
                name: name.to_string(),
                status: status.to_string(),
            });
        self.statuses
            .lock()
            .unwrap()
            .insert(vmid, status.to_string());
        self.configs.lock().unwrap().insert(vmid, gpu_config(devices));
    }

    pub fn fail_list_nodes(&self) {
        self.fail_list_nodes.store(true, Ordering::SeqCst);
    }

    pub fn fail_list_vms(&self) {
        self.fail_list_vms.store(true, Ordering::SeqCst);
    }

    pub fn fail_status_for(&self, vmid: u32) {
        self.fail_status_for.lock().unwrap().insert(vmid);
    }

    pub fn fail_config_for(&self, vmid: u32) {
        self.fail_config_for.lock().unwrap().insert(vmid);
    }

    pub fn fail_create(&self) {
        self.fail_create.store(true, Ordering::SeqCst);
    }

    pub fn fail_set_config(&self) {
        self.fail_set_config.store(true, Ordering::SeqCst);
    }

    pub fn fail_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    fn count(&self) {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl HostApi for MockHost {
    async fn list_nodes(&self) -> paddock_pve::Result<Vec<NodeEntry>> {
        self.count();
        if self.fail_list_nodes.load(Ordering::SeqCst) {
            return Err(api_error("node listing failed"));
        }
        Ok(self.nodes.lock().unwrap().clone())
    }

    async fn list_vms(&self, node: &str) -> paddock_pve::Result<Vec<VmEntry>> {
        self.count();
        if self.fail_list_vms.load(Ordering::SeqCst) {
            return Err(api_error("vm listing failed"));
        }
        Ok(self
            .vms
            .lock()
            .unwrap()
            .get(node)
            .cloned()
            .unwrap_or_default())
    }

    async fn vm_status(&self, _node: &str, vmid: u32) -> paddock_pve::Result<VmStatus> {
        self.count();
        if self.fail_status_for.lock().unwrap().contains(&vmid) {
            return Err(api_error("status fetch failed"));
        }
        let status = self
            .statuses
            .lock()
            .unwrap()
            .get(&vmid)
            .cloned()
            .ok_or_else(|| api_error("no such vm"))?;
        Ok(VmStatus { status })
    }

    async fn vm_config(&self, _node: &str, vmid: u32) -> paddock_pve::Result<VmConfig> {
        self.count();
        if self.fail_config_for.lock().unwrap().contains(&vmid) {
            return Err(api_error("config fetch failed"));
        }
        self.configs
            .lock()
            .unwrap()
            .get(&vmid)
            .cloned()
            .ok_or_else(|| api_error("no such vm"))
    }

    async fn create_vm(&self, node: &str, request: &CreateVmRequest) -> paddock_pve::Result<()> {
        self.count();
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(api_error("creation rejected"));
        }
        self.created
            .lock()
            .unwrap()
            .push((node.to_string(), request.clone()));
        Ok(())
    }

    async fn set_vm_config(
        &self,
        _node: &str,
        vmid: u32,
        entries: &[(String, String)],
    ) -> paddock_pve::Result<()> {
        self.count();
        if self.fail_set_config.load(Ordering::SeqCst) {
            return Err(api_error("config write rejected"));
        }
        self.config_writes
            .lock()
            .unwrap()
            .push((vmid, entries.to_vec()));
        Ok(())
    }

    async fn start_vm(&self, _node: &str, vmid: u32) -> paddock_pve::Result<()> {
        self.count();
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(api_error("start rejected"));
        }
        self.started.lock().unwrap().push(vmid);
        Ok(())
    }
}

/// Connector whose targets can be swapped or refused between calls.
#[derive(Default)]
pub struct MockConnector {
    targets: Mutex<HashMap<String, Arc<MockHost>>>,
    refused: Mutex<HashSet<String>>,
    attempts: Mutex<HashMap<String, usize>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) what connecting to `host` yields.
    pub fn add(&self, host: &str, mock: impl Into<Arc<MockHost>>) {
        self.targets
            .lock()
            .unwrap()
            .insert(host.to_string(), mock.into());
    }

    /// Make every further connection to `host` fail.
    pub fn refuse(&self, host: &str) {
        self.refused.lock().unwrap().insert(host.to_string());
    }

    /// How many connection attempts `host` has seen.
    pub fn attempts(&self, host: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .get(host)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Connect for MockConnector {
    async fn connect(&self, host: &str) -> paddock_pve::Result<Arc<dyn HostApi>> {
        *self
            .attempts
            .lock()
            .unwrap()
            .entry(host.to_string())
            .or_default() += 1;

        if self.refused.lock().unwrap().contains(host) {
            return Err(api_error("connection refused"));
        }
        self.targets
            .lock()
            .unwrap()
            .get(host)
            .cloned()
            .map(|mock| mock as Arc<dyn HostApi>)
            .ok_or_else(|| api_error("unknown host"))
    }
}
