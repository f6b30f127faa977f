//! Integration tests for paddock-pve.
//!
//! These tests require a reachable Proxmox VE host and valid credentials:
//! - `PADDOCK_TEST_HOST` — management hostname or address
//! - `PVE_USER` / `PVE_PASSWORD` — credentials with audit rights
//!
//! Run with: `cargo test -p paddock-pve -- --ignored`

use paddock_pve::{Credentials, PveClient};

fn test_target() -> Option<(String, Credentials)> {
    let host = std::env::var("PADDOCK_TEST_HOST").ok()?;
    let user = std::env::var("PVE_USER").ok()?;
    let password = std::env::var("PVE_PASSWORD").ok()?;
    Some((host, Credentials::new(user, password)))
}

/// Authenticate and walk the node list.
#[tokio::test]
#[ignore = "requires a live Proxmox VE host"]
async fn test_connect_and_list_nodes() {
    let Some((host, creds)) = test_target() else {
        eprintln!("Skipping test: PADDOCK_TEST_HOST / PVE_USER / PVE_PASSWORD not set");
        return;
    };

    let client = PveClient::connect(&host, &creds)
        .await
        .expect("Failed to authenticate");

    let nodes = client.list_nodes().await.expect("Failed to list nodes");
    assert!(!nodes.is_empty(), "expected at least one sub-node");
}

/// Walk every running VM's config the way the aggregator does.
#[tokio::test]
#[ignore = "requires a live Proxmox VE host"]
async fn test_config_scan_roundtrip() {
    let Some((host, creds)) = test_target() else {
        eprintln!("Skipping test: PADDOCK_TEST_HOST / PVE_USER / PVE_PASSWORD not set");
        return;
    };

    let client = PveClient::connect(&host, &creds)
        .await
        .expect("Failed to authenticate");

    for node in client.list_nodes().await.expect("Failed to list nodes") {
        for vm in client
            .list_vms(&node.node)
            .await
            .expect("Failed to list VMs")
        {
            let status = client.vm_status(&node.node, vm.vmid).await;
            let Ok(status) = status else { continue };
            if !status.is_running() {
                continue;
            }
            let config = client
                .vm_config(&node.node, vm.vmid)
                .await
                .expect("Failed to fetch config of a running VM");
            // Device strings, when present, carry a PCI address
            for device in config.passthrough_devices() {
                assert!(!device.is_empty());
            }
        }
    }
}
