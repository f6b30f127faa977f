//! Chat-friendly rendering of GPU usage reports.
//!
//! Layout is tuned for mobile chat clients: short separators, one host per
//! block, cluster totals at the bottom.

use paddock_core::HostReport;

const TITLE_SEP: &str = "================";
const SECTION_SEP: &str = "--------------------";
const ITEM_SEP: &str = "····················";

/// Load badge for a usage percentage: red at 80%, yellow at 50%.
fn load_badge(usage: f64) -> &'static str {
    if usage >= 80.0 {
        "🔴🔥"
    } else if usage >= 50.0 {
        "🟡⚠️"
    } else {
        "🟢✅"
    }
}

/// Host ids may carry a port suffix; the display name is the bare address.
fn short_host(host: &str) -> &str {
    host.split(':').next().unwrap_or(host)
}

/// First comma-separated segment of a passthrough descriptor — the PCI
/// address without its option flags.
fn primary_address(device: &str) -> &str {
    device.split(',').next().unwrap_or(device)
}

fn usage_percent(used: u32, capacity: u32) -> f64 {
    if capacity == 0 {
        0.0
    } else {
        f64::from(used) / f64::from(capacity) * 100.0
    }
}

/// Render one host block: headline, counters and the per-VM breakdown.
fn host_section(report: &HostReport, gpus_per_host: u32) -> String {
    let used = report.used_gpus;
    let free = gpus_per_host.saturating_sub(used);
    let usage = usage_percent(used, gpus_per_host);

    let mut section = format!(
        "🖥️【{}】{}\n{ITEM_SEP}\n",
        short_host(&report.host),
        load_badge(usage)
    );
    section += &format!("  🟢 used: {used}/{gpus_per_host}\n");
    section += &format!("  🟡 free: {free}\n");
    section += &format!("  📈 usage: {usage:.1}%\n\n");

    section += "  🖥️ VM allocation:\n";
    if report.vms.is_empty() {
        section += "  • (none)\n";
    }
    for vm in &report.vms {
        let addresses: Vec<&str> = vm
            .pci_devices
            .iter()
            .map(|device| primary_address(device))
            .collect();
        section += &format!(
            "  • {}: {} ({})\n",
            vm.vm_name,
            vm.used_gpus,
            addresses.join(", ")
        );
    }
    section
}

/// Full cluster report: one block per host plus overall totals.
pub fn cluster_report(reports: &[HostReport], gpus_per_host: u32) -> String {
    let mut message = format!("📊 {TITLE_SEP} 📊\n   GPU usage report\n📊 {TITLE_SEP} 📊\n\n");

    for report in reports {
        message += &host_section(report, gpus_per_host);
        message += &format!("{SECTION_SEP}\n\n");
    }

    let total_hosts = reports.len() as u32;
    let total_capacity = total_hosts * gpus_per_host;
    let total_used: u32 = reports.iter().map(|report| report.used_gpus).sum();
    let total_free = total_capacity.saturating_sub(total_used);
    let overall = usage_percent(total_used, total_capacity);

    message += &format!("📊 {TITLE_SEP} 📊\n    cluster totals\n📊 {TITLE_SEP} 📊\n");
    message += &format!("🖥️ hosts: {total_hosts}\n");
    message += &format!("🔧 GPUs used: {total_used}\n");
    message += &format!("💡 GPUs free: {total_free}\n");
    message += &format!("📈 overall usage: {overall:.1}%\n");
    message += &format!("{TITLE_SEP}\n");
    message += "⚙️ send help for the command list";

    message
}

/// Single-host report, used for the per-host chat command.
pub fn host_report(report: &HostReport, gpus_per_host: u32) -> String {
    let mut message = format!("📊 {TITLE_SEP} 📊\n");
    message += &host_section(report, gpus_per_host);
    message += &format!("{TITLE_SEP}\n");
    message += "⚙️ send help for the command list";
    message
}
