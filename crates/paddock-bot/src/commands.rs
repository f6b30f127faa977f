//! Chat command dispatch.

use crate::report;
use paddock_core::{gpu_status, HostRegistry};

/// Reply to the `help` command.
pub const HELP_TEXT: &str = "Supported commands:\n\
1. empty message: GPU usage for every host\n\
2. <host id>: GPU usage for that host\n\
3. help: this message\n\
More features on the way 🌀🌀🌀";

/// Chat-side settings carried into dispatch and the callback route.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Shared secret expected on inbound callbacks; `None` disables the check.
    pub callback_secret: Option<String>,
    /// GPU capacity per host used as the report denominator.
    pub gpus_per_host: u32,
}

/// Resolve one inbound chat message to a reply.
///
/// - empty message → cluster-wide GPU report; the first host failure replies
///   with that failure instead of a partial report
/// - a configured host id → that host's report
/// - `help` → [`HELP_TEXT`]
/// - anything else → `None` (no reply is sent)
pub async fn dispatch(text: &str, registry: &HostRegistry, config: &BotConfig) -> Option<String> {
    let text = text.trim();
    tracing::info!(command = text, "Chat command received");

    match text {
        "" => Some(cluster_overview(registry, config).await),
        "help" => Some(HELP_TEXT.to_string()),
        host if registry.hosts().iter().any(|h| h == host) => {
            Some(host_overview(registry, config, host).await)
        }
        _ => {
            tracing::debug!(command = text, "Unrecognized command, staying silent");
            None
        }
    }
}

async fn cluster_overview(registry: &HostRegistry, config: &BotConfig) -> String {
    let mut reports = Vec::with_capacity(registry.hosts().len());
    for host in registry.hosts() {
        match gpu_status(registry, host).await {
            Ok(report) => reports.push(report),
            Err(error) => {
                tracing::warn!(host = %host, %error, "Cluster overview aborted");
                return error.to_string();
            }
        }
    }
    report::cluster_report(&reports, config.gpus_per_host)
}

async fn host_overview(registry: &HostRegistry, config: &BotConfig, host: &str) -> String {
    match gpu_status(registry, host).await {
        Ok(report) => report::host_report(&report, config.gpus_per_host),
        Err(error) => error.to_string(),
    }
}
