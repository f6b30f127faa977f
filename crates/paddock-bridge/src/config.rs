//! Configuration for the bridge service.
//!
//! Configuration is loaded from environment variables with sensible defaults.
//! Chat credentials go through one level of environment-name indirection so a
//! single deployment artifact can serve several chat tenants.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Configuration for the paddock bridge service.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Hypervisor hosts, in configured order.
    pub pve_nodes: Vec<String>,

    /// Shared hypervisor username.
    pub pve_user: String,

    /// Shared hypervisor password.
    pub pve_password: String,

    /// Environment name used as the prefix for chat credential variables.
    pub env_name: String,

    /// Robot webhook endpoint for outbound notifications.
    pub chat_webhook_url: Option<String>,

    /// Shared secret expected on inbound chat and approval callbacks.
    pub chat_secret: Option<String>,

    /// REST API bind address.
    pub api_addr: SocketAddr,

    /// Chat callback bind address.
    pub bot_addr: SocketAddr,

    /// GPU capacity per host, the denominator in usage reports.
    pub gpus_per_host: u32,
}

// The password must never end up in startup logs.
impl fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("pve_nodes", &self.pve_nodes)
            .field("pve_user", &self.pve_user)
            .field("pve_password", &"<redacted>")
            .field("env_name", &self.env_name)
            .field("chat_webhook_url", &self.chat_webhook_url)
            .field("chat_secret", &self.chat_secret.as_ref().map(|_| "<redacted>"))
            .field("api_addr", &self.api_addr)
            .field("bot_addr", &self.bot_addr)
            .field("gpus_per_host", &self.gpus_per_host)
            .finish()
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            pve_nodes: parse_nodes("pve1,pve2,pve3,pve4"),
            pve_user: String::new(),
            pve_password: String::new(),
            env_name: "DEV".to_string(),
            chat_webhook_url: None,
            chat_secret: None,
            api_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8000),
            bot_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 8001),
            gpus_per_host: 4,
        }
    }
}

/// Split a comma-separated host list, dropping empty segments.
pub fn parse_nodes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .map(str::to_string)
        .collect()
}

/// Chat credential variable name for the given environment prefix.
fn chat_var(env_name: &str, suffix: &str) -> String {
    format!("{env_name}_{suffix}")
}

impl BridgeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PVE_NODES` | `pve1,pve2,pve3,pve4` |
    /// | `PVE_USER` | — |
    /// | `PVE_PASSWORD` | — |
    /// | `PADDOCK_ENV` | `DEV` |
    /// | `{PADDOCK_ENV}_CHAT_WEBHOOK_URL` | — |
    /// | `{PADDOCK_ENV}_CHAT_SECRET` | — |
    /// | `PADDOCK_API_HOST` | `0.0.0.0` |
    /// | `PADDOCK_API_PORT` | `8000` |
    /// | `PADDOCK_BOT_PORT` | `8001` |
    /// | `PADDOCK_GPUS_PER_HOST` | `4` |
    pub fn from_env() -> Self {
        let default = Self::default();

        let host: IpAddr = std::env::var("PADDOCK_API_HOST")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let api_port: u16 = std::env::var("PADDOCK_API_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8000);

        let bot_port: u16 = std::env::var("PADDOCK_BOT_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8001);

        let env_name = std::env::var("PADDOCK_ENV").unwrap_or(default.env_name);

        Self {
            pve_nodes: std::env::var("PVE_NODES")
                .map(|v| parse_nodes(&v))
                .unwrap_or(default.pve_nodes),
            pve_user: std::env::var("PVE_USER").unwrap_or(default.pve_user),
            pve_password: std::env::var("PVE_PASSWORD").unwrap_or(default.pve_password),
            chat_webhook_url: std::env::var(chat_var(&env_name, "CHAT_WEBHOOK_URL")).ok(),
            chat_secret: std::env::var(chat_var(&env_name, "CHAT_SECRET")).ok(),
            env_name,
            api_addr: SocketAddr::new(host, api_port),
            bot_addr: SocketAddr::new(host, bot_port),
            gpus_per_host: std::env::var("PADDOCK_GPUS_PER_HOST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.gpus_per_host),
        }
    }

    /// Validate configuration but only log warnings instead of failing.
    ///
    /// Partial connectivity is a normal operating condition, so nothing here
    /// is fatal; the warnings tell operators what will be degraded.
    pub fn validate_warn(&self) {
        if self.pve_nodes.is_empty() {
            tracing::warn!("PVE_NODES is empty, nothing to report on");
        }
        if self.pve_user.is_empty() || self.pve_password.is_empty() {
            tracing::warn!("PVE_USER / PVE_PASSWORD not set, host connections will fail");
        }
        if self.chat_webhook_url.is_none() {
            tracing::warn!(
                env = %self.env_name,
                "No robot webhook configured, notifications disabled"
            );
        }
        if self.chat_secret.is_none() {
            tracing::warn!(
                env = %self.env_name,
                "No callback secret configured, inbound callbacks are unauthenticated"
            );
        }
    }
}
