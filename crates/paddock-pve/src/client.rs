//! Ticket-authenticated HTTP client for one Proxmox VE host.

use crate::error::{PveError, Result};
use crate::types::{CreateVmRequest, NodeEntry, VmConfig, VmEntry, VmStatus};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;

/// Management API port used by every cluster we talk to.
const API_PORT: u16 = 8006;

/// Shared username/password pair used for every configured host.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs; configs get logged at startup.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Every Proxmox response wraps its payload in a `data` envelope.
#[derive(Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Deserialize)]
struct TicketData {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

/// An authenticated session against one Proxmox VE host.
///
/// The client is immutable after [`connect`](Self::connect); a failed session
/// is replaced wholesale by reconnecting, never refreshed in place.
pub struct PveClient {
    host: String,
    base: String,
    http: reqwest::Client,
    ticket: String,
    csrf_token: String,
}

impl PveClient {
    /// Authenticate against `host` and return a live session.
    ///
    /// Issues `POST /access/ticket`; the returned ticket cookie authorizes
    /// reads and the CSRF token authorizes writes.
    pub async fn connect(host: &str, credentials: &Credentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;
        let base = format!("https://{host}:{API_PORT}/api2/json");

        tracing::debug!(host, username = %credentials.username, "Requesting access ticket");
        let response = http
            .post(format!("{base}/access/ticket"))
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PveError::Auth(host.to_string()));
        }

        let envelope: Envelope<TicketData> = response.json().await?;
        let ticket_data = envelope
            .data
            .ok_or_else(|| PveError::Auth(host.to_string()))?;

        tracing::debug!(host, "Access ticket issued");
        Ok(Self {
            host: host.to_string(),
            base,
            http,
            ticket: ticket_data.ticket,
            csrf_token: ticket_data.csrf_token,
        })
    }

    /// Host identifier this session is bound to.
    pub fn host(&self) -> &str {
        &self.host
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base, path))
            .header("Cookie", format!("PVEAuthCookie={}", self.ticket))
            .send()
            .await?;
        Self::unwrap_data(self.host.clone(), response).await
    }

    async fn write(
        &self,
        method: reqwest::Method,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<()> {
        let response = self
            .http
            .request(method, format!("{}{}", self.base, path))
            .header("Cookie", format!("PVEAuthCookie={}", self.ticket))
            .header("CSRFPreventionToken", &self.csrf_token)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PveError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(())
    }

    async fn unwrap_data<T: DeserializeOwned>(host: String, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PveError::Api {
                status: status.as_u16(),
                message,
            });
        }
        let envelope: Envelope<T> = response.json().await?;
        envelope.data.ok_or(PveError::MissingData(host))
    }

    /// `GET /nodes` — every sub-node behind this management endpoint.
    pub async fn list_nodes(&self) -> Result<Vec<NodeEntry>> {
        self.get("/nodes").await
    }

    /// `GET /nodes/{node}/qemu` — all VMs on one sub-node.
    pub async fn list_vms(&self, node: &str) -> Result<Vec<VmEntry>> {
        self.get(&format!("/nodes/{node}/qemu")).await
    }

    /// `GET /nodes/{node}/qemu/{vmid}/status/current`
    pub async fn vm_status(&self, node: &str, vmid: u32) -> Result<VmStatus> {
        self.get(&format!("/nodes/{node}/qemu/{vmid}/status/current"))
            .await
    }

    /// `GET /nodes/{node}/qemu/{vmid}/config`
    pub async fn vm_config(&self, node: &str, vmid: u32) -> Result<VmConfig> {
        self.get(&format!("/nodes/{node}/qemu/{vmid}/config")).await
    }

    /// `POST /nodes/{node}/qemu` — create a VM.
    pub async fn create_vm(&self, node: &str, request: &CreateVmRequest) -> Result<()> {
        self.write(
            reqwest::Method::POST,
            &format!("/nodes/{node}/qemu"),
            &request.as_form(),
        )
        .await
    }

    /// `PUT /nodes/{node}/qemu/{vmid}/config` — set configuration entries.
    pub async fn set_vm_config(
        &self,
        node: &str,
        vmid: u32,
        entries: &[(String, String)],
    ) -> Result<()> {
        let form: Vec<(&str, String)> = entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.clone()))
            .collect();
        self.write(
            reqwest::Method::PUT,
            &format!("/nodes/{node}/qemu/{vmid}/config"),
            &form,
        )
        .await
    }

    /// `POST /nodes/{node}/qemu/{vmid}/status/start`
    pub async fn start_vm(&self, node: &str, vmid: u32) -> Result<()> {
        self.write(
            reqwest::Method::POST,
            &format!("/nodes/{node}/qemu/{vmid}/status/start"),
            &[],
        )
        .await
    }
}
