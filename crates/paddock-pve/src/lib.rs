//! # paddock-pve
//!
//! Proxmox VE management API access layer for the paddock bridge.
//! Provides a thin typed client over the `api2/json` REST surface and the
//! [`HostApi`] trait the rest of the workspace programs against.
//!
//! ## Quick Start
//!
//! ```no_run
//! use paddock_pve::{Credentials, PveClient};
//!
//! # async fn example() -> paddock_pve::Result<()> {
//! let creds = Credentials::new("monitor@pve", "secret");
//! let client = PveClient::connect("pve1", &creds).await?;
//!
//! for node in client.list_nodes().await? {
//!     println!("{} is {}", node.node, node.status);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Notes
//!
//! - Connecting is authenticating: [`PveClient::connect`] fetches an access
//!   ticket, so a constructed client has passed authentication at least once.
//! - Certificate validation is disabled; the clusters this talks to run
//!   self-signed certificates on their management interfaces.

mod api;
mod client;
mod error;
mod types;

pub use api::{Connect, HostApi, TicketConnector};
pub use client::{Credentials, PveClient};
pub use error::{PveError, Result};
pub use types::{
    CreateVmRequest, NodeEntry, VmConfig, VmEntry, VmStatus, PASSTHROUGH_PREFIX,
};
