//! # paddock-core
//!
//! Connection management, GPU status aggregation and VM provisioning for the
//! paddock chat/hypervisor bridge.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     paddock-core                        │
//! ├─────────────────────────────────────────────────────────┤
//! │                                                         │
//! │  ┌──────────────┐      ┌───────────────────────────┐    │
//! │  │ HostRegistry │─────▶│ RwLock<HashMap<host,      │    │
//! │  │  - connect() │      │        Arc<dyn HostApi>>> │    │
//! │  │  - get()     │      └───────────────────────────┘    │
//! │  │  - reconnect │                   │                   │
//! │  └──────────────┘                   ▼                   │
//! │         ▲              ┌───────────────────────────┐    │
//! │         │              │ gpu_status() / create_vm()│    │
//! │  ┌──────────────┐      │  (per-call handle probe,  │    │
//! │  │ dyn Connect  │      │   one reconnect attempt)  │    │
//! │  └──────────────┘      └───────────────────────────┘    │
//! │                                     │  HTTPS            │
//! └─────────────────────────────────────┼───────────────────┘
//!                                       ▼
//!                         Proxmox VE management API
//! ```
//!
//! The registry is built once at process start and shared by reference into
//! every entry point (chat dispatch, REST handlers, approval webhook). Handle
//! validity is never cached: call sites that need freshness probe the handle
//! and reconnect at most once, then give up.

mod error;
mod provision;
mod registry;
mod status;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{CoreError, Result};
pub use provision::{provision_vm, ProvisionStep, VmSpec};
pub use registry::HostRegistry;
pub use status::{gpu_status, GpuUsageRecord, HostReport};
