//! # paddock-bridge
//!
//! Service shell of the paddock bridge: environment configuration, the REST
//! API (GPU status queries and the approval-workflow webhook) and process
//! wiring. One [`HostRegistry`](paddock_core::HostRegistry) is built at
//! startup and shared by reference into both long-lived servers — the REST
//! API and the chat callback transport from `paddock-bot`.

pub mod config;
pub mod http;
pub mod webhook;

pub use config::BridgeConfig;
pub use http::{build_router, serve, AppState};
