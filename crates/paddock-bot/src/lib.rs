//! # paddock-bot
//!
//! Chat side of the paddock bridge: command dispatch over the shared host
//! registry, chat-friendly report formatting and outbound robot
//! notifications.
//!
//! The inbound transport is the chat platform's HTTP-callback mode: the
//! platform POSTs each message to [`build_router`]'s callback route, the
//! dispatcher resolves it against the registry and the reply payload goes
//! back in the response body. Formatting here is presentation only — the
//! semantic content (per-host used/free/percentage, per-VM breakdown,
//! cluster totals) comes from `paddock_core::HostReport`.

mod commands;
mod http;
mod notify;
mod report;

pub use commands::{dispatch, BotConfig, HELP_TEXT};
pub use http::{build_router, serve, BotState, ChatMessage, ReplyMessage, ReplyText, TextContent};
pub use notify::Notifier;
pub use report::{cluster_report, host_report};
