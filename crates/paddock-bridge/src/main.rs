//! Paddock bridge entry point.
//!
//! Builds one host registry from the environment, then runs two long-lived
//! servers against it: the REST API (status queries + approval webhook) and
//! the chat callback transport. Both share the same registry by reference;
//! neither owns connection state of its own.

use paddock_bot::{BotState, Notifier};
use paddock_bridge::http::AppState;
use paddock_bridge::{http, BridgeConfig};
use paddock_core::HostRegistry;
use paddock_pve::{Credentials, TicketConnector};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting paddock bridge");

    let config = BridgeConfig::from_env();
    tracing::info!(?config, "Configuration loaded");
    config.validate_warn();

    // One registry for the whole process, shared into both entry points
    let connector = Arc::new(TicketConnector::new(Credentials::new(
        config.pve_user.clone(),
        config.pve_password.clone(),
    )));
    let registry = Arc::new(HostRegistry::connect(connector, config.pve_nodes.clone()).await);

    let notifier = Arc::new(Notifier::new(config.chat_webhook_url.clone()));

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let mut handles = Vec::new();

    // REST API: status queries + approval webhook
    {
        let state = Arc::new(AppState {
            registry: Arc::clone(&registry),
            notifier: Arc::clone(&notifier),
            config: config.clone(),
        });
        let addr = config.api_addr;
        let mut shutdown_rx = shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(error) = http::serve(state, addr, shutdown).await {
                tracing::error!(%error, "REST API server error");
            }
        }));
    }

    // Chat callback transport
    {
        let state = Arc::new(BotState {
            registry: Arc::clone(&registry),
            config: paddock_bot::BotConfig {
                callback_secret: config.chat_secret.clone(),
                gpus_per_host: config.gpus_per_host,
            },
        });
        let addr = config.bot_addr;
        let mut shutdown_rx = shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            let shutdown = async move {
                let _ = shutdown_rx.recv().await;
            };
            if let Err(error) = paddock_bot::serve(state, addr, shutdown).await {
                tracing::error!(%error, "Bot callback server error");
            }
        }));
    }

    tracing::info!(
        api_addr = %config.api_addr,
        bot_addr = %config.bot_addr,
        connected = registry.connected_count().await,
        configured = registry.hosts().len(),
        "Bridge ready"
    );

    signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, stopping servers");

    let _ = shutdown_tx.send(());
    for handle in handles {
        let _ = handle.await;
    }

    tracing::info!("Bridge shutdown complete");
    Ok(())
}
