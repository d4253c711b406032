//! braid-web: a small web UI for Braid wallet queries and sends.
//!
//! Serves a single embedded page at `/` and a JSON API under `/api`,
//! backed by the same scan, balance, and selection pipeline the CLI
//! uses. The node holds all keys; the send endpoint only works when a
//! wallet passphrase is configured.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use braid_core::params::Params;
use braid_rpc::NodeClient;
use braid_wallet::MaturityPolicy;

mod config;
mod routes;

use config::Config;

/// Shared application state passed to every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// RPC client for the backing node.
    pub node: Arc<NodeClient>,
    /// Network parameters the pages report against.
    pub params: Params,
    /// Maturity rule applied to spendable balances.
    pub policy: MaturityPolicy,
    /// Web configuration.
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("failed to load web configuration")?;

    let mut params = Params::for_network(config.network);
    if let Some(window) = config.maturity_window {
        params = params.with_maturity(window);
    }
    let policy = MaturityPolicy::from_params(&params);

    info!(
        rpc = %config.rpc_endpoint,
        bind = %config.bind_addr,
        watch_addresses = config.watch_addresses.len(),
        send_enabled = config.wallet_passphrase.is_some(),
        "starting braid-web"
    );

    let node = NodeClient::new(&config.rpc_endpoint)
        .with_context(|| format!("failed to create RPC client for {}", config.rpc_endpoint))?;

    let state = AppState {
        node: Arc::new(node),
        params,
        policy,
        config: Arc::new(config.clone()),
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;

    info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .context("HTTP server error")?;

    Ok(())
}
