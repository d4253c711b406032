//! Web UI configuration loaded from environment variables.

use anyhow::{bail, Context, Result};

use braid_core::address::Network;

#[derive(Clone, Debug)]
pub struct Config {
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Braid node JSON-RPC endpoint.
    pub rpc_endpoint: String,
    /// Network the node is expected to run on.
    pub network: Network,
    /// Addresses the wallet page reports on. Empty means ask the node
    /// for its own wallet addresses instead.
    pub watch_addresses: Vec<String>,
    /// Node wallet passphrase for the send form. Sending is disabled
    /// when unset.
    pub wallet_passphrase: Option<String>,
    /// Override for the network's coinbase maturity window.
    pub maturity_window: Option<u64>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BRAID_WEB_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3080".to_string());

        let rpc_endpoint = std::env::var("BRAID_WEB_RPC_ENDPOINT")
            .unwrap_or_else(|_| "http://127.0.0.1:8432".to_string());

        let network = parse_network(
            &std::env::var("BRAID_WEB_NETWORK").unwrap_or_else(|_| "mainnet".to_string()),
        )?;

        let watch_addresses = std::env::var("BRAID_WEB_WATCH_ADDRESSES")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let wallet_passphrase = std::env::var("BRAID_WEB_WALLET_PASSPHRASE").ok();

        let maturity_window = match std::env::var("BRAID_WEB_MATURITY_WINDOW") {
            Ok(raw) => Some(
                raw.parse::<u64>()
                    .context("BRAID_WEB_MATURITY_WINDOW must be a non-negative integer")?,
            ),
            Err(_) => None,
        };

        Ok(Config {
            bind_addr,
            rpc_endpoint,
            network,
            watch_addresses,
            wallet_passphrase,
            maturity_window,
        })
    }
}

fn parse_network(s: &str) -> Result<Network> {
    match s.to_lowercase().as_str() {
        "mainnet" => Ok(Network::Mainnet),
        "testnet" => Ok(Network::Testnet),
        "simnet" => Ok(Network::Simnet),
        _ => bail!("BRAID_WEB_NETWORK must be 'mainnet', 'testnet', or 'simnet'"),
    }
}
