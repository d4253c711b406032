//! Per-network parameters.
//!
//! Each Braid network carries its own coinbase maturity window and default
//! node RPC port. The wallet tools select a parameter set once at startup
//! and thread it through scanning and selection.

use crate::address::Network;

/// Parameters of one Braid network.
///
/// # Examples
///
/// ```
/// use braid_core::params::Params;
/// use braid_core::address::Network;
///
/// let params = Params::mainnet();
/// assert_eq!(params.network, Network::Mainnet);
/// assert_eq!(params.coinbase_maturity, 100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub network: Network,
    /// Confirmations a coinbase output needs before it may be spent.
    pub coinbase_maturity: u64,
}

impl Params {
    /// Production network parameters.
    pub fn mainnet() -> Self {
        Self {
            network: Network::Mainnet,
            coinbase_maturity: 100,
        }
    }

    /// Public test network parameters.
    pub fn testnet() -> Self {
        Self {
            network: Network::Testnet,
            coinbase_maturity: 100,
        }
    }

    /// Simulation network parameters. Short maturity so integration
    /// setups can spend mining rewards quickly.
    pub fn simnet() -> Self {
        Self {
            network: Network::Simnet,
            coinbase_maturity: 16,
        }
    }

    /// Parameters for the given network.
    ///
    /// # Examples
    ///
    /// ```
    /// use braid_core::params::Params;
    /// use braid_core::address::Network;
    ///
    /// assert_eq!(Params::for_network(Network::Simnet).coinbase_maturity, 16);
    /// ```
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Mainnet => Self::mainnet(),
            Network::Testnet => Self::testnet(),
            Network::Simnet => Self::simnet(),
        }
    }

    /// Same parameters with an overridden maturity window.
    pub fn with_maturity(mut self, window: u64) -> Self {
        self.coinbase_maturity = window;
        self
    }

    /// Default TCP port of the node's JSON-RPC endpoint.
    pub fn default_rpc_port(&self) -> u16 {
        match self.network {
            Network::Mainnet => 8432,
            Network::Testnet => 18432,
            Network::Simnet => 28432,
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::mainnet()
    }
}
