//! Address encoding for the Braid network.
//!
//! Addresses are Bech32m strings with human-readable prefixes:
//! - Mainnet: `braid1...`
//! - Testnet: `tbraid1...`
//! - Simnet: `sbraid1...`
//!
//! The encoded payload is a version byte (currently 0) followed by a
//! 32-byte pubkey hash. The canonical form is lowercase; address
//! comparison throughout the wallet tools is equality of this canonical
//! form.

use bech32::{Bech32m, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;
use crate::types::Hash256;

/// Current address version.
pub const ADDRESS_VERSION: u8 = 0;

/// Version byte plus 32-byte pubkey hash.
const PAYLOAD_LEN: usize = 33;

/// Network identifier determining the address prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Network {
    /// Production network (HRP: "braid").
    #[default]
    Mainnet,
    /// Public test network (HRP: "tbraid").
    Testnet,
    /// Private simulation network (HRP: "sbraid").
    Simnet,
}

impl Network {
    /// Human-readable prefix for this network.
    pub fn hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "braid",
            Network::Testnet => "tbraid",
            Network::Simnet => "sbraid",
        }
    }

    /// Look up network from a human-readable prefix.
    pub fn from_hrp(hrp: &str) -> Result<Self, AddressError> {
        match hrp {
            "braid" => Ok(Network::Mainnet),
            "tbraid" => Ok(Network::Testnet),
            "sbraid" => Ok(Network::Simnet),
            _ => Err(AddressError::UnknownNetwork(hrp.to_string())),
        }
    }

    /// Parsed Bech32 HRP for this network.
    fn bech32_hrp(&self) -> Hrp {
        Hrp::parse(self.hrp()).expect("static HRP is valid")
    }
}

/// A Braid network address encoding a pubkey hash with Bech32m.
///
/// Human-readable form is `braid1...` (mainnet), `tbraid1...` (testnet) or
/// `sbraid1...` (simnet). Equality of two addresses is exactly equality of
/// their canonical encoded strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    version: u8,
    pubkey_hash: Hash256,
}

impl Address {
    /// Create an address from a pubkey hash and network.
    pub fn from_pubkey_hash(pubkey_hash: Hash256, network: Network) -> Self {
        Self {
            network,
            version: ADDRESS_VERSION,
            pubkey_hash,
        }
    }

    /// The pubkey hash encoded in this address.
    pub fn pubkey_hash(&self) -> Hash256 {
        self.pubkey_hash
    }

    /// The network this address belongs to.
    pub fn network(&self) -> Network {
        self.network
    }

    /// The address version byte.
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Encode this address as a Bech32m string (canonical lowercase form).
    pub fn encode(&self) -> String {
        let mut payload = Vec::with_capacity(PAYLOAD_LEN);
        payload.push(self.version);
        payload.extend_from_slice(self.pubkey_hash.as_bytes());
        bech32::encode::<Bech32m>(self.network.bech32_hrp(), &payload)
            .expect("encoding a 33-byte payload never exceeds the length limit")
    }

    /// Decode a Bech32m address string.
    ///
    /// Accepts the canonical lowercase form or its all-uppercase variant;
    /// mixed case, bad charset, and checksum failures are rejected by the
    /// underlying decoder.
    pub fn decode(s: &str) -> Result<Self, AddressError> {
        let (hrp, payload) =
            bech32::decode(s).map_err(|e| AddressError::Decode(e.to_string()))?;
        let network = Network::from_hrp(&hrp.to_string().to_ascii_lowercase())?;

        let (version, hash_bytes) =
            payload.split_first().ok_or(AddressError::InvalidLength {
                expected: PAYLOAD_LEN,
                got: 0,
            })?;
        if *version != ADDRESS_VERSION {
            return Err(AddressError::InvalidVersion(*version));
        }
        if hash_bytes.len() != 32 {
            return Err(AddressError::InvalidLength {
                expected: PAYLOAD_LEN,
                got: payload.len(),
            });
        }

        let mut hash = [0u8; 32];
        hash.copy_from_slice(hash_bytes);

        Ok(Self {
            network,
            version: *version,
            pubkey_hash: Hash256(hash),
        })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::decode(&s).map_err(serde::de::Error::custom)
    }
}
