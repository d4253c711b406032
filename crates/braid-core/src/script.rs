//! Standard locking-script codec.
//!
//! A standard Braid locking script is a fixed layout:
//!
//! ```text
//! byte 0        script version (currently 0x00)
//! byte 1        address count N (0..=3)
//! bytes 2..     N consecutive 32-byte pubkey hashes
//! ```
//!
//! `N = 0` marks a data-carrier output with no spend condition; such
//! outputs decode to an empty address list and are skipped by the
//! wallet's output matcher. Multi-address scripts pay every listed
//! address; the matcher treats a script as "ours" if any listed
//! address is watched.

use crate::address::{Address, Network};
use crate::constants::MAX_SCRIPT_ADDRESSES;
use crate::error::ScriptError;
use crate::traits::ScriptDecoder;
use crate::types::Hash256;

/// Current locking-script version.
pub const SCRIPT_VERSION: u8 = 0;

/// Build a standard single-address locking script.
pub fn pay_to_address(address: &Address) -> Vec<u8> {
    let mut script = Vec::with_capacity(2 + 32);
    script.push(SCRIPT_VERSION);
    script.push(1);
    script.extend_from_slice(address.pubkey_hash().as_bytes());
    script
}

/// Build a standard locking script paying all of the given addresses.
///
/// At most [`MAX_SCRIPT_ADDRESSES`] addresses fit in one script. An
/// empty slice produces a data-carrier script.
pub fn pay_to_addresses(addresses: &[Address]) -> Result<Vec<u8>, ScriptError> {
    if addresses.len() > MAX_SCRIPT_ADDRESSES {
        return Err(ScriptError::TooManyAddresses(addresses.len()));
    }
    let mut script = Vec::with_capacity(2 + addresses.len() * 32);
    script.push(SCRIPT_VERSION);
    script.push(addresses.len() as u8);
    for address in addresses {
        script.extend_from_slice(address.pubkey_hash().as_bytes());
    }
    Ok(script)
}

/// Decode a standard locking script into its paid addresses.
///
/// Data-carrier scripts (count 0) decode to an empty vec. Anything that
/// is not a well-formed standard script is an error; the wallet's
/// matcher decides whether to skip or abort on that.
pub fn extract_addresses(
    pk_script: &[u8],
    network: Network,
) -> Result<Vec<Address>, ScriptError> {
    if pk_script.is_empty() {
        return Err(ScriptError::Empty);
    }
    if pk_script[0] != SCRIPT_VERSION {
        return Err(ScriptError::UnsupportedVersion(pk_script[0]));
    }
    if pk_script.len() < 2 {
        return Err(ScriptError::Truncated {
            expected: 2,
            got: pk_script.len(),
        });
    }

    let count = pk_script[1] as usize;
    if count > MAX_SCRIPT_ADDRESSES {
        return Err(ScriptError::TooManyAddresses(count));
    }

    let expected = 2 + count * 32;
    if pk_script.len() < expected {
        return Err(ScriptError::Truncated {
            expected,
            got: pk_script.len(),
        });
    }
    if pk_script.len() > expected {
        return Err(ScriptError::TrailingBytes(pk_script.len() - expected));
    }

    let mut addresses = Vec::with_capacity(count);
    for i in 0..count {
        let start = 2 + i * 32;
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&pk_script[start..start + 32]);
        addresses.push(Address::from_pubkey_hash(Hash256(hash), network));
    }
    Ok(addresses)
}

/// The production [`ScriptDecoder`]: decodes standard scripts directly,
/// with no node round trip.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecoder;

impl ScriptDecoder for StandardDecoder {
    fn extract_addresses(
        &self,
        pk_script: &[u8],
        network: Network,
    ) -> Result<Vec<Address>, ScriptError> {
        extract_addresses(pk_script, network)
    }
}
