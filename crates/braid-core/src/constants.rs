//! Shared constants. All monetary values in strands (1 BRAID = 10^8 strands).

pub const COIN: u64 = 100_000_000;

/// Default transaction version produced by the node's assembler.
pub const TX_VERSION: u64 = 1;

/// Maximum owner addresses a standard locking script may carry.
pub const MAX_SCRIPT_ADDRESSES: usize = 3;
