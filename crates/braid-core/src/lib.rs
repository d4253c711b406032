//! # braid-core
//! Foundation types and capability traits for the Braid wallet tools.
//!
//! - [`types`]: hashes, outpoints, transactions, DAG blocks, tip summaries
//! - [`address`]: Bech32m addresses and the [`address::Network`] enum
//! - [`script`]: the standard locking-script codec
//! - [`params`]: per-network parameters (maturity window, ports)
//! - [`amount`]: strand/BRAID conversion helpers
//! - [`traits`]: the external capabilities the wallet engine consumes
//! - [`error`]: error enums for all of the above

pub mod address;
pub mod amount;
pub mod constants;
pub mod error;
pub mod params;
pub mod script;
pub mod traits;
pub mod types;

pub use address::{Address, Network};
pub use error::{
    AddressError, AmountError, AssembleError, BroadcastError, LedgerError, ScriptError, SignError,
};
pub use params::Params;
pub use traits::{Broadcaster, LedgerQuery, ScriptDecoder, TxAssembler, TxSigner};
pub use types::{
    Block, BlockHeader, DagTips, Hash256, OutPoint, PrevScript, SignedTx, Transaction, TxInput,
    TxOutput,
};
