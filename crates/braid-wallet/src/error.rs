//! Engine error type.

use braid_core::error::{AssembleError, BroadcastError, LedgerError, ScriptError, SignError};
use braid_core::types::Hash256;
use thiserror::Error;

/// Failures surfaced by the wallet engine.
///
/// Capability failures pass through transparently; the integrity,
/// funds, and overflow variants originate here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Script(#[from] ScriptError),
    #[error(transparent)] Sign(#[from] SignError),
    #[error(transparent)] Broadcast(#[from] BroadcastError),
    #[error(transparent)] Assemble(#[from] AssembleError),
    #[error("missing previous transaction {prev_txid} for transaction {txid} input {index}")]
    MissingPrecedingTransaction { prev_txid: Hash256, txid: Hash256, index: usize },
    #[error("previous output {vout} of transaction {prev_txid} out of range ({outputs} outputs)")]
    PreviousOutputOutOfRange { prev_txid: Hash256, vout: u32, outputs: usize },
    #[error("insufficient funds: {have} strands spendable, {need} needed")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("amount overflow while aggregating values")]
    AmountOverflow,
}
