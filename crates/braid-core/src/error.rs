//! Error types for the Braid wallet tools.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("bech32 decode failed: {0}")] Decode(String),
    #[error("invalid address version: {0}")] InvalidVersion(u8),
    #[error("invalid payload length: expected {expected} bytes, got {got}")] InvalidLength { expected: usize, got: usize },
    #[error("unknown network: {0}")] UnknownNetwork(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("empty script")] Empty,
    #[error("unsupported script version: {0}")] UnsupportedVersion(u8),
    #[error("truncated script: expected {expected} bytes, got {got}")] Truncated { expected: usize, got: usize },
    #[error("trailing bytes after script payload: {0}")] TrailingBytes(usize),
    #[error("too many addresses in script: {0}")] TooManyAddresses(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is not a finite number")] NotFinite,
    #[error("amount is negative")] Negative,
    #[error("amount out of range")] OutOfRange,
}

/// Failure of the ledger-query capability. Any variant aborts the
/// operation that issued the call; nothing is retried automatically.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger unavailable: {0}")] Unavailable(String),
    #[error("invalid ledger response: {0}")] InvalidResponse(String),
}

/// Hard failure of the signer capability. Per-input signing gaps are not
/// errors; they ride back on [`SignedTx`](crate::types::SignedTx).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("wallet unlock failed: {0}")] Unlock(String),
    #[error("signing failed: {0}")] Failed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("broadcast rejected: {0}")] Rejected(String),
    #[error("broadcast transport failed: {0}")] Transport(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssembleError {
    #[error("transaction assembly failed: {0}")] Failed(String),
    #[error("invalid assembled transaction: {0}")] InvalidResponse(String),
}
