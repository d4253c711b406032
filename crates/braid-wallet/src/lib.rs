//! # braid-wallet
//! UTXO discovery, balance computation, coin selection, and submission
//! for the Braid block-DAG.
//!
//! The engine is a pipeline over a remote ledger. [`scan::all_transactions`]
//! pulls every transaction in height order, [`scan::match_outputs`] keeps the
//! outputs paying a watched address, and [`scan::spendable_subset`] drops the
//! ones still inside the coinbase maturity window. [`balance::compute_balance`]
//! folds the same data into total and spendable figures,
//! [`select::select_and_build`] turns spendable outputs into a
//! [`select::SelectionPlan`], and [`submit::submit`] hands that plan to the
//! node for assembly, signing, and broadcast. [`submit::wait_for_inclusion`]
//! then polls the DAG until the transaction lands in a block.
//!
//! All ledger access goes through the capability traits in
//! [`braid_core::traits`], so every stage runs unchanged against a live node
//! or an in-memory mock.
//!
//! - [`error`]: `WalletError`
//! - [`maturity`]: the coinbase maturity rule and its reference policies
//! - [`scan`]: ledger traversal and address matching
//! - [`balance`]: total and spendable aggregation
//! - [`select`]: first-fit coin selection and plan building
//! - [`submit`]: submission pipeline and inclusion polling

pub mod balance;
pub mod error;
pub mod maturity;
pub mod scan;
pub mod select;
pub mod submit;

pub use balance::{compute_balance, BalanceReport};
pub use error::WalletError;
pub use maturity::{MaturityPolicy, MaturityReference};
pub use scan::{all_transactions, match_outputs, spendable_subset, OutputMatch, TxRecord};
pub use select::{select_and_build, SelectedInput, SelectionPlan};
pub use submit::{submit, wait_for_inclusion, SubmitReceipt, WaitOptions, WaitOutcome};
