//! Balance aggregation over a scanned ledger window.
//!
//! Netting walks every scanned transaction once: watched inputs deduct
//! the face value of the previous output they consume, watched outputs
//! credit theirs. Self-transfers therefore net out instead of double
//! counting. Every non-genesis input must resolve inside the scanned
//! window; the aggregator never reaches back to the node for a missing
//! previous transaction.

use std::collections::HashMap;

use braid_core::address::Address;
use braid_core::params::Params;
use braid_core::traits::ScriptDecoder;
use braid_core::types::Hash256;

use crate::error::WalletError;
use crate::maturity::{MaturityPolicy, MaturityReference};
use crate::scan::{tx_index, TxRecord};

/// Net balances for one watch set.
///
/// Signed, since a netting pass over an arbitrary watch set subtracts
/// before it adds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceReport {
    /// Net of every matched output minus every matched spent input, in
    /// strands.
    pub total: i64,
    /// Same netting restricted to amounts that clear the maturity rule.
    pub spendable: i64,
}

/// Net the watched inputs and outputs of the scanned window into a
/// total and a spendable balance.
pub fn compute_balance(
    records: &[TxRecord],
    watch_set: &[Address],
    policy: &MaturityPolicy,
    decoder: &dyn ScriptDecoder,
    params: &Params,
) -> Result<BalanceReport, WalletError> {
    let index = tx_index(records);
    let mut total: i64 = 0;
    let mut spendable: i64 = 0;

    for record in records {
        // Deduct watched inputs.
        for (i, input) in record.tx.inputs.iter().enumerate() {
            let prev_out = &input.previous_output;
            if prev_out.txid.is_zero() {
                // Genesis-style input: no previous output exists to look up.
                continue;
            }

            let prev = index.get(&prev_out.txid).ok_or(
                WalletError::MissingPrecedingTransaction {
                    prev_txid: prev_out.txid,
                    txid: record.txid,
                    index: i,
                },
            )?;
            let output = prev.tx.outputs.get(prev_out.vout as usize).ok_or(
                WalletError::PreviousOutputOutOfRange {
                    prev_txid: prev_out.txid,
                    vout: prev_out.vout,
                    outputs: prev.tx.outputs.len(),
                },
            )?;

            let owners = decoder.extract_addresses(&output.pk_script, params.network)?;
            for owner in &owners {
                if !watch_set.contains(owner) {
                    continue;
                }
                let amount =
                    i64::try_from(output.value).map_err(|_| WalletError::AmountOverflow)?;
                total = total.checked_sub(amount).ok_or(WalletError::AmountOverflow)?;
                if policy.is_spendable(record.height, prev.height) {
                    spendable = spendable
                        .checked_sub(amount)
                        .ok_or(WalletError::AmountOverflow)?;
                }
            }
        }

        // Credit watched outputs.
        let anchor = reference_height(record, &index, policy.reference);
        for output in &record.tx.outputs {
            let owners = decoder.extract_addresses(&output.pk_script, params.network)?;
            for owner in &owners {
                if !watch_set.contains(owner) {
                    continue;
                }
                let amount =
                    i64::try_from(output.value).map_err(|_| WalletError::AmountOverflow)?;
                total = total.checked_add(amount).ok_or(WalletError::AmountOverflow)?;
                if policy.is_spendable(record.height, anchor) {
                    spendable = spendable
                        .checked_add(amount)
                        .ok_or(WalletError::AmountOverflow)?;
                }
            }
        }
    }

    tracing::debug!(total, spendable, "balance computed");
    Ok(BalanceReport { total, spendable })
}

/// Producing height anchoring the maturity check for `record`'s outputs.
///
/// Unresolvable references anchor at height 0: genesis inputs, hashes
/// outside the scanned window, and a transaction with no inputs at all.
/// Deep coinbase outputs thus mature against genesis.
fn reference_height(
    record: &TxRecord,
    index: &HashMap<Hash256, &TxRecord>,
    reference: MaturityReference,
) -> u64 {
    match reference {
        MaturityReference::FirstInput => record
            .tx
            .inputs
            .first()
            .and_then(|input| index.get(&input.previous_output.txid))
            .map(|prev| prev.height)
            .unwrap_or(0),
        MaturityReference::NewestInput => record
            .tx
            .inputs
            .iter()
            .filter_map(|input| index.get(&input.previous_output.txid))
            .map(|prev| prev.height)
            .max()
            .unwrap_or(0),
    }
}
