//! Ledger scanning and output matching.
//!
//! [`all_transactions`] flattens the DAG into scan order: height
//! ascending, blocks in node-reported order within a height, then
//! transaction index within each block. Downstream stages rely on this
//! order only for presentation; correctness is order-independent.

use std::collections::HashMap;

use braid_core::address::Address;
use braid_core::params::Params;
use braid_core::traits::{LedgerQuery, ScriptDecoder};
use braid_core::types::{Hash256, OutPoint, Transaction};

use crate::error::WalletError;
use crate::maturity::MaturityPolicy;

/// One scanned transaction with its DAG position.
///
/// Immutable once produced; downstream matches borrow it rather than
/// copy it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRecord {
    pub tx: Transaction,
    /// Transaction ID, computed once at scan time.
    pub txid: Hash256,
    /// Hash of the containing block.
    pub block_hash: Hash256,
    /// Index of the transaction within its block.
    pub block_index: usize,
    /// Height of the containing block.
    pub height: u64,
}

/// One watched address paid by one scanned output.
///
/// An output paying several watched addresses yields one match per
/// address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputMatch<'a> {
    /// The watched address this output pays.
    pub address: Address,
    /// Face value of the output, in strands.
    pub amount: u64,
    /// Index of the output within the transaction.
    pub vout: u32,
    /// The producing transaction.
    pub record: &'a TxRecord,
}

impl OutputMatch<'_> {
    /// Outpoint of the matched output.
    pub fn outpoint(&self) -> OutPoint {
        OutPoint {
            txid: self.record.txid,
            vout: self.vout,
        }
    }

    /// Locking script of the matched output.
    pub fn pk_script(&self) -> &[u8] {
        &self.record.tx.outputs[self.vout as usize].pk_script
    }
}

/// Enumerate every transaction in the DAG, heights 0 through the
/// reported maximum inclusive.
///
/// A height may hold several tied blocks; all of them are read. One
/// round trip per height plus one per block, sequentially.
pub async fn all_transactions(ledger: &dyn LedgerQuery) -> Result<Vec<TxRecord>, WalletError> {
    let tips = ledger.tips().await?;
    let mut records = Vec::new();

    for height in 0..=tips.max_height {
        let hashes = ledger.block_hashes_at(height).await?;
        tracing::debug!(height, blocks = hashes.len(), "scanning height");

        for hash in hashes {
            let block = ledger.block(&hash).await?;
            for (block_index, tx) in block.transactions.into_iter().enumerate() {
                let txid = tx.txid()?;
                records.push(TxRecord {
                    tx,
                    txid,
                    block_hash: hash,
                    block_index,
                    height,
                });
            }
        }
    }

    tracing::debug!(transactions = records.len(), "ledger scan complete");
    Ok(records)
}

/// Index scanned records by transaction ID.
///
/// Later occurrences of a duplicate ID shadow earlier ones, matching the
/// scan's last-writer-wins view of a DAG where one transaction may sit
/// in several blocks.
pub(crate) fn tx_index(records: &[TxRecord]) -> HashMap<Hash256, &TxRecord> {
    records.iter().map(|record| (record.txid, record)).collect()
}

/// Extract every (watched address, output) pair from the scanned records.
///
/// Watch-set membership is equality of canonical encoded addresses. A
/// script that fails to decode aborts the whole match pass; no partial
/// result is returned.
pub fn match_outputs<'a>(
    records: &'a [TxRecord],
    watch_set: &[Address],
    decoder: &dyn ScriptDecoder,
    params: &Params,
) -> Result<Vec<OutputMatch<'a>>, WalletError> {
    let mut matches = Vec::new();

    for record in records {
        for (vout, output) in record.tx.outputs.iter().enumerate() {
            let owners = decoder.extract_addresses(&output.pk_script, params.network)?;
            for owner in owners {
                if watch_set.contains(&owner) {
                    matches.push(OutputMatch {
                        address: owner,
                        amount: output.value,
                        vout: vout as u32,
                        record,
                    });
                }
            }
        }
    }

    tracing::debug!(matches = matches.len(), watched = watch_set.len(), "matched outputs");
    Ok(matches)
}

/// Filter matches down to those spendable as of `tip_height`.
///
/// The tip acts as the candidate in the maturity rule: a match survives
/// iff `tip_height > record.height + window`.
pub fn spendable_subset<'a>(
    matches: Vec<OutputMatch<'a>>,
    tip_height: u64,
    policy: &MaturityPolicy,
) -> Vec<OutputMatch<'a>> {
    matches
        .into_iter()
        .filter(|m| policy.is_spendable(tip_height, m.record.height))
        .collect()
}
