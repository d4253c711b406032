//! Greedy coin selection and payout construction.
//!
//! Selection is first-fit in scan order: outputs are consumed until the
//! destination is fully funded and the selected inputs also cover the
//! fee. Change from the output that overshoots the destination returns
//! to that output's original owner, never to the requester.

use std::collections::BTreeMap;

use braid_core::address::Address;
use braid_core::types::{OutPoint, PrevScript};

use crate::error::WalletError;
use crate::scan::OutputMatch;

/// One spendable output chosen by the selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInput {
    pub outpoint: OutPoint,
    /// Face value of the consumed output, in strands.
    pub amount: u64,
    /// Owner the output belonged to; change is credited back here.
    pub owner: Address,
    /// Locking script of the consumed output, for the signer.
    pub pk_script: Vec<u8>,
}

/// Inputs and payouts for one send, ready for raw-transaction assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPlan {
    /// Chosen inputs, in selection order.
    pub inputs: Vec<SelectedInput>,
    pub destination: Address,
    /// Amount credited to the destination; equals the requested amount.
    pub destination_total: u64,
    /// Change credited back to input owners, keyed by canonical address
    /// string.
    pub change: BTreeMap<String, u64>,
    /// Fee the plan leaves unclaimed between inputs and payouts.
    pub fee: u64,
}

impl SelectionPlan {
    /// Sum of the selected input face values.
    pub fn input_total(&self) -> u64 {
        self.inputs.iter().map(|input| input.amount).sum()
    }

    /// Destination and change merged into one address-to-amount map.
    ///
    /// A destination that is also a change owner collapses into a single
    /// entry here; the plan itself keeps them separate.
    pub fn payouts(&self) -> BTreeMap<String, u64> {
        let mut payouts = self.change.clone();
        *payouts.entry(self.destination.encode()).or_insert(0) += self.destination_total;
        payouts
    }

    /// Outpoints of the selected inputs, in selection order.
    pub fn outpoints(&self) -> Vec<OutPoint> {
        self.inputs.iter().map(|input| input.outpoint.clone()).collect()
    }

    /// Previous locking scripts for the signer, in selection order.
    pub fn prev_scripts(&self) -> Vec<PrevScript> {
        self.inputs
            .iter()
            .map(|input| PrevScript {
                outpoint: input.outpoint.clone(),
                pk_script: input.pk_script.clone(),
            })
            .collect()
    }
}

/// Walk the spendable set in order and build a plan paying `amount` to
/// `destination` with `fee` left for the network.
///
/// The walk stops once the destination is fully funded and the selected
/// inputs cover `amount + fee`; when whole outputs sum exactly to the
/// requested amount, one more output is consumed so its change funds
/// the fee. Exhausting the set first fails with
/// [`WalletError::InsufficientFunds`] carrying the full spendable sum.
pub fn select_and_build(
    spendable: &[OutputMatch<'_>],
    destination: &Address,
    amount: u64,
    fee: u64,
) -> Result<SelectionPlan, WalletError> {
    let target = amount.checked_add(fee).ok_or(WalletError::AmountOverflow)?;

    let mut inputs: Vec<SelectedInput> = Vec::new();
    let mut change: BTreeMap<String, u64> = BTreeMap::new();
    let mut dest_total: u64 = 0;
    let mut input_total: u64 = 0;

    for m in spendable {
        if dest_total >= amount && input_total >= target {
            break;
        }

        let projected = dest_total
            .checked_add(m.amount)
            .ok_or(WalletError::AmountOverflow)?;
        if projected > amount {
            // Overshoot: fund what the destination still needs, return
            // the rest minus the fee to this output's owner.
            let needed = amount - dest_total;
            dest_total += needed;
            if let Some(chg) = m.amount.checked_sub(needed).and_then(|v| v.checked_sub(fee)) {
                if chg > 0 {
                    *change.entry(m.address.encode()).or_insert(0) += chg;
                }
            }
        } else {
            dest_total = projected;
        }

        input_total = input_total
            .checked_add(m.amount)
            .ok_or(WalletError::AmountOverflow)?;
        inputs.push(SelectedInput {
            outpoint: m.outpoint(),
            amount: m.amount,
            owner: m.address.clone(),
            pk_script: m.pk_script().to_vec(),
        });
    }

    if dest_total < amount || input_total < target {
        return Err(WalletError::InsufficientFunds {
            have: input_total,
            need: target,
        });
    }

    tracing::debug!(
        inputs = inputs.len(),
        destination = %destination,
        amount,
        fee,
        change_entries = change.len(),
        "selection complete"
    );

    Ok(SelectionPlan {
        inputs,
        destination: destination.clone(),
        destination_total: dest_total,
        change,
        fee,
    })
}
