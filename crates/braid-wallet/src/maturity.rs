//! Maturity classification for scanned outputs.

use braid_core::params::Params;

/// Which input of a spending transaction anchors the producing height when
/// classifying that transaction's outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaturityReference {
    /// Anchor at the first input's producing transaction.
    ///
    /// This replicates the scanner's long-standing behavior: coinbase and
    /// other unresolvable references anchor at height 0, so deep coinbase
    /// outputs mature against genesis.
    #[default]
    FirstInput,
    /// Anchor at the highest producing height across all resolvable inputs.
    NewestInput,
}

/// The maturity rule: an output is spendable once its consumer sits more
/// than `window` heights above the producer.
///
/// Height distance approximates the DAG's true confirmation count. The
/// exact rule would measure the shortest blue-block path between the two
/// transactions, which the node does not expose over RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaturityPolicy {
    /// Minimum height distance before an output may be spent.
    pub window: u64,
    /// Input anchoring rule for output-side classification.
    pub reference: MaturityReference,
}

impl MaturityPolicy {
    /// Policy with the given window and the compatibility default
    /// [`MaturityReference::FirstInput`].
    pub fn new(window: u64) -> Self {
        Self {
            window,
            reference: MaturityReference::FirstInput,
        }
    }

    /// Policy using the network's coinbase maturity window.
    pub fn from_params(params: &Params) -> Self {
        Self::new(params.coinbase_maturity)
    }

    /// Same policy with a different anchoring rule.
    pub fn with_reference(mut self, reference: MaturityReference) -> Self {
        self.reference = reference;
        self
    }

    /// Whether an output produced at `producing_height` may be spent by a
    /// transaction at `candidate_height`.
    pub fn is_spendable(&self, candidate_height: u64, producing_height: u64) -> bool {
        candidate_height > producing_height.saturating_add(self.window)
    }
}
