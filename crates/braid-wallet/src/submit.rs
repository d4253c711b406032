//! Transaction submission and inclusion polling.
//!
//! Submission is assemble, unlock, sign, broadcast, in that order.
//! Signing is best effort: inputs the signer cannot sign are reported
//! on the receipt but do not block the broadcast. Only a broadcast
//! failure is fatal to the send.

use std::time::Duration;

use braid_core::traits::{Broadcaster, LedgerQuery, TxAssembler, TxSigner};
use braid_core::types::Hash256;
use tokio::time::Instant;

use crate::error::WalletError;
use crate::select::SelectionPlan;

/// Seconds the node wallet stays unlocked for signing.
const UNLOCK_TIMEOUT_SECS: u64 = 60;

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// ID the network accepted the transaction under.
    pub txid: Hash256,
    /// Inputs the signer could not sign; submission proceeded anyway.
    pub unsigned_inputs: Vec<usize>,
}

/// Assemble, sign, and broadcast the plan's transaction.
pub async fn submit(
    plan: &SelectionPlan,
    assembler: &dyn TxAssembler,
    signer: &dyn TxSigner,
    broadcaster: &dyn Broadcaster,
    passphrase: &str,
) -> Result<SubmitReceipt, WalletError> {
    let tx = assembler
        .assemble(&plan.outpoints(), &plan.payouts())
        .await?;

    signer.unlock(passphrase, UNLOCK_TIMEOUT_SECS).await?;
    let signed = signer.sign(&tx, &plan.prev_scripts()).await?;
    for &index in &signed.unsigned_inputs {
        tracing::warn!(index, "transaction input left unsigned");
    }

    let txid = broadcaster.broadcast(&signed.tx).await?;
    tracing::info!(%txid, inputs = plan.inputs.len(), "transaction broadcast");

    Ok(SubmitReceipt {
        txid,
        unsigned_inputs: signed.unsigned_inputs,
    })
}

/// Polling knobs for [`wait_for_inclusion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Wall-clock pause between scan passes.
    pub poll_interval: Duration,
    /// Absolute deadline before giving up.
    pub timeout: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(4),
            timeout: Duration::from_secs(60),
        }
    }
}

/// How an inclusion wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The transaction was observed in a block.
    Included { block_hash: Hash256, height: u64 },
    /// At least one scan pass completed cleanly without finding the
    /// transaction before the deadline.
    NotFound,
    /// The deadline expired and no scan pass ever completed cleanly.
    TimedOut,
}

/// Poll the ledger until `txid` appears in a block at or above
/// `from_height`, or the deadline elapses.
///
/// Transient ledger errors are tolerated: the failed pass is abandoned
/// and the next poll starts fresh. The returned future is cancel safe;
/// callers race it against a shutdown signal rather than passing a
/// token in.
pub async fn wait_for_inclusion(
    ledger: &dyn LedgerQuery,
    txid: &Hash256,
    from_height: u64,
    options: &WaitOptions,
) -> WaitOutcome {
    let deadline = Instant::now() + options.timeout;
    let mut clean_pass = false;

    loop {
        match scan_pass(ledger, txid, from_height).await {
            Ok(Some((block_hash, height))) => {
                tracing::info!(%txid, height, "transaction included");
                return WaitOutcome::Included { block_hash, height };
            }
            Ok(None) => clean_pass = true,
            Err(e) => {
                tracing::debug!(error = %e, "inclusion poll failed");
            }
        }

        if Instant::now() >= deadline {
            return if clean_pass {
                WaitOutcome::NotFound
            } else {
                WaitOutcome::TimedOut
            };
        }
        tokio::time::sleep(options.poll_interval).await;
    }
}

/// One full search of heights `from_height..=tip`, newest first.
async fn scan_pass(
    ledger: &dyn LedgerQuery,
    txid: &Hash256,
    from_height: u64,
) -> Result<Option<(Hash256, u64)>, WalletError> {
    let tips = ledger.tips().await?;
    if tips.max_height < from_height {
        return Ok(None);
    }

    let mut height = tips.max_height;
    loop {
        for hash in ledger.block_hashes_at(height).await? {
            let block = ledger.block(&hash).await?;
            for tx in &block.transactions {
                if tx.txid()? == *txid {
                    return Ok(Some((hash, height)));
                }
            }
        }
        if height == from_height {
            return Ok(None);
        }
        height -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::SelectedInput;
    use braid_core::address::{Address, Network};
    use braid_core::constants::TX_VERSION;
    use braid_core::error::{AssembleError, BroadcastError, LedgerError, SignError};
    use braid_core::script;
    use braid_core::types::{
        Block, BlockHeader, DagTips, OutPoint, PrevScript, SignedTx, Transaction, TxInput,
        TxOutput,
    };
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // --- Mocks ---

    struct MockAssembler;

    #[async_trait::async_trait]
    impl TxAssembler for MockAssembler {
        async fn assemble(
            &self,
            inputs: &[OutPoint],
            payouts: &BTreeMap<String, u64>,
        ) -> Result<Transaction, AssembleError> {
            let mut outputs = Vec::with_capacity(payouts.len());
            for (encoded, &value) in payouts {
                let address = Address::decode(encoded)
                    .map_err(|e| AssembleError::Failed(e.to_string()))?;
                outputs.push(TxOutput {
                    value,
                    pk_script: script::pay_to_address(&address),
                });
            }
            Ok(Transaction {
                version: TX_VERSION,
                inputs: inputs
                    .iter()
                    .map(|op| TxInput {
                        previous_output: op.clone(),
                        signature_script: Vec::new(),
                    })
                    .collect(),
                outputs,
                lock_time: 0,
            })
        }
    }

    struct FailingAssembler;

    #[async_trait::async_trait]
    impl TxAssembler for FailingAssembler {
        async fn assemble(
            &self,
            _inputs: &[OutPoint],
            _payouts: &BTreeMap<String, u64>,
        ) -> Result<Transaction, AssembleError> {
            Err(AssembleError::Failed("node refused".into()))
        }
    }

    struct MockSigner {
        fail_unlock: bool,
        skip_inputs: Vec<usize>,
    }

    #[async_trait::async_trait]
    impl TxSigner for MockSigner {
        async fn unlock(&self, _passphrase: &str, _timeout_secs: u64) -> Result<(), SignError> {
            if self.fail_unlock {
                return Err(SignError::Unlock("bad passphrase".into()));
            }
            Ok(())
        }

        async fn sign(
            &self,
            tx: &Transaction,
            _prev_scripts: &[PrevScript],
        ) -> Result<SignedTx, SignError> {
            let mut signed = tx.clone();
            for (i, input) in signed.inputs.iter_mut().enumerate() {
                if !self.skip_inputs.contains(&i) {
                    input.signature_script = vec![0xCC; 64];
                }
            }
            Ok(SignedTx {
                tx: signed,
                unsigned_inputs: self.skip_inputs.clone(),
            })
        }
    }

    struct MockBroadcaster {
        reject: bool,
        calls: AtomicUsize,
    }

    impl MockBroadcaster {
        fn new(reject: bool) -> Self {
            Self { reject, calls: AtomicUsize::new(0) }
        }
    }

    #[async_trait::async_trait]
    impl Broadcaster for MockBroadcaster {
        async fn broadcast(&self, tx: &Transaction) -> Result<Hash256, BroadcastError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.reject {
                return Err(BroadcastError::Rejected("orphan inputs".into()));
            }
            tx.txid().map_err(|e| BroadcastError::Transport(e.to_string()))
        }
    }

    #[derive(Default)]
    struct MockLedger {
        tips: DagTips,
        heights: HashMap<u64, Vec<Hash256>>,
        blocks: HashMap<Hash256, Block>,
        next_nonce: u64,
    }

    impl MockLedger {
        fn add_block(&mut self, height: u64, txs: Vec<Transaction>) -> Hash256 {
            let header = BlockHeader {
                version: 1,
                parents: vec![Hash256::ZERO],
                merkle_root: Hash256::ZERO,
                timestamp: 1_700_000_000 + height,
                nonce: self.next_nonce,
            };
            self.next_nonce += 1;
            let hash = header.hash();
            self.heights.entry(height).or_default().push(hash);
            self.blocks.insert(hash, Block { header, transactions: txs });
            if height > self.tips.max_height {
                self.tips.max_height = height;
            }
            self.tips.block_count += 1;
            hash
        }
    }

    #[async_trait::async_trait]
    impl LedgerQuery for MockLedger {
        async fn tips(&self) -> Result<DagTips, LedgerError> {
            Ok(self.tips.clone())
        }

        async fn block_hashes_at(&self, height: u64) -> Result<Vec<Hash256>, LedgerError> {
            Ok(self.heights.get(&height).cloned().unwrap_or_default())
        }

        async fn block(&self, hash: &Hash256) -> Result<Block, LedgerError> {
            self.blocks
                .get(hash)
                .cloned()
                .ok_or_else(|| LedgerError::InvalidResponse(format!("unknown block {hash}")))
        }
    }

    struct UnavailableLedger;

    #[async_trait::async_trait]
    impl LedgerQuery for UnavailableLedger {
        async fn tips(&self) -> Result<DagTips, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".into()))
        }

        async fn block_hashes_at(&self, _height: u64) -> Result<Vec<Hash256>, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".into()))
        }

        async fn block(&self, _hash: &Hash256) -> Result<Block, LedgerError> {
            Err(LedgerError::Unavailable("connection refused".into()))
        }
    }

    /// Ledger whose block only becomes visible from the second tips()
    /// call onward.
    struct LateLedger {
        inner: MockLedger,
        tips_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl LedgerQuery for LateLedger {
        async fn tips(&self) -> Result<DagTips, LedgerError> {
            if self.tips_calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(DagTips::default());
            }
            self.inner.tips().await
        }

        async fn block_hashes_at(&self, height: u64) -> Result<Vec<Hash256>, LedgerError> {
            self.inner.block_hashes_at(height).await
        }

        async fn block(&self, hash: &Hash256) -> Result<Block, LedgerError> {
            self.inner.block(hash).await
        }
    }

    // --- Fixtures ---

    fn addr(byte: u8) -> Address {
        Address::from_pubkey_hash(Hash256([byte; 32]), Network::Mainnet)
    }

    fn sample_plan() -> SelectionPlan {
        let owner = addr(0x01);
        SelectionPlan {
            inputs: vec![SelectedInput {
                outpoint: OutPoint { txid: Hash256([0x11; 32]), vout: 0 },
                amount: 100,
                owner: owner.clone(),
                pk_script: script::pay_to_address(&owner),
            }],
            destination: addr(0x0D),
            destination_total: 70,
            change: BTreeMap::from([(owner.encode(), 25)]),
            fee: 5,
        }
    }

    fn coinbase(value: u64, owner: &Address, tag: u64) -> Transaction {
        Transaction {
            version: TX_VERSION,
            inputs: vec![TxInput {
                previous_output: OutPoint::null(),
                signature_script: tag.to_le_bytes().to_vec(),
            }],
            outputs: vec![TxOutput {
                value,
                pk_script: script::pay_to_address(owner),
            }],
            lock_time: 0,
        }
    }

    fn quick_options() -> WaitOptions {
        WaitOptions {
            poll_interval: Duration::from_secs(1),
            timeout: Duration::from_secs(5),
        }
    }

    // --- submit ---

    #[tokio::test]
    async fn submit_signs_and_broadcasts() {
        let plan = sample_plan();
        let signer = MockSigner { fail_unlock: false, skip_inputs: vec![] };
        let broadcaster = MockBroadcaster::new(false);

        let receipt = submit(&plan, &MockAssembler, &signer, &broadcaster, "pass")
            .await
            .unwrap();

        assert!(receipt.unsigned_inputs.is_empty());
        assert_eq!(broadcaster.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn partial_signing_does_not_block_broadcast() {
        let plan = sample_plan();
        let signer = MockSigner { fail_unlock: false, skip_inputs: vec![0] };
        let broadcaster = MockBroadcaster::new(false);

        let receipt = submit(&plan, &MockAssembler, &signer, &broadcaster, "pass")
            .await
            .unwrap();

        assert_eq!(receipt.unsigned_inputs, vec![0]);
        assert_eq!(broadcaster.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unlock_failure_stops_before_broadcast() {
        let plan = sample_plan();
        let signer = MockSigner { fail_unlock: true, skip_inputs: vec![] };
        let broadcaster = MockBroadcaster::new(false);

        let err = submit(&plan, &MockAssembler, &signer, &broadcaster, "wrong")
            .await
            .unwrap_err();

        assert!(matches!(err, WalletError::Sign(SignError::Unlock(_))));
        assert_eq!(broadcaster.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn broadcast_rejection_is_fatal() {
        let plan = sample_plan();
        let signer = MockSigner { fail_unlock: false, skip_inputs: vec![] };
        let broadcaster = MockBroadcaster::new(true);

        let err = submit(&plan, &MockAssembler, &signer, &broadcaster, "pass")
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Broadcast(BroadcastError::Rejected(_))));
    }

    #[tokio::test]
    async fn assemble_failure_stops_everything() {
        let plan = sample_plan();
        let signer = MockSigner { fail_unlock: false, skip_inputs: vec![] };
        let broadcaster = MockBroadcaster::new(false);

        let err = submit(&plan, &FailingAssembler, &signer, &broadcaster, "pass")
            .await
            .unwrap_err();
        assert!(matches!(err, WalletError::Assemble(_)));
        assert_eq!(broadcaster.calls.load(Ordering::SeqCst), 0);
    }

    // --- wait_for_inclusion ---

    #[tokio::test(start_paused = true)]
    async fn finds_transaction_in_first_pass() {
        let miner = addr(0x01);
        let target = coinbase(50, &miner, 42);
        let txid = target.txid().unwrap();

        let mut ledger = MockLedger::default();
        ledger.add_block(0, vec![coinbase(50, &miner, 0)]);
        ledger.add_block(1, vec![coinbase(50, &miner, 1)]);
        let hash = ledger.add_block(2, vec![target]);

        let outcome = wait_for_inclusion(&ledger, &txid, 0, &quick_options()).await;
        assert_eq!(outcome, WaitOutcome::Included { block_hash: hash, height: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn reports_height_of_containing_block() {
        let miner = addr(0x01);
        let target = coinbase(50, &miner, 42);
        let txid = target.txid().unwrap();

        let mut ledger = MockLedger::default();
        ledger.add_block(0, vec![coinbase(50, &miner, 0)]);
        let hash = ledger.add_block(1, vec![target]);
        ledger.add_block(2, vec![coinbase(50, &miner, 2)]);
        ledger.add_block(3, vec![coinbase(50, &miner, 3)]);

        let outcome = wait_for_inclusion(&ledger, &txid, 0, &quick_options()).await;
        assert_eq!(outcome, WaitOutcome::Included { block_hash: hash, height: 1 });
    }

    #[tokio::test(start_paused = true)]
    async fn not_found_after_clean_passes() {
        let miner = addr(0x01);
        let mut ledger = MockLedger::default();
        ledger.add_block(0, vec![coinbase(50, &miner, 0)]);

        let absent = Hash256([0xAB; 32]);
        let outcome = wait_for_inclusion(&ledger, &absent, 0, &quick_options()).await;
        assert_eq!(outcome, WaitOutcome::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_when_ledger_never_answers() {
        let absent = Hash256([0xAB; 32]);
        let outcome = wait_for_inclusion(&UnavailableLedger, &absent, 0, &quick_options()).await;
        assert_eq!(outcome, WaitOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn ignores_blocks_below_from_height() {
        let miner = addr(0x01);
        let target = coinbase(50, &miner, 42);
        let txid = target.txid().unwrap();

        let mut ledger = MockLedger::default();
        ledger.add_block(0, vec![coinbase(50, &miner, 0)]);
        ledger.add_block(1, vec![target]);
        ledger.add_block(2, vec![coinbase(50, &miner, 2)]);

        // The transaction sits at height 1, below the search floor.
        let outcome = wait_for_inclusion(&ledger, &txid, 2, &quick_options()).await;
        assert_eq!(outcome, WaitOutcome::NotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn finds_transaction_appearing_on_later_poll() {
        let miner = addr(0x01);
        let target = coinbase(50, &miner, 42);
        let txid = target.txid().unwrap();

        let mut inner = MockLedger::default();
        inner.add_block(0, vec![coinbase(50, &miner, 0)]);
        let hash = inner.add_block(1, vec![target]);
        let ledger = LateLedger { inner, tips_calls: AtomicUsize::new(0) };

        // First pass sees a tip of zero and misses the block at height
        // one; the next poll picks it up.
        let outcome = wait_for_inclusion(&ledger, &txid, 0, &quick_options()).await;
        assert_eq!(outcome, WaitOutcome::Included { block_hash: hash, height: 1 });
    }
}
