//! Capability interfaces consumed by the wallet engine.
//!
//! These traits define the contracts between the engine and the node:
//! - [`LedgerQuery`]: read access to the block DAG (braid-rpc implements)
//! - [`ScriptDecoder`]: locking-script decoding
//!   ([`StandardDecoder`](crate::script::StandardDecoder) implements)
//! - [`TxAssembler`]: unsigned transaction construction (braid-rpc implements)
//! - [`TxSigner`]: wallet unlock and input signing (braid-rpc implements)
//! - [`Broadcaster`]: transaction submission (braid-rpc implements)
//!
//! The engine never talks to the node directly; everything flows through
//! these interfaces so tests can substitute in-memory fakes.

use std::collections::BTreeMap;

use crate::address::{Address, Network};
use crate::error::{AssembleError, BroadcastError, LedgerError, ScriptError, SignError};
use crate::types::{Block, DagTips, Hash256, OutPoint, PrevScript, SignedTx, Transaction};

/// Read-only view of the node's block DAG.
///
/// A DAG height may hold zero, one, or several blocks; heights are dense
/// from 0 to [`DagTips::max_height`] but individual heights may be empty.
#[async_trait::async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Current DAG tip summary.
    async fn tips(&self) -> Result<DagTips, LedgerError>;

    /// Hashes of every block at the given height.
    ///
    /// Returns an empty vec when no block occupies that height.
    async fn block_hashes_at(&self, height: u64) -> Result<Vec<Hash256>, LedgerError>;

    /// Fetch a full block by hash.
    async fn block(&self, hash: &Hash256) -> Result<Block, LedgerError>;
}

/// Decodes locking scripts into the addresses they pay.
pub trait ScriptDecoder: Send + Sync {
    /// Decode a locking script into its paid addresses.
    ///
    /// Data-carrier scripts decode to an empty vec.
    fn extract_addresses(
        &self,
        pk_script: &[u8],
        network: Network,
    ) -> Result<Vec<Address>, ScriptError>;
}

/// Builds unsigned transactions from chosen inputs and payouts.
#[async_trait::async_trait]
pub trait TxAssembler: Send + Sync {
    /// Build an unsigned transaction spending `inputs` and paying
    /// `payouts` (canonical address string to amount in strands).
    async fn assemble(
        &self,
        inputs: &[OutPoint],
        payouts: &BTreeMap<String, u64>,
    ) -> Result<Transaction, AssembleError>;
}

/// Unlocks a signing wallet and signs transaction inputs.
#[async_trait::async_trait]
pub trait TxSigner: Send + Sync {
    /// Unlock the signing wallet for `timeout_secs` seconds.
    async fn unlock(&self, passphrase: &str, timeout_secs: u64) -> Result<(), SignError>;

    /// Sign every input of `tx` the signer holds keys for.
    ///
    /// `prev_scripts` carries the locking script of each outpoint being
    /// spent. Inputs the signer cannot sign are listed in the returned
    /// [`SignedTx::unsigned_inputs`], not treated as errors; only a
    /// wholesale signing failure is an error.
    async fn sign(
        &self,
        tx: &Transaction,
        prev_scripts: &[PrevScript],
    ) -> Result<SignedTx, SignError>;
}

/// Submits signed transactions to the network.
#[async_trait::async_trait]
pub trait Broadcaster: Send + Sync {
    /// Submit a signed transaction. Returns its txid on acceptance.
    async fn broadcast(&self, tx: &Transaction) -> Result<Hash256, BroadcastError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::TX_VERSION;
    use crate::script;
    use crate::types::{BlockHeader, TxInput, TxOutput};
    use std::collections::HashMap;

    // ------------------------------------------------------------------
    // Mock: LedgerQuery
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MockLedger {
        tips: DagTips,
        heights: HashMap<u64, Vec<Hash256>>,
        blocks: HashMap<Hash256, Block>,
    }

    impl MockLedger {
        fn insert_block(&mut self, height: u64, hash: Hash256, block: Block) {
            self.heights.entry(height).or_default().push(hash);
            self.blocks.insert(hash, block);
            if height > self.tips.max_height {
                self.tips.max_height = height;
            }
            self.tips.block_count += 1;
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

    // ------------------------------------------------------------------
    // Mock: ScriptDecoder (fixed address list, ignores the script)
    // ------------------------------------------------------------------

    struct FixedDecoder {
        addresses: Vec<Address>,
    }

    impl ScriptDecoder for FixedDecoder {
        fn extract_addresses(
            &self,
            _pk_script: &[u8],
            _network: Network,
        ) -> Result<Vec<Address>, ScriptError> {
            Ok(self.addresses.clone())
        }
    }

    // ------------------------------------------------------------------
    // Mock: TxAssembler
    // ------------------------------------------------------------------

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

    // ------------------------------------------------------------------
    // Mock: TxSigner
    // ------------------------------------------------------------------

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

    // ------------------------------------------------------------------
    // Mock: Broadcaster
    // ------------------------------------------------------------------

    struct MockBroadcaster {
        reject: bool,
    }

    #[async_trait::async_trait]
    impl Broadcaster for MockBroadcaster {
        async fn broadcast(&self, tx: &Transaction) -> Result<Hash256, BroadcastError> {
            if self.reject {
                return Err(BroadcastError::Rejected("orphan inputs".into()));
            }
            tx.txid().map_err(|e| BroadcastError::Transport(e.to_string()))
        }
    }

    // ------------------------------------------------------------------
    // Object safety: verify each trait is dyn-compatible
    // ------------------------------------------------------------------

    fn _assert_ledger_query_object_safe(_: &dyn LedgerQuery) {}
    fn _assert_script_decoder_object_safe(_: &dyn ScriptDecoder) {}
    fn _assert_tx_assembler_object_safe(_: &dyn TxAssembler) {}
    fn _assert_tx_signer_object_safe(_: &dyn TxSigner) {}
    fn _assert_broadcaster_object_safe(_: &dyn Broadcaster) {}

    // ------------------------------------------------------------------
    // Fixtures
    // ------------------------------------------------------------------

    fn sample_address(byte: u8) -> Address {
        Address::from_pubkey_hash(Hash256([byte; 32]), Network::Mainnet)
    }

    fn sample_tx(value: u64) -> Transaction {
        Transaction {
            version: TX_VERSION,
            inputs: vec![TxInput {
                previous_output: OutPoint { txid: Hash256([0x01; 32]), vout: 0 },
                signature_script: Vec::new(),
            }],
            outputs: vec![TxOutput {
                value,
                pk_script: script::pay_to_address(&sample_address(0xAA)),
            }],
            lock_time: 0,
        }
    }

    fn sample_block(txs: Vec<Transaction>) -> Block {
        Block {
            header: BlockHeader {
                version: 1,
                parents: vec![Hash256::ZERO],
                merkle_root: Hash256::ZERO,
                timestamp: 1_700_000_000,
                nonce: 0,
            },
            transactions: txs,
        }
    }

    // ------------------------------------------------------------------
    // LedgerQuery tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn ledger_tips_summary() {
        let mut ledger = MockLedger::default();
        ledger.insert_block(0, Hash256([0x10; 32]), sample_block(vec![]));
        ledger.insert_block(1, Hash256([0x11; 32]), sample_block(vec![]));
        ledger.insert_block(1, Hash256([0x12; 32]), sample_block(vec![]));

        let tips = ledger.tips().await.unwrap();
        assert_eq!(tips.max_height, 1);
        assert_eq!(tips.block_count, 3);
    }

    #[tokio::test]
    async fn ledger_multiple_blocks_per_height() {
        let mut ledger = MockLedger::default();
        ledger.insert_block(5, Hash256([0x21; 32]), sample_block(vec![]));
        ledger.insert_block(5, Hash256([0x22; 32]), sample_block(vec![]));

        let hashes = ledger.block_hashes_at(5).await.unwrap();
        assert_eq!(hashes, vec![Hash256([0x21; 32]), Hash256([0x22; 32])]);
    }

    #[tokio::test]
    async fn ledger_empty_height() {
        let ledger = MockLedger::default();
        assert!(ledger.block_hashes_at(99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ledger_block_lookup() {
        let mut ledger = MockLedger::default();
        let hash = Hash256([0x30; 32]);
        ledger.insert_block(0, hash, sample_block(vec![sample_tx(50)]));

        let block = ledger.block(&hash).await.unwrap();
        assert_eq!(block.transactions.len(), 1);
        assert!(ledger.block(&Hash256([0xFF; 32])).await.is_err());
    }

    // ------------------------------------------------------------------
    // ScriptDecoder tests
    // ------------------------------------------------------------------

    #[test]
    fn decoder_as_dyn() {
        let decoder = FixedDecoder { addresses: vec![sample_address(0x01)] };
        let dyn_decoder: &dyn ScriptDecoder = &decoder;
        let addrs = dyn_decoder.extract_addresses(&[0, 0], Network::Mainnet).unwrap();
        assert_eq!(addrs, vec![sample_address(0x01)]);
    }

    // ------------------------------------------------------------------
    // TxAssembler tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn assembler_builds_unsigned_tx() {
        let inputs = vec![
            OutPoint { txid: Hash256([0x01; 32]), vout: 0 },
            OutPoint { txid: Hash256([0x02; 32]), vout: 3 },
        ];
        let mut payouts = BTreeMap::new();
        payouts.insert(sample_address(0xAA).encode(), 70u64);
        payouts.insert(sample_address(0xBB).encode(), 25u64);

        let tx = MockAssembler.assemble(&inputs, &payouts).await.unwrap();
        assert_eq!(tx.inputs.len(), 2);
        assert!(tx.inputs.iter().all(|i| i.signature_script.is_empty()));
        assert_eq!(tx.outputs.len(), 2);
        assert_eq!(tx.total_output_value(), Some(95));
    }

    #[tokio::test]
    async fn assembler_rejects_bad_address() {
        let mut payouts = BTreeMap::new();
        payouts.insert("not-an-address".to_string(), 10u64);
        assert!(MockAssembler.assemble(&[], &payouts).await.is_err());
    }

    // ------------------------------------------------------------------
    // TxSigner tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn signer_unlock_failure() {
        let signer = MockSigner { fail_unlock: true, skip_inputs: vec![] };
        let err = signer.unlock("wrong", 60).await.unwrap_err();
        assert!(matches!(err, SignError::Unlock(_)));
    }

    #[tokio::test]
    async fn signer_signs_all_inputs() {
        let signer = MockSigner { fail_unlock: false, skip_inputs: vec![] };
        signer.unlock("pass", 60).await.unwrap();

        let tx = sample_tx(100);
        let signed = signer.sign(&tx, &[]).await.unwrap();
        assert!(signed.unsigned_inputs.is_empty());
        assert!(signed.tx.inputs.iter().all(|i| !i.signature_script.is_empty()));
    }

    #[tokio::test]
    async fn signer_reports_unsigned_inputs() {
        let signer = MockSigner { fail_unlock: false, skip_inputs: vec![0] };
        let signed = signer.sign(&sample_tx(100), &[]).await.unwrap();
        assert_eq!(signed.unsigned_inputs, vec![0]);
        assert!(signed.tx.inputs[0].signature_script.is_empty());
    }

    // ------------------------------------------------------------------
    // Broadcaster tests
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn broadcaster_returns_txid() {
        let tx = sample_tx(42);
        let txid = MockBroadcaster { reject: false }.broadcast(&tx).await.unwrap();
        assert_eq!(txid, tx.txid().unwrap());
    }

    #[tokio::test]
    async fn broadcaster_rejection() {
        let err = MockBroadcaster { reject: true }
            .broadcast(&sample_tx(42))
            .await
            .unwrap_err();
        assert!(matches!(err, BroadcastError::Rejected(_)));
    }
}
