//! Wire DTOs for the braid node's JSON-RPC surface.
//!
//! Hashes travel as 64-character hex strings, output values as whole
//! strands, and raw transactions as hex-encoded bincode. Conversions
//! into the domain types validate shape and reject anything malformed.

use serde::{Deserialize, Serialize};

use braid_core::types::{
    Block, BlockHeader, DagTips, Hash256, OutPoint, PrevScript, Transaction, TxInput, TxOutput,
};

use crate::error::RpcError;

/// JSON representation of the DAG frontier, from `gettips`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagTipsJson {
    /// Height of the highest known block.
    pub max_height: u64,
    /// Total number of blocks in the DAG.
    pub block_count: u64,
    /// Current tip block hashes as hex.
    pub tips: Vec<String>,
}

/// JSON representation of a block with full transactions, from `getblock`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockJson {
    /// Block header hash as hex.
    pub hash: String,
    /// Protocol version.
    pub version: u64,
    /// Parent block hashes as hex.
    pub parents: Vec<String>,
    /// Merkle root as hex.
    pub merkle_root: String,
    /// Block timestamp (Unix seconds).
    pub timestamp: u64,
    /// Proof-of-work nonce.
    pub nonce: u64,
    /// Full transactions in block order.
    pub transactions: Vec<TransactionJson>,
}

/// JSON representation of a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionJson {
    /// Transaction ID as hex.
    pub txid: String,
    /// Transaction version.
    pub version: u64,
    /// Inputs in order.
    pub inputs: Vec<TxInputJson>,
    /// Outputs in order.
    pub outputs: Vec<TxOutputJson>,
    /// Lock time.
    pub lock_time: u64,
}

/// JSON representation of a transaction input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInputJson {
    /// Previous transaction ID as hex.
    pub txid: String,
    /// Previous output index.
    pub vout: u32,
    /// Unlocking script as hex.
    pub signature_script: String,
}

/// JSON representation of a transaction output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutputJson {
    /// Output value in strands.
    pub value: u64,
    /// Locking script as hex.
    pub pk_script: String,
}

/// Input reference for `createrawtransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutPointJson {
    /// Previous transaction ID as hex.
    pub txid: String,
    /// Previous output index.
    pub vout: u32,
}

/// Previous-output script hint for `signrawtransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrevScriptJson {
    /// Transaction ID of the output being spent, as hex.
    pub txid: String,
    /// Index of the output being spent.
    pub vout: u32,
    /// Locking script of the output being spent, as hex.
    pub pk_script: String,
}

/// Result of `signrawtransaction`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignResultJson {
    /// The (possibly partially) signed transaction as hex bincode.
    pub hex: String,
    /// Whether every input carries a valid signature.
    pub complete: bool,
    /// Per-input failures for the inputs that remain unsigned.
    pub errors: Vec<SignErrorJson>,
}

/// One input the node wallet could not sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignErrorJson {
    /// Index of the unsigned input.
    pub input_index: usize,
    /// Node-reported reason.
    pub message: String,
}

/// Parse a 64-character hex string into a Hash256.
pub fn parse_hash(hex_str: &str) -> Result<Hash256, RpcError> {
    if hex_str.len() != 64 {
        return Err(RpcError::InvalidResponse(format!(
            "hash must be 64 hex characters, got {}",
            hex_str.len()
        )));
    }
    let bytes = hex::decode(hex_str)
        .map_err(|_| RpcError::InvalidResponse(format!("invalid hex in hash {hex_str}")))?;
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|_| RpcError::InvalidResponse("hash must be 32 bytes".into()))?;
    Ok(Hash256(arr))
}

fn parse_hex_bytes(field: &str, hex_str: &str) -> Result<Vec<u8>, RpcError> {
    hex::decode(hex_str).map_err(|_| RpcError::InvalidResponse(format!("invalid hex in {field}")))
}

/// Serialize a transaction to the hex bincode form the node accepts.
pub fn encode_tx_hex(tx: &Transaction) -> Result<String, RpcError> {
    let bytes = bincode::encode_to_vec(tx, bincode::config::standard())
        .map_err(|e| RpcError::Params(format!("transaction encode failed: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Parse a hex bincode transaction as returned by the node.
pub fn decode_tx_hex(hex_str: &str) -> Result<Transaction, RpcError> {
    let bytes = parse_hex_bytes("transaction", hex_str)?;
    let (tx, _) = bincode::decode_from_slice(&bytes, bincode::config::standard())
        .map_err(|e| RpcError::InvalidResponse(format!("transaction decode failed: {e}")))?;
    Ok(tx)
}

impl DagTipsJson {
    /// Convert into the domain tip summary.
    pub fn into_tips(self) -> Result<DagTips, RpcError> {
        let tips = self
            .tips
            .iter()
            .map(|h| parse_hash(h))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DagTips {
            max_height: self.max_height,
            block_count: self.block_count,
            tips,
        })
    }
}

impl TransactionJson {
    /// Convert into the domain transaction.
    ///
    /// The wire `txid` is advisory; callers recompute IDs from the
    /// canonical bytes.
    pub fn into_transaction(self) -> Result<Transaction, RpcError> {
        let mut inputs = Vec::with_capacity(self.inputs.len());
        for input in self.inputs {
            inputs.push(TxInput {
                previous_output: OutPoint {
                    txid: parse_hash(&input.txid)?,
                    vout: input.vout,
                },
                signature_script: parse_hex_bytes("signature_script", &input.signature_script)?,
            });
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for output in self.outputs {
            outputs.push(TxOutput {
                value: output.value,
                pk_script: parse_hex_bytes("pk_script", &output.pk_script)?,
            });
        }

        Ok(Transaction {
            version: self.version,
            inputs,
            outputs,
            lock_time: self.lock_time,
        })
    }
}

impl BlockJson {
    /// Convert into the domain block.
    pub fn into_block(self) -> Result<Block, RpcError> {
        let parents = self
            .parents
            .iter()
            .map(|h| parse_hash(h))
            .collect::<Result<Vec<_>, _>>()?;
        let header = BlockHeader {
            version: self.version,
            parents,
            merkle_root: parse_hash(&self.merkle_root)?,
            timestamp: self.timestamp,
            nonce: self.nonce,
        };
        let transactions = self
            .transactions
            .into_iter()
            .map(TransactionJson::into_transaction)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Block { header, transactions })
    }
}

impl From<&OutPoint> for OutPointJson {
    fn from(op: &OutPoint) -> Self {
        Self {
            txid: op.txid.to_string(),
            vout: op.vout,
        }
    }
}

impl From<&PrevScript> for PrevScriptJson {
    fn from(prev: &PrevScript) -> Self {
        Self {
            txid: prev.outpoint.txid.to_string(),
            vout: prev.outpoint.vout,
            pk_script: hex::encode(&prev.pk_script),
        }
    }
}
