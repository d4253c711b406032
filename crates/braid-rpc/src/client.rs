//! HTTP JSON-RPC client for a braid node.
//!
//! [`NodeClient`] is the production implementation of the node-backed
//! capabilities: [`LedgerQuery`], [`TxSigner`], [`Broadcaster`], and
//! [`TxAssembler`]. Each trait method maps onto one node RPC method and
//! folds transport, node, and decode failures into the capability's own
//! error kind.

use std::collections::BTreeMap;
use std::time::Duration;

use jsonrpsee::core::client::{ClientT, Error as ClientError};
use jsonrpsee::core::params::ArrayParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

use braid_core::address::Address;
use braid_core::amount;
use braid_core::error::{AssembleError, BroadcastError, LedgerError, SignError};
use braid_core::traits::{Broadcaster, LedgerQuery, TxAssembler, TxSigner};
use braid_core::types::{Block, DagTips, Hash256, OutPoint, PrevScript, SignedTx, Transaction};

use crate::error::RpcError;
use crate::json::{self, BlockJson, DagTipsJson, OutPointJson, PrevScriptJson, SignResultJson};

/// Per-request timeout for node calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC client for a braid node.
#[derive(Clone, Debug)]
pub struct NodeClient {
    http: HttpClient,
    url: String,
}

impl NodeClient {
    /// Build a client for the node RPC endpoint at `url`.
    ///
    /// Fails only on a malformed URL; the first network contact happens
    /// on the first call.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        let http = HttpClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(url)
            .map_err(|e| RpcError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }

    /// Endpoint this client talks to.
    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: ArrayParams,
    ) -> Result<R, RpcError> {
        tracing::trace!(method, url = %self.url, "node rpc call");
        self.http.request(method, params).await.map_err(|e| match e {
            ClientError::Call(obj) => RpcError::Node {
                code: obj.code(),
                message: obj.message().to_string(),
            },
            other => RpcError::Transport(other.to_string()),
        })
    }

    /// Addresses held by the node wallet, via `listaddresses`.
    pub async fn list_addresses(&self) -> Result<Vec<Address>, RpcError> {
        let raw: Vec<String> = self.call("listaddresses", ArrayParams::new()).await?;
        raw.iter()
            .map(|s| {
                Address::decode(s)
                    .map_err(|e| RpcError::InvalidResponse(format!("bad address {s}: {e}")))
            })
            .collect()
    }
}

fn insert_param<P: Serialize>(params: &mut ArrayParams, value: P) -> Result<(), RpcError> {
    params
        .insert(value)
        .map_err(|e| RpcError::Params(e.to_string()))
}

fn ledger_error(e: RpcError) -> LedgerError {
    match e {
        RpcError::InvalidResponse(m) => LedgerError::InvalidResponse(m),
        other => LedgerError::Unavailable(other.to_string()),
    }
}

fn broadcast_error(e: RpcError) -> BroadcastError {
    match e {
        // A JSON-RPC error object from sendrawtransaction means the node
        // looked at the transaction and said no.
        RpcError::Node { message, .. } => BroadcastError::Rejected(message),
        other => BroadcastError::Transport(other.to_string()),
    }
}

#[async_trait::async_trait]
impl LedgerQuery for NodeClient {
    async fn tips(&self) -> Result<DagTips, LedgerError> {
        let tips: DagTipsJson = self
            .call("gettips", ArrayParams::new())
            .await
            .map_err(ledger_error)?;
        tips.into_tips().map_err(ledger_error)
    }

    async fn block_hashes_at(&self, height: u64) -> Result<Vec<Hash256>, LedgerError> {
        let mut params = ArrayParams::new();
        insert_param(&mut params, height).map_err(ledger_error)?;
        let hashes: Vec<String> = self
            .call("getblockhashesbyheight", params)
            .await
            .map_err(ledger_error)?;
        hashes
            .iter()
            .map(|h| json::parse_hash(h).map_err(ledger_error))
            .collect()
    }

    async fn block(&self, hash: &Hash256) -> Result<Block, LedgerError> {
        let mut params = ArrayParams::new();
        insert_param(&mut params, hash.to_string()).map_err(ledger_error)?;
        let block: BlockJson = self.call("getblock", params).await.map_err(ledger_error)?;
        block.into_block().map_err(ledger_error)
    }
}

#[async_trait::async_trait]
impl TxSigner for NodeClient {
    async fn unlock(&self, passphrase: &str, timeout_secs: u64) -> Result<(), SignError> {
        let mut params = ArrayParams::new();
        insert_param(&mut params, passphrase).map_err(|e| SignError::Unlock(e.to_string()))?;
        insert_param(&mut params, timeout_secs).map_err(|e| SignError::Unlock(e.to_string()))?;
        let _ack: serde_json::Value = self
            .call("walletpassphrase", params)
            .await
            .map_err(|e| SignError::Unlock(e.to_string()))?;
        Ok(())
    }

    async fn sign(
        &self,
        tx: &Transaction,
        prev_scripts: &[PrevScript],
    ) -> Result<SignedTx, SignError> {
        let hex_tx = json::encode_tx_hex(tx).map_err(|e| SignError::Failed(e.to_string()))?;
        let prev: Vec<PrevScriptJson> = prev_scripts.iter().map(PrevScriptJson::from).collect();

        let mut params = ArrayParams::new();
        insert_param(&mut params, hex_tx).map_err(|e| SignError::Failed(e.to_string()))?;
        insert_param(&mut params, prev).map_err(|e| SignError::Failed(e.to_string()))?;

        let result: SignResultJson = self
            .call("signrawtransaction", params)
            .await
            .map_err(|e| SignError::Failed(e.to_string()))?;
        tracing::debug!(
            complete = result.complete,
            unsigned = result.errors.len(),
            "signrawtransaction returned"
        );
        for err in &result.errors {
            tracing::debug!(input = err.input_index, message = %err.message, "input not signed");
        }

        let signed = json::decode_tx_hex(&result.hex).map_err(|e| SignError::Failed(e.to_string()))?;
        Ok(SignedTx {
            tx: signed,
            unsigned_inputs: result.errors.iter().map(|e| e.input_index).collect(),
        })
    }
}

#[async_trait::async_trait]
impl Broadcaster for NodeClient {
    async fn broadcast(&self, tx: &Transaction) -> Result<Hash256, BroadcastError> {
        let hex_tx = json::encode_tx_hex(tx).map_err(|e| BroadcastError::Transport(e.to_string()))?;
        let mut params = ArrayParams::new();
        insert_param(&mut params, hex_tx).map_err(|e| BroadcastError::Transport(e.to_string()))?;

        let txid: String = self
            .call("sendrawtransaction", params)
            .await
            .map_err(broadcast_error)?;
        json::parse_hash(&txid).map_err(|e| BroadcastError::Transport(e.to_string()))
    }
}

#[async_trait::async_trait]
impl TxAssembler for NodeClient {
    async fn assemble(
        &self,
        inputs: &[OutPoint],
        payouts: &BTreeMap<String, u64>,
    ) -> Result<Transaction, AssembleError> {
        let ins: Vec<OutPointJson> = inputs.iter().map(OutPointJson::from).collect();
        // createrawtransaction expects decimal BRAID on the wire.
        let amounts: BTreeMap<&str, f64> = payouts
            .iter()
            .map(|(address, &strands)| (address.as_str(), amount::to_braid(strands)))
            .collect();

        let mut params = ArrayParams::new();
        insert_param(&mut params, ins).map_err(|e| AssembleError::Failed(e.to_string()))?;
        insert_param(&mut params, amounts).map_err(|e| AssembleError::Failed(e.to_string()))?;

        let hex_tx: String = self
            .call("createrawtransaction", params)
            .await
            .map_err(|e| AssembleError::Failed(e.to_string()))?;
        json::decode_tx_hex(&hex_tx).map_err(|e| AssembleError::InvalidResponse(e.to_string()))
    }
}
