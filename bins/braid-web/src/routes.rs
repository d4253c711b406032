use anyhow::{bail, Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use braid_core::address::{Address, Network};
use braid_core::amount;
use braid_core::constants::COIN;
use braid_core::script::StandardDecoder;
use braid_core::traits::LedgerQuery;
use braid_wallet::{
    all_transactions, compute_balance, match_outputs, select_and_build, spendable_subset, submit,
    SelectionPlan, SubmitReceipt,
};

use crate::AppState;

// ── Error helper ─────────────────────────────────────────────────────────────

struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": format!("{:#}", self.0) });
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        ApiError(e.into())
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(web_ui))
        .route("/api/status", get(api_status))
        .route("/api/balance/{address}", get(api_balance))
        .route("/api/wallet", get(api_wallet))
        .route("/api/send", post(api_send))
        .layer(cors)
        .with_state(state)
}

const INDEX_HTML: &str = include_str!("static/index.html");

async fn web_ui() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ── /api/status ───────────────────────────────────────────────────────────────

/// Node reachability and tip summary. Never fails; an unreachable node
/// is reported inside the body so the page can render it.
async fn api_status(State(s): State<AppState>) -> Json<Value> {
    let send_enabled = s.config.wallet_passphrase.is_some();
    match s.node.tips().await {
        Ok(tips) => Json(json!({
            "reachable": true,
            "height": tips.max_height,
            "blocks": tips.block_count,
            "tips": tips.tips.len(),
            "network": network_name(s.params.network),
            "send_enabled": send_enabled,
        })),
        Err(e) => Json(json!({
            "reachable": false,
            "error": e.to_string(),
            "network": network_name(s.params.network),
            "send_enabled": send_enabled,
        })),
    }
}

// ── /api/balance/:address ─────────────────────────────────────────────────────

async fn api_balance(
    State(s): State<AppState>,
    Path(address): Path<String>,
) -> ApiResult<Value> {
    let decoded = decode_address(address.trim(), s.params.network)?;

    let records = all_transactions(&*s.node)
        .await
        .context("failed to scan the ledger")?;
    let report = compute_balance(
        &records,
        std::slice::from_ref(&decoded),
        &s.policy,
        &StandardDecoder,
        &s.params,
    )
    .with_context(|| format!("failed to compute balance of {}", decoded.encode()))?;

    Ok(Json(json!({
        "address": decoded.encode(),
        "balance": report.total as f64 / COIN as f64,
        "spendable_balance": report.spendable as f64 / COIN as f64,
    })))
}

// ── /api/wallet ───────────────────────────────────────────────────────────────

/// Balances for every watched address, for the wallet page and the
/// send form's source picker.
async fn api_wallet(State(s): State<AppState>) -> ApiResult<Value> {
    let watch = resolve_watch_set(&s).await?;
    if watch.is_empty() {
        return Ok(Json(json!({
            "addresses": [],
            "total": 0.0,
            "total_spendable": 0.0,
        })));
    }

    let records = all_transactions(&*s.node)
        .await
        .context("failed to scan the ledger")?;

    let mut entries = Vec::with_capacity(watch.len());
    let mut total: i64 = 0;
    let mut total_spendable: i64 = 0;
    for address in &watch {
        let report = compute_balance(
            &records,
            std::slice::from_ref(address),
            &s.policy,
            &StandardDecoder,
            &s.params,
        )
        .with_context(|| format!("failed to compute balance of {}", address.encode()))?;
        total = total.saturating_add(report.total);
        total_spendable = total_spendable.saturating_add(report.spendable);
        entries.push(json!({
            "address": address.encode(),
            "balance": report.total as f64 / COIN as f64,
            "spendable_balance": report.spendable as f64 / COIN as f64,
        }));
    }

    Ok(Json(json!({
        "addresses": entries,
        "total": total as f64 / COIN as f64,
        "total_spendable": total_spendable as f64 / COIN as f64,
    })))
}

/// Watched addresses from config, or the node wallet's own addresses
/// when none are configured.
async fn resolve_watch_set(s: &AppState) -> Result<Vec<Address>> {
    if !s.config.watch_addresses.is_empty() {
        return s
            .config
            .watch_addresses
            .iter()
            .map(|raw| decode_address(raw, s.params.network))
            .collect();
    }
    s.node
        .list_addresses()
        .await
        .context("failed to list node wallet addresses")
}

// ── /api/send ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SendRequest {
    from: String,
    to: String,
    /// Amount in BRAID.
    amount: f64,
    /// Fee in BRAID.
    #[serde(default)]
    fee: f64,
}

/// Build, sign via the node wallet, and broadcast a spend.
async fn api_send(State(s): State<AppState>, Json(req): Json<SendRequest>) -> ApiResult<Value> {
    let from = req.from.trim().to_string();
    match send_coins(&s, &req).await {
        Ok((plan, receipt)) => {
            info!(txid = %receipt.txid, %from, "web send broadcast");
            Ok(Json(json!({
                "txid": receipt.txid.to_string(),
                "inputs": plan.inputs.len(),
                "fee": amount::to_braid(plan.fee),
                "unsigned_inputs": receipt.unsigned_inputs,
            })))
        }
        Err(e) => {
            warn!(error = %e, %from, "web send failed");
            Err(ApiError(e))
        }
    }
}

/// Run the scan, select, sign, broadcast pipeline for one request.
async fn send_coins(s: &AppState, req: &SendRequest) -> Result<(SelectionPlan, SubmitReceipt)> {
    let passphrase = s
        .config
        .wallet_passphrase
        .clone()
        .context("sending is disabled: no wallet passphrase configured")?;
    let source = decode_address(req.from.trim(), s.params.network)?;
    let destination = decode_address(req.to.trim(), s.params.network)?;

    let amount_strands = amount::from_braid(req.amount).context("invalid amount")?;
    let fee_strands = amount::from_braid(req.fee).context("invalid fee")?;
    if amount_strands == 0 {
        bail!("amount must be greater than zero");
    }
    if fee_strands == 0 {
        warn!("zero-fee send requested; the network may not accept it");
    }

    let records = all_transactions(&*s.node)
        .await
        .context("failed to scan the ledger")?;
    let matches = match_outputs(
        &records,
        std::slice::from_ref(&source),
        &StandardDecoder,
        &s.params,
    )
    .context("failed to match outputs")?;
    let tips = s.node.tips().await.context("failed to fetch DAG tips")?;
    let spendable = spendable_subset(matches, tips.max_height, &s.policy);
    if spendable.is_empty() {
        bail!("no spendable outputs found for {}", req.from.trim());
    }

    let plan = select_and_build(&spendable, &destination, amount_strands, fee_strands)
        .context("coin selection failed")?;

    let receipt = submit(&plan, &*s.node, &*s.node, &*s.node, &passphrase)
        .await
        .context("failed to submit transaction")?;

    Ok((plan, receipt))
}

// ── Utils ────────────────────────────────────────────────────────────────────

/// Decode an address and check it belongs to the configured network.
fn decode_address(s: &str, network: Network) -> Result<Address> {
    let address = Address::decode(s).with_context(|| format!("invalid address {s}"))?;
    if address.network() != network {
        bail!(
            "address {s} is for {}, not {}",
            network_name(address.network()),
            network_name(network),
        );
    }
    Ok(address)
}

fn network_name(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "mainnet",
        Network::Testnet => "testnet",
        Network::Simnet => "simnet",
    }
}
