//! braid-cli: command-line wallet tools for the Braid block-DAG.
//!
//! Queries balances and unspent outputs for watched addresses against a
//! braid node, and builds, signs, and submits spend transactions through
//! the node's wallet RPC surface. The node holds all keys; this tool
//! never touches key material beyond forwarding the wallet passphrase.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use braid_core::address::{Address, Network};
use braid_core::amount;
use braid_core::constants::COIN;
use braid_core::params::Params;
use braid_core::script::StandardDecoder;
use braid_core::traits::LedgerQuery;
use braid_core::types::Hash256;
use braid_rpc::NodeClient;
use braid_wallet::{
    all_transactions, compute_balance, match_outputs, select_and_build, spendable_subset, submit,
    wait_for_inclusion, MaturityPolicy, MaturityReference, WaitOptions, WaitOutcome,
};

/// Braid command-line wallet tools.
#[derive(Parser)]
#[command(name = "braid-cli")]
#[command(version, about = "Wallet tools for the Braid block-DAG.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the balance of an address.
    Balance(BalanceArgs),
    /// List the outputs paying an address.
    Utxos(UtxosArgs),
    /// Send coin from one address to another.
    Send(SendArgs),
    /// List the node wallet's addresses.
    Addresses(AddressesArgs),
}

/// Connection and maturity flags shared by every subcommand.
#[derive(Args)]
struct NodeArgs {
    /// Node RPC endpoint URL.
    #[arg(long, default_value = "http://127.0.0.1:8432")]
    rpc_url: String,

    /// Network (mainnet, testnet, or simnet).
    #[arg(long, default_value = "mainnet")]
    network: String,

    /// Override the network's coinbase maturity window.
    #[arg(long)]
    maturity_window: Option<u64>,

    /// Maturity anchor for transfers: 'first' or 'newest' input.
    #[arg(long, default_value = "first")]
    maturity_ref: String,
}

#[derive(Args)]
struct BalanceArgs {
    #[command(flatten)]
    node: NodeArgs,

    /// Address to report the balance of.
    #[arg(long)]
    address: String,

    /// Emit a machine-readable JSON envelope instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct UtxosArgs {
    #[command(flatten)]
    node: NodeArgs,

    /// Address to list outputs for.
    #[arg(long)]
    address: String,
}

#[derive(Args)]
struct SendArgs {
    #[command(flatten)]
    node: NodeArgs,

    /// Source address of the funds.
    #[arg(long)]
    from: String,

    /// Destination address.
    #[arg(long)]
    to: String,

    /// Amount to send in BRAID (e.g. 10.5).
    #[arg(long)]
    amount: f64,

    /// Fee in BRAID.
    #[arg(long, default_value_t = 0.0)]
    fee: f64,

    /// Node wallet passphrase; prompted securely when omitted.
    #[arg(long)]
    passphrase: Option<String>,

    /// Poll this many seconds for the transaction to appear in a block.
    #[arg(long)]
    wait_secs: Option<u64>,
}

#[derive(Args)]
struct AddressesArgs {
    #[command(flatten)]
    node: NodeArgs,
}

/// Machine-readable envelope for `balance --json`.
///
/// Errors are reported inside the envelope with both balances set to -1;
/// the process still exits non-zero.
#[derive(Serialize)]
struct BalanceEnvelope {
    /// Total balance in BRAID, or -1 on error.
    balance: f64,
    /// Spendable balance in BRAID, or -1 on error.
    spendable_balance: f64,
    had_error: bool,
    error_msg: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Balance(args) => balance(args).await,
        Commands::Utxos(args) => utxos(args).await,
        Commands::Send(args) => send(args).await,
        Commands::Addresses(args) => addresses(args).await,
    }
}

/// Resolved connection: client plus the network and maturity settings.
struct Session {
    client: NodeClient,
    params: Params,
    policy: MaturityPolicy,
}

fn open_session(node: &NodeArgs) -> Result<Session> {
    let network = parse_network(&node.network)?;
    let mut params = Params::for_network(network);
    if let Some(window) = node.maturity_window {
        params = params.with_maturity(window);
    }
    let policy = MaturityPolicy::from_params(&params)
        .with_reference(parse_maturity_reference(&node.maturity_ref)?);

    tracing::debug!(url = %node.rpc_url, network = %node.network, "connecting to node");
    let client = NodeClient::new(&node.rpc_url)
        .with_context(|| format!("failed to create RPC client for {}", node.rpc_url))?;

    Ok(Session {
        client,
        params,
        policy,
    })
}

/// Query and report the balance of one address.
async fn balance(args: BalanceArgs) -> Result<()> {
    match balance_of(&args).await {
        Ok((total, spendable)) => {
            if args.json {
                let envelope = BalanceEnvelope {
                    balance: total,
                    spendable_balance: spendable,
                    had_error: false,
                    error_msg: String::new(),
                };
                println!("{}", serde_json::to_string_pretty(&envelope)?);
            } else {
                println!("balance of {}: {:.8} BRAID", args.address, total);
                println!("spendable balance of {}: {:.8} BRAID", args.address, spendable);
            }
            Ok(())
        }
        Err(e) => {
            if args.json {
                let envelope = BalanceEnvelope {
                    balance: -1.0,
                    spendable_balance: -1.0,
                    had_error: true,
                    error_msg: format!("{e:#}"),
                };
                println!("{}", serde_json::to_string_pretty(&envelope)?);
                std::process::exit(1);
            }
            Err(e)
        }
    }
}

async fn balance_of(args: &BalanceArgs) -> Result<(f64, f64)> {
    let session = open_session(&args.node)?;
    let address = decode_address(&args.address, session.params.network)?;

    let records = all_transactions(&session.client)
        .await
        .context("failed to scan the ledger")?;
    let report = compute_balance(
        &records,
        std::slice::from_ref(&address),
        &session.policy,
        &StandardDecoder,
        &session.params,
    )
    .with_context(|| format!("failed to compute balance of {}", args.address))?;

    Ok((
        report.total as f64 / COIN as f64,
        report.spendable as f64 / COIN as f64,
    ))
}

/// List every output paying an address, with its maturity status.
async fn utxos(args: UtxosArgs) -> Result<()> {
    let session = open_session(&args.node)?;
    let address = decode_address(&args.address, session.params.network)?;

    let records = all_transactions(&session.client)
        .await
        .context("failed to scan the ledger")?;
    let matches = match_outputs(
        &records,
        std::slice::from_ref(&address),
        &StandardDecoder,
        &session.params,
    )
    .context("failed to match outputs")?;
    let tips = session
        .client
        .tips()
        .await
        .context("failed to fetch DAG tips")?;

    if matches.is_empty() {
        println!("no outputs found for {}", args.address);
        return Ok(());
    }

    let mut total = 0u64;
    let mut spendable_total = 0u64;
    for m in &matches {
        let spendable = session.policy.is_spendable(tips.max_height, m.record.height);
        total = total.saturating_add(m.amount);
        if spendable {
            spendable_total = spendable_total.saturating_add(m.amount);
        }
        println!(
            "block {}\theight {}\ttx {}\toutput {}\tvalue {:.8} BRAID\t{}",
            m.record.block_hash,
            m.record.height,
            m.record.txid,
            m.vout,
            amount::to_braid(m.amount),
            if spendable { "spendable" } else { "immature" },
        );
    }

    println!();
    println!(
        "{} outputs, {:.8} BRAID total, {:.8} BRAID spendable",
        matches.len(),
        amount::to_braid(total),
        amount::to_braid(spendable_total),
    );
    Ok(())
}

/// Scan, select, sign via the node wallet, and broadcast a send.
async fn send(args: SendArgs) -> Result<()> {
    let session = open_session(&args.node)?;
    let source = decode_address(&args.from, session.params.network)?;
    let destination = decode_address(&args.to, session.params.network)?;

    let amount_strands = amount::from_braid(args.amount).context("invalid amount")?;
    let fee_strands = amount::from_braid(args.fee).context("invalid fee")?;
    if amount_strands == 0 {
        bail!("amount must be greater than zero");
    }
    if fee_strands == 0 {
        eprintln!("WARNING: fee is zero; the network may not accept the transaction");
    }

    let records = all_transactions(&session.client)
        .await
        .context("failed to scan the ledger")?;
    let matches = match_outputs(
        &records,
        std::slice::from_ref(&source),
        &StandardDecoder,
        &session.params,
    )
    .context("failed to match outputs")?;
    let tips = session
        .client
        .tips()
        .await
        .context("failed to fetch DAG tips")?;
    let spendable = spendable_subset(matches, tips.max_height, &session.policy);

    if spendable.is_empty() {
        bail!("no spendable outputs found for {}", args.from);
    }

    let available: u64 = spendable.iter().map(|m| m.amount).sum();
    println!(
        "{} spendable outputs for {}, {:.8} BRAID total",
        spendable.len(),
        args.from,
        amount::to_braid(available),
    );

    // Selection failures (insufficient funds included) surface here,
    // before the node is asked to assemble or sign anything.
    let plan = select_and_build(&spendable, &destination, amount_strands, fee_strands)
        .context("coin selection failed")?;

    let passphrase = match args.passphrase {
        Some(p) => p,
        None => rpassword::prompt_password("Node wallet passphrase: ")
            .context("failed to read passphrase")?,
    };

    println!(
        "sending {:.8} BRAID to {} ({} inputs, {:.8} BRAID fee)",
        args.amount,
        args.to,
        plan.inputs.len(),
        amount::to_braid(plan.fee),
    );

    let receipt = submit(
        &plan,
        &session.client,
        &session.client,
        &session.client,
        &passphrase,
    )
    .await
    .context("failed to submit transaction")?;

    println!("sent transaction {}", receipt.txid);
    if !receipt.unsigned_inputs.is_empty() {
        eprintln!(
            "WARNING: {} input(s) left unsigned: {:?}",
            receipt.unsigned_inputs.len(),
            receipt.unsigned_inputs,
        );
    }

    if let Some(wait_secs) = args.wait_secs {
        wait_report(&session.client, &receipt.txid, tips.max_height, wait_secs).await;
    }

    Ok(())
}

/// Poll for inclusion and report the outcome, until done or Ctrl-C.
async fn wait_report(client: &NodeClient, txid: &Hash256, from_height: u64, wait_secs: u64) {
    let options = WaitOptions {
        timeout: Duration::from_secs(wait_secs),
        ..WaitOptions::default()
    };
    println!("waiting up to {wait_secs}s for inclusion...");

    tokio::select! {
        outcome = wait_for_inclusion(client, txid, from_height, &options) => match outcome {
            WaitOutcome::Included { block_hash, height } => {
                println!("confirmed in block {block_hash} at height {height}");
            }
            WaitOutcome::NotFound => {
                println!("not yet confirmed (not seen in any block up to the current tip)");
            }
            WaitOutcome::TimedOut => {
                println!("not yet confirmed (node could not be polled)");
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("wait interrupted; transaction {txid} was already broadcast");
        }
    }
}

/// List the node wallet's addresses.
async fn addresses(args: AddressesArgs) -> Result<()> {
    let session = open_session(&args.node)?;
    let addresses = session
        .client
        .list_addresses()
        .await
        .context("failed to list node wallet addresses")?;

    if addresses.is_empty() {
        println!("node wallet has no addresses");
        return Ok(());
    }
    for address in addresses {
        println!("{}", address.encode());
    }
    Ok(())
}

/// Decode an address and check it belongs to the selected network.
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

/// Parse network string to Network enum.
fn parse_network(s: &str) -> Result<Network> {
    match s.to_lowercase().as_str() {
        "mainnet" => Ok(Network::Mainnet),
        "testnet" => Ok(Network::Testnet),
        "simnet" => Ok(Network::Simnet),
        _ => bail!("invalid network (must be 'mainnet', 'testnet', or 'simnet')"),
    }
}

/// Parse maturity reference string.
fn parse_maturity_reference(s: &str) -> Result<MaturityReference> {
    match s.to_lowercase().as_str() {
        "first" => Ok(MaturityReference::FirstInput),
        "newest" => Ok(MaturityReference::NewestInput),
        _ => bail!("invalid maturity reference (must be 'first' or 'newest')"),
    }
}

/// Human-readable network name.
fn network_name(network: Network) -> &'static str {
    match network {
        Network::Mainnet => "mainnet",
        Network::Testnet => "testnet",
        Network::Simnet => "simnet",
    }
}
