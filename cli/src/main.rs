//! chainbatch CLI — batch validator requests from the terminal.
//!
//! # Commands
//! ```text
//! chainbatch consolidate --target <PUBKEY> --source <PUBKEY>...
//! chainbatch switch      --pubkey <PUBKEY>...
//! chainbatch exit        --request <PUBKEY:AMOUNT[:full]>... | --file <exits.json>
//! chainbatch fee         --kind consolidation|exit
//! chainbatch encode      consolidate|switch|exit ...
//! ```

use alloy_primitives::{Address, Bytes, U256};
use anyhow::{anyhow, bail, Context, Result};
use chainbatch_core::types::FEE_FLOOR_WEI;
use chainbatch_core::{
    fee, BatchEngine, BatchError, BatchKind, BatchReport, CallContext, ConsolidationItem,
    Dispatchable, EndpointKind, ExitItem, FeeModel, MemoryEndpoint, PubKey, RequestEndpoint,
    SwitchItem,
};
use chainbatch_rpc::{HttpRpcClient, RpcEndpoint, RpcEndpointConfig, RpcTransport};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod input;
mod logging;

use config::{FileConfig, Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "chainbatch",
    about = "Batch validator consolidations, credential switches and exits",
    long_about = "
chainbatch: send many EIP-7251 consolidation / EIP-7002 withdrawal requests
in one pass. Invalid items are reported and skipped; the rest are forwarded.

ENVIRONMENT VARIABLES:
  CHAINBATCH_RPC_URL    JSON-RPC endpoint of a node that can sign for the account
  CHAINBATCH_ACCOUNT    Account the requests are sent from
",
    version
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON-RPC URL
    #[arg(long, global = true, env = "CHAINBATCH_RPC_URL")]
    rpc: Option<String>,

    /// Executing account
    #[arg(long, global = true, env = "CHAINBATCH_ACCOUNT")]
    account: Option<String>,

    /// Invoking identity (defaults to the account)
    #[arg(long, global = true)]
    from: Option<String>,

    /// Value to attach, in wei (defaults to the quoted fee times the batch size)
    #[arg(long, global = true)]
    value: Option<String>,

    /// Fee model override
    #[arg(long, global = true, value_enum)]
    fee_model: Option<FeeModelArg>,

    /// Use in-memory endpoints instead of a node
    #[arg(long, global = true)]
    dry_run: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FeeModelArg {
    Metered,
    EqualSplit,
}

impl From<FeeModelArg> for FeeModel {
    fn from(arg: FeeModelArg) -> Self {
        match arg {
            FeeModelArg::Metered => FeeModel::Metered,
            FeeModelArg::EqualSplit => FeeModel::EqualSplit,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum EndpointArg {
    Consolidation,
    Exit,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate source validators into one target
    Consolidate(ConsolidateArgs),

    /// Switch validators to compounding withdrawal credentials
    Switch(SwitchArgs),

    /// Request full or partial exits
    Exit(ExitArgs),

    /// Print the current per-request fee of an endpoint
    Fee {
        #[arg(long, value_enum)]
        kind: EndpointArg,
    },

    /// Validate and print request payloads without sending anything
    Encode {
        #[command(subcommand)]
        batch: BatchCommand,
    },
}

#[derive(Subcommand)]
enum BatchCommand {
    Consolidate(ConsolidateArgs),
    Switch(SwitchArgs),
    Exit(ExitArgs),
}

#[derive(Args)]
struct ConsolidateArgs {
    /// Target validator public key (48 bytes hex)
    #[arg(long)]
    target: String,
    /// Source validator public keys
    #[arg(long = "source", required = true, num_args = 1..)]
    sources: Vec<String>,
}

#[derive(Args)]
struct SwitchArgs {
    /// Validator public keys
    #[arg(long = "pubkey", required = true, num_args = 1..)]
    pubkeys: Vec<String>,
}

#[derive(Args)]
struct ExitArgs {
    /// PUBKEY:AMOUNT[:full], amount in gwei or with an `eth` suffix; 0:full is a full exit
    #[arg(long = "request", num_args = 1..)]
    requests: Vec<String>,
    /// JSON file with [{ "pubkey", "amount_gwei", "full_exit" }]
    #[arg(long)]
    file: Option<PathBuf>,
}

/// A parsed batch, ready for the engine.
enum Batch {
    Consolidation {
        sources: Vec<ConsolidationItem>,
        target: Bytes,
    },
    Switch(Vec<SwitchItem>),
    Exit(Vec<ExitItem>),
}

impl Batch {
    fn kind(&self) -> BatchKind {
        match self {
            Self::Consolidation { .. } => BatchKind::Consolidation,
            Self::Switch(_) => BatchKind::Switch,
            Self::Exit(_) => BatchKind::Exit,
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Consolidation { sources, .. } => sources.len(),
            Self::Switch(items) => items.len(),
            Self::Exit(items) => items.len(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    logging::init_tracing(&file.log, cli.verbose);

    match &cli.command {
        Commands::Consolidate(args) => {
            cmd_run(&cli, &resolve(&cli, file)?, consolidate_batch(args)?).await
        }
        Commands::Switch(args) => cmd_run(&cli, &resolve(&cli, file)?, switch_batch(args)?).await,
        Commands::Exit(args) => cmd_run(&cli, &resolve(&cli, file)?, exit_batch(args)?).await,
        Commands::Fee { kind } => cmd_fee(&cli, &resolve(&cli, file)?, *kind).await,
        Commands::Encode { batch } => {
            let batch = match batch {
                BatchCommand::Consolidate(args) => consolidate_batch(args)?,
                BatchCommand::Switch(args) => switch_batch(args)?,
                BatchCommand::Exit(args) => exit_batch(args)?,
            };
            cmd_encode(&cli, &batch)
        }
    }
}

/// Settings for commands that reach an endpoint. Only these need an account.
fn resolve(cli: &Cli, file: FileConfig) -> Result<Settings> {
    let settings = Settings::resolve(
        file,
        Overrides {
            rpc_url: cli.rpc.clone(),
            account: cli.account.clone(),
            fee_model: cli.fee_model.map(FeeModel::from),
        },
    )?;
    tracing::debug!(
        account = %settings.engine.account,
        fee_model = %settings.engine.fee_model,
        rpc = ?settings.rpc_url,
        dry_run = cli.dry_run,
        "settings resolved"
    );
    Ok(settings)
}

// ─── Input ────────────────────────────────────────────────────────────────────

fn consolidate_batch(args: &ConsolidateArgs) -> Result<Batch> {
    Ok(Batch::Consolidation {
        sources: input::parse_hex_list(&args.sources)?
            .into_iter()
            .map(ConsolidationItem::new)
            .collect(),
        target: input::parse_hex(&args.target)?,
    })
}

fn switch_batch(args: &SwitchArgs) -> Result<Batch> {
    Ok(Batch::Switch(
        input::parse_hex_list(&args.pubkeys)?
            .into_iter()
            .map(SwitchItem::new)
            .collect(),
    ))
}

fn exit_batch(args: &ExitArgs) -> Result<Batch> {
    let mut items = match &args.file {
        Some(path) => input::load_exit_file(path)?,
        None => Vec::new(),
    };
    for raw in &args.requests {
        items.push(input::parse_exit_request(raw)?);
    }
    if items.is_empty() {
        bail!("no exit requests: pass --request or --file");
    }
    Ok(Batch::Exit(items))
}

// ─── Engine wiring ────────────────────────────────────────────────────────────

fn build_engine(cli: &Cli, settings: &Settings) -> Result<BatchEngine> {
    let cfg = &settings.engine;
    let (consolidation, exit): (Arc<dyn RequestEndpoint>, Arc<dyn RequestEndpoint>) =
        if cli.dry_run {
            let fee = U256::from(FEE_FLOOR_WEI);
            (
                Arc::new(MemoryEndpoint::new("consolidation", cfg.consolidation_endpoint, fee)),
                Arc::new(MemoryEndpoint::new("exit", cfg.exit_endpoint, fee)),
            )
        } else {
            let url = settings
                .rpc_url
                .as_deref()
                .ok_or_else(|| anyhow!("no RPC URL: pass --rpc or set CHAINBATCH_RPC_URL"))?;
            let transport: Arc<dyn RpcTransport> =
                Arc::new(HttpRpcClient::new(url, settings.request_timeout)?);
            let endpoint_config = RpcEndpointConfig {
                await_receipt: settings.await_receipts,
                ..RpcEndpointConfig::default()
            };
            (
                Arc::new(RpcEndpoint::new(
                    "consolidation",
                    cfg.consolidation_endpoint,
                    cfg.account,
                    transport.clone(),
                    endpoint_config.clone(),
                )),
                Arc::new(RpcEndpoint::new(
                    "exit",
                    cfg.exit_endpoint,
                    cfg.account,
                    transport,
                    endpoint_config,
                )),
            )
        };
    Ok(BatchEngine::new(cfg, consolidation, exit))
}

/// Attached value given with `--value`, if any.
fn explicit_value(cli: &Cli) -> Result<Option<U256>> {
    cli.value
        .as_deref()
        .map(|raw| {
            raw.parse::<U256>()
                .with_context(|| format!("invalid --value '{raw}'"))
        })
        .transpose()
}

/// What the metered model requires for `batch` at the current quote.
async fn quoted_value(engine: &BatchEngine, fee_model: FeeModel, batch: &Batch) -> Result<U256> {
    match fee_model {
        FeeModel::Metered => {
            let quote = engine.quote(batch.kind().endpoint()).await;
            Ok(fee::required_total(quote, batch.len()))
        }
        FeeModel::EqualSplit => bail!("--value is required with the equal-split fee model"),
    }
}

async fn submit_batch(
    engine: &BatchEngine,
    batch: &Batch,
    ctx: &CallContext,
) -> Result<BatchReport, BatchError> {
    match batch {
        Batch::Consolidation { sources, target } => {
            engine.batch_consolidation(ctx, sources, target).await
        }
        Batch::Switch(items) => engine.batch_switch(ctx, items).await,
        Batch::Exit(items) => engine.batch_exit(ctx, items).await,
    }
}

/// Run `batch`. Without an explicit value the batch pays the quoted total.
/// The guard probes the fee again, so if it rose in between the batch is
/// admitted once more at the guard's own price. A rejected admission
/// dispatches nothing.
async fn run_batch(
    engine: &BatchEngine,
    batch: &Batch,
    invoker: Address,
    value: Option<U256>,
    fee_model: FeeModel,
) -> Result<BatchReport> {
    let derived = value.is_none();
    let value = match value {
        Some(value) => value,
        None => quoted_value(engine, fee_model, batch).await?,
    };

    let result = match submit_batch(engine, batch, &CallContext::new(invoker, value)).await {
        Err(BatchError::InsufficientFee { required, supplied }) if derived => {
            tracing::info!(%supplied, %required, "fee rose after quoting, paying the new total");
            submit_batch(engine, batch, &CallContext::new(invoker, required)).await
        }
        other => other,
    };
    result.with_context(|| format!("{} batch aborted", batch.kind()))
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn cmd_run(cli: &Cli, settings: &Settings, batch: Batch) -> Result<()> {
    let engine = build_engine(cli, settings)?;
    let invoker = match &cli.from {
        Some(raw) => raw
            .parse::<Address>()
            .with_context(|| format!("invalid --from '{raw}'"))?,
        None => settings.engine.account,
    };
    let report = run_batch(
        &engine,
        &batch,
        invoker,
        explicit_value(cli)?,
        settings.engine.fee_model,
    )
    .await?;

    print_report(cli, &report)
}

async fn cmd_fee(cli: &Cli, settings: &Settings, kind: EndpointArg) -> Result<()> {
    let engine = build_engine(cli, settings)?;
    let kind = match kind {
        EndpointArg::Consolidation => EndpointKind::Consolidation,
        EndpointArg::Exit => EndpointKind::Exit,
    };
    let quote = engine.quote(kind).await;
    let address = engine.endpoint(kind).address();

    if cli.json {
        let out = serde_json::json!({
            "endpoint": kind,
            "address": address,
            "fee_wei": quote,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{kind} endpoint {address}: {quote} wei per request");
    }
    Ok(())
}

fn cmd_encode(cli: &Cli, batch: &Batch) -> Result<()> {
    let payloads: Vec<Result<Bytes, String>> = match batch {
        Batch::Consolidation { sources, target } => {
            let target = PubKey::try_from(&target[..])
                .map_err(|_| anyhow!("consolidation target must be 48 bytes, got {}", target.len()))?;
            encode_all(sources, &target)
        }
        Batch::Switch(items) => encode_all(items, &()),
        Batch::Exit(items) => encode_all(items, &()),
    };

    if cli.json {
        let out: Vec<serde_json::Value> = payloads
            .iter()
            .enumerate()
            .map(|(index, p)| match p {
                Ok(payload) => serde_json::json!({ "index": index, "payload": payload }),
                Err(reason) => serde_json::json!({ "index": index, "reason": reason }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (index, p) in payloads.iter().enumerate() {
            match p {
                Ok(payload) => println!("[{index}] 0x{}", hex::encode(payload)),
                Err(reason) => println!("[{index}] invalid: {reason}"),
            }
        }
    }
    Ok(())
}

fn encode_all<T: Dispatchable>(items: &[T], ctx: &T::Context) -> Vec<Result<Bytes, String>> {
    items
        .iter()
        .map(|item| item.payload(ctx).map_err(|reason| reason.to_string()))
        .collect()
}

fn print_report(cli: &Cli, report: &BatchReport) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("{report}");
    for failure in report.failures() {
        println!("  {failure}");
    }
    if !report.unspent().is_zero() {
        println!("  unspent: {} wei (left with the account)", report.unspent());
    }
    Ok(())
}
