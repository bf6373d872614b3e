//! Command Line Interface for candle replay.
//!
//! Reconstructs OHLCV candles for a token from the swap history of its
//! Raydium pool: discover the pool, find when the token appeared, replay the
//! swaps since then and aggregate them into fixed-width candles.
use anyhow::{Context, Result, anyhow, bail};
use candle_replay_builder::CandleBuilder;
use candle_replay_data::export::export_csv;
use candle_replay_data::snapshot::{ObservationSnapshot, load_snapshot, save_snapshot};
use candle_replay_data::{ObservationSource, SourceConfig, SwapObservationSource};
use candle_replay_domain::{Candle, CandleInterval, Pool, PriceObservation, VolumeRule};
use candle_replay_protocols::raydium::RaydiumApiConfig;
use candle_replay_protocols::{RaydiumApi, RpcConfig, RpcProvider};
use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use prettytable::{Table, row};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Lookback used when the token's first transaction cannot be found.
const FALLBACK_LOOKBACK_SECS: i64 = 7 * 86_400;

/// Rows shown in the terminal preview.
const PREVIEW_ROWS: usize = 50;

#[derive(Parser)]
#[command(name = "candle-replay")]
#[command(about = "Rebuild OHLCV candles from Raydium swap history", long_about = None)]
struct Cli {
    /// Log file written alongside stderr; pass an empty value to disable
    #[arg(long, global = true, default_value = "app.log")]
    log_file: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List Raydium pools trading a token and whether they are active
    Pools {
        #[command(flatten)]
        rpc: RpcArgs,

        /// Token mint address
        #[arg(long, env = "TOKEN_MINT")]
        mint: String,

        /// A pool is active if it traded within this many days
        #[arg(long, default_value_t = 1)]
        active_days: u32,
    },
    /// Collect price observations and store them as a JSON snapshot
    Fetch {
        #[command(flatten)]
        rpc: RpcArgs,

        #[command(flatten)]
        collect: CollectArgs,

        /// Snapshot file to write
        #[arg(long)]
        snapshot: PathBuf,
    },
    /// Collect observations and build candles in one go
    Candles {
        #[command(flatten)]
        rpc: RpcArgs,

        #[command(flatten)]
        collect: CollectArgs,

        #[command(flatten)]
        candles: CandleArgs,

        /// Also store the collected observations in this snapshot file
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Build candles offline from a snapshot
    Build {
        #[command(flatten)]
        candles: CandleArgs,

        /// Snapshot file to read
        #[arg(long)]
        snapshot: PathBuf,
    },
}

#[derive(Args)]
struct RpcArgs {
    /// Solana JSON-RPC endpoint
    #[arg(long, env = "SOLANA_RPC_URL")]
    rpc_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

#[derive(Args)]
struct CollectArgs {
    /// Token mint address
    #[arg(long, env = "TOKEN_MINT")]
    mint: String,

    /// Pool address to use instead of the first active one
    #[arg(long)]
    pool: Option<String>,

    /// A pool is active if it traded within this many days
    #[arg(long, default_value_t = 1)]
    active_days: u32,

    /// Upper bound on transactions examined
    #[arg(long, default_value_t = 10_000)]
    max_transactions: usize,

    /// Transactions fetched concurrently
    #[arg(long, default_value_t = 16)]
    concurrency: usize,
}

#[derive(Args)]
struct CandleArgs {
    /// Candle width in seconds
    #[arg(long, default_value_t = 60)]
    interval: u64,

    /// Number of candles to emit, 0 for the full data range
    #[arg(long, default_value_t = 20)]
    candles: usize,

    /// Volume rule: trade-count, price-sum or quote-amount
    #[arg(long, default_value = "trade-count")]
    volume: VolumeRule,

    /// CSV output file
    #[arg(long, default_value = "candles.csv")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    let log_file = Some(cli.log_file.as_str())
        .filter(|p| !p.is_empty())
        .map(Path::new);
    init_logging(log_file)?;

    let outcome = match cli.command {
        Commands::Pools {
            rpc,
            mint,
            active_days,
        } => list_pools(&rpc, &mint, active_days).await,
        Commands::Fetch {
            rpc,
            collect,
            snapshot,
        } => {
            let (pool, start_time, observations) = collect_observations(&rpc, &collect).await?;
            save_snapshot(
                &snapshot,
                &ObservationSnapshot::new(Some(pool), start_time, observations),
            )
            .context("Failed to save snapshot")
        }
        Commands::Candles {
            rpc,
            collect,
            candles,
            snapshot,
        } => {
            let (pool, start_time, observations) = collect_observations(&rpc, &collect).await?;
            if let Some(path) = snapshot {
                save_snapshot(
                    &path,
                    &ObservationSnapshot::new(Some(pool), start_time, observations.clone()),
                )
                .context("Failed to save snapshot")?;
            }
            emit_candles(&observations, &candles)
        }
        Commands::Build { candles, snapshot } => {
            let loaded = load_snapshot(&snapshot)
                .with_context(|| format!("Failed to read snapshot {}", snapshot.display()))?
                .ok_or_else(|| anyhow!("Snapshot {} does not exist", snapshot.display()))?;
            info!(
                observations = loaded.observations.len(),
                collected_at = %loaded.collected_at,
                "Rebuilding from snapshot"
            );
            emit_candles(&loaded.observations, &candles)
        }
    };

    if let Err(e) = &outcome {
        error!(error = %format!("{e:#}"), "Run failed");
    }
    outcome
}

/// Installs the global subscriber: stderr, plus the log file when given.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(std::io::stderr.and(Arc::new(file)))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}

fn rpc_provider(args: &RpcArgs) -> Result<RpcProvider> {
    RpcProvider::new(RpcConfig {
        url: args.rpc_url.clone(),
        timeout_secs: args.timeout_secs,
        ..RpcConfig::default()
    })
    .context("Failed to create RPC client")
}

fn raydium_api(timeout_secs: u64) -> Result<RaydiumApi> {
    RaydiumApi::new(RaydiumApiConfig {
        timeout_secs,
        ..RaydiumApiConfig::default()
    })
    .context("Failed to create Raydium API client")
}

async fn list_pools(args: &RpcArgs, mint: &str, active_days: u32) -> Result<()> {
    let rpc = rpc_provider(args)?;
    let pools = raydium_api(args.timeout_secs)?
        .find_pools(mint)
        .await
        .context("Failed to fetch Raydium pool list")?;
    if pools.is_empty() {
        bail!("No Raydium pool found for {mint}");
    }

    let mut table = Table::new();
    table.set_titles(row!["Pool", "Base", "Quote", "Active"]);
    for pool in &pools {
        let active = match rpc.is_pool_active(&pool.address, active_days).await {
            Ok(true) => "yes".to_string(),
            Ok(false) => "no".to_string(),
            Err(e) => {
                warn!(pool = %pool.address, error = %e, "Activity check failed");
                "unknown".to_string()
            }
        };
        table.add_row(row![pool.address, pool.base_mint, pool.quote_mint, active]);
    }
    table.printstd();
    Ok(())
}

/// Picks the pool to replay: the `--pool` override, or the first active one.
async fn select_pool(
    rpc: &RpcProvider,
    args: &RpcArgs,
    collect: &CollectArgs,
) -> Result<Pool> {
    let pools = raydium_api(args.timeout_secs)?
        .find_pools(&collect.mint)
        .await
        .context("Failed to fetch Raydium pool list")?;

    if let Some(address) = &collect.pool {
        return pools
            .into_iter()
            .find(|pool| pool.address == *address)
            .ok_or_else(|| anyhow!("Pool {address} does not trade {}", collect.mint));
    }

    for pool in pools {
        match rpc.is_pool_active(&pool.address, collect.active_days).await {
            Ok(true) => {
                info!(pool = %pool.address, quote = %pool.quote_mint, "Selected active pool");
                return Ok(pool);
            }
            Ok(false) => info!(pool = %pool.address, "Skipping inactive pool"),
            Err(e) => warn!(pool = %pool.address, error = %e, "Activity check failed"),
        }
    }
    bail!(
        "No Raydium pool for {} traded in the last {} day(s)",
        collect.mint,
        collect.active_days
    )
}

/// Start of the replay window: the token's first transaction, or a week ago.
async fn replay_start(rpc: &RpcProvider, mint: &str) -> i64 {
    let fallback = chrono::Utc::now().timestamp() - FALLBACK_LOOKBACK_SECS;
    match rpc.token_creation_time(mint).await {
        Ok(Some(created)) => {
            info!(mint, created = created, "Token creation time found");
            created
        }
        Ok(None) => {
            warn!(mint, "Token creation time unknown, replaying the last 7 days");
            fallback
        }
        Err(e) => {
            warn!(mint, error = %e, "Token creation lookup failed, replaying the last 7 days");
            fallback
        }
    }
}

async fn collect_observations(
    args: &RpcArgs,
    collect: &CollectArgs,
) -> Result<(Pool, i64, Vec<PriceObservation>)> {
    let rpc = Arc::new(rpc_provider(args)?);
    let pool = select_pool(&rpc, args, collect).await?;
    let start_time = replay_start(&rpc, &collect.mint).await;

    let source = SwapObservationSource::new(
        rpc,
        SourceConfig {
            max_transactions: collect.max_transactions,
            max_concurrency: collect.concurrency,
            ..SourceConfig::default()
        },
    );
    let observations = source.get_observations(&pool, start_time).await;
    if observations.is_empty() {
        bail!("No swaps found for pool {} since {start_time}", pool.address);
    }
    Ok((pool, start_time, observations))
}

fn emit_candles(observations: &[PriceObservation], args: &CandleArgs) -> Result<()> {
    let interval = CandleInterval::from_secs(args.interval).context("Invalid --interval")?;
    let builder = CandleBuilder::new(interval).with_volume_rule(args.volume);
    let builder = if args.candles == 0 {
        builder.unbounded()
    } else {
        builder.bounded(args.candles)
    };

    let candles = builder
        .build(observations)
        .context("Failed to build candles")?;
    if candles.is_empty() {
        bail!("No candles could be built");
    }
    info!(
        candles = candles.len(),
        synthetic = candles.iter().filter(|c| c.is_synthetic()).count(),
        interval = %interval,
        volume = %args.volume,
        "Candles built"
    );

    print_candles(&candles);
    export_csv(&args.output, &candles)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;
    Ok(())
}

fn print_candles(candles: &[Candle]) {
    let mut table = Table::new();
    table.set_titles(row!["Open time", "Open", "High", "Low", "Close", "Volume", "Trades"]);
    for candle in candles.iter().take(PREVIEW_ROWS) {
        table.add_row(row![
            candle.open_time().format("%Y-%m-%d %H:%M:%S"),
            format!("{:.10}", candle.open()),
            format!("{:.10}", candle.high()),
            format!("{:.10}", candle.low()),
            format!("{:.10}", candle.close()),
            format!("{:.4}", candle.volume()),
            candle.trades()
        ]);
    }
    table.printstd();
    if candles.len() > PREVIEW_ROWS {
        println!("... {} more candles", candles.len() - PREVIEW_ROWS);
    }
}
