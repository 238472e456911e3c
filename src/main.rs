//! AMM Trade Agent CLI
//!
//! Command-line interface for running the scheduled sell agents.

use amm_trade_agent::chain::{ChainQuery, PaperSubmitter, RpcChainClient};
use amm_trade_agent::market::{AssetId, RateOracle};
use amm_trade_agent::scheduler::shutdown_signal;
use amm_trade_agent::tokens::registry;
use amm_trade_agent::{Config, Result, RpcConfig, Scheduler, SellerCredentials, TradingAgent};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "trade-agent")]
#[command(about = "Scheduled AMM sell agents with daily trade throttling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all configured agents until Ctrl+C or SIGTERM
    Run,

    /// Quote the current pool rate once and exit
    Quote {
        /// Asset id to sell (defaults to the first agent's sell asset)
        #[arg(long)]
        sell: Option<String>,

        /// Asset id to buy (defaults to the first agent's buy asset)
        #[arg(long)]
        buy: Option<String>,

        /// Amount to quote in the sell asset's smallest unit
        #[arg(long)]
        amount: Option<u64>,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Load config
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    let _guard = init_logging(cli.verbose, config.log_dir.as_deref());

    match cli.command {
        Commands::Run => run_agents(config).await?,
        Commands::Quote { sell, buy, amount } => run_quote(&config, sell, buy, amount).await?,
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Console logging, plus a daily-rolling file when `log_dir` is set.
///
/// The returned guard flushes the file writer on drop.
fn init_logging(verbose: bool, log_dir: Option<&str>) -> Option<WorkerGuard> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "trade-agent.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

const RPC_TIMEOUT: Duration = Duration::from_secs(30);

fn chain_client() -> Result<RpcChainClient> {
    let rpc = RpcConfig::from_env()?;
    let http = reqwest::Client::builder().timeout(RPC_TIMEOUT).build()?;
    Ok(RpcChainClient::with_client(&rpc, http))
}

async fn run_agents(config: Config) -> Result<()> {
    let chain = Arc::new(chain_client()?);
    let seller = Arc::new(SellerCredentials::from_env()?);
    let submitter = Arc::new(PaperSubmitter::new());

    tracing::info!(
        rpc_url = %chain.url(),
        seller = seller.address(),
        key_fingerprint = %seller.key_fingerprint(),
        agents = config.agents.len(),
        "Starting trade agents"
    );

    let mut scheduler = Scheduler::new(config.drain_delay());
    for agent_config in config.agents {
        scheduler.register(TradingAgent::new(
            agent_config,
            chain.clone(),
            submitter.clone(),
            seller.clone(),
        ));
    }

    let finished = scheduler.run_until(shutdown_signal()).await;
    tracing::info!(agents = ?finished, "Shutdown complete");

    Ok(())
}

async fn run_quote(
    config: &Config,
    sell: Option<String>,
    buy: Option<String>,
    amount: Option<u64>,
) -> Result<()> {
    let defaults = config.agents.first().ok_or_else(|| {
        amm_trade_agent::Error::InvalidArgument("no agent configured".to_string())
    })?;
    let sell = sell.map(AssetId::from).unwrap_or_else(|| defaults.sell_asset.clone());
    let buy = buy.map(AssetId::from).unwrap_or_else(|| defaults.buy_asset.clone());
    let amount = amount.unwrap_or(defaults.quote_increment);

    if sell == buy {
        return Err(amm_trade_agent::Error::InvalidArgument(
            "sell and buy assets must differ".to_string(),
        ));
    }

    let chain = chain_client()?;
    let height = chain.latest_height().await?;
    let snapshot = chain.pool_state(height).await?;
    let rate = RateOracle::quote(&snapshot, &sell, &buy, amount);

    let tokens = registry();
    let result = serde_json::json!({
        "beacon_height": height,
        "pair": format!("{}/{}", tokens.symbol(&sell), tokens.symbol(&buy)),
        "pool_found": snapshot.pair(&sell, &buy).is_some(),
        "sell": tokens.display_amount(&sell, amount),
        "receive": tokens.display_amount(&buy, rate),
        "rate": rate,
    });

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
