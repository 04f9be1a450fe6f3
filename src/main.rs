//! Confidential Block Builder
//!
//! A CLI that builds, signs, and submits confidential-compute typed
//! transactions, synchronized to beacon-chain slot timing.
//!
//! # Architecture Overview
//!
//! ```text
//!   beacon node ──SSE──▶ ┌──────────┐        ┌───────────┐
//!                        │ listener │───────▶│           │
//!   relay ──HTTP GET───▶ ┌──────────┐        │orchestrator│──raw tx──▶ RPC
//!                        │ resolver │───────▶│           │◀─receipt──
//!                        └──────────┘        └─────┬─────┘
//!                                                  │
//!                       ┌─────────┐  ┌───────┐     │
//!                       │  codec  │◀─│wallet │◀────┘
//!                       │ 0x42/43 │  │signing│
//!                       └─────────┘  └───────┘
//! ```
//!
//! Per-slot outcomes are single structured log lines; fatal errors exit
//! nonzero before or instead of the loop.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, U256};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use confidential_builder::beacon::BeaconSlotListener;
use confidential_builder::blockchain::{ChainClient, Wallet};
use confidential_builder::builder::{
    BidJob, BidSender, BlockBuildOrchestrator, BuildJob, Bundle,
};
use confidential_builder::codec::TransactionCodec;
use confidential_builder::config::loader::load_config;
use confidential_builder::lifecycle::{spawn_signal_handler, Shutdown};
use confidential_builder::relay::ValidatorDutyResolver;

const WEI_PER_GWEI: u64 = 1_000_000_000;

#[derive(Parser)]
#[command(name = "confidential-builder")]
#[command(about = "Build and submit confidential-compute transactions", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "builder.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build blocks for upcoming slots and submit them
    BuildBlocks {
        /// Number of slots to build blocks for
        #[arg(long, default_value_t = 1)]
        nslots: u64,

        /// Override the block-bid contract address from the config
        #[arg(long)]
        builder: Option<Address>,
    },
    /// Submit a bundle as confidential bids for upcoming blocks
    SendBid {
        /// Raw signed transaction hex (repeatable)
        #[arg(long = "tx", required = true)]
        txs: Vec<Bytes>,

        /// Number of consecutive blocks to bid on
        #[arg(long, default_value_t = 1)]
        blocks: u64,

        /// First target block; defaults to the chain head plus one
        #[arg(long)]
        start_block: Option<u64>,

        /// Override the bid contract address from the config
        #[arg(long)]
        contract: Option<Address>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "confidential_builder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    tracing::info!(
        rpc_url = %config.chain.rpc_url,
        chain_id = config.chain.chain_id,
        "Configuration loaded"
    );

    // Fail fast: wallet, then chain preflight, before any loop starts
    let wallet = Wallet::from_env(config.chain.chain_id)?;
    let client = ChainClient::new(config.chain.clone()).await?;
    let codec = TransactionCodec::new(
        config.chain.chain_id,
        config.job.gas,
        U256::from(config.job.gas_price_gwei) * U256::from(WEI_PER_GWEI),
    );
    let execution_node: Address = config.job.execution_node.parse()?;

    let shutdown = Arc::new(Shutdown::new());
    spawn_signal_handler(shutdown.clone());

    match cli.command {
        Commands::BuildBlocks { nslots, builder } => {
            let builder_contract = contract_address(builder, &config.job.builder_contract)?;
            let listener = BeaconSlotListener::new(config.beacon.url.parse()?, shutdown.clone());
            let resolver = ValidatorDutyResolver::new(
                config.relay.url.parse()?,
                Duration::from_secs(config.relay.request_timeout_secs),
            )?;

            let job = BuildJob {
                n_slots: nslots,
                builder_contract,
                execution_node,
            };
            let orchestrator = BlockBuildOrchestrator::new(
                client, wallet, codec, listener, resolver, job, shutdown,
            );
            orchestrator.run().await?;
        }
        Commands::SendBid {
            txs,
            blocks,
            start_block,
            contract,
        } => {
            let bid_contract = contract_address(contract, &config.job.builder_contract)?;

            let mut allowed_peekers = Vec::with_capacity(config.job.allowed_peekers.len());
            for peeker in &config.job.allowed_peekers {
                allowed_peekers.push(peeker.parse::<Address>()?);
            }
            if allowed_peekers.is_empty() {
                allowed_peekers.push(bid_contract);
            }

            let job = BidJob {
                bid_contract,
                execution_node,
                allowed_peekers,
                start_block,
                n_blocks: blocks,
            };
            let sender = BidSender::new(client, wallet, codec, job);
            sender.run(Bundle::from_raw_txs(txs)).await?;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

fn contract_address(
    override_addr: Option<Address>,
    configured: &str,
) -> Result<Address, Box<dyn std::error::Error>> {
    if let Some(addr) = override_addr {
        return Ok(addr);
    }
    if configured.is_empty() {
        return Err("no contract address: set job.builder_contract or pass it on the command line".into());
    }
    Ok(configured.parse()?)
}
