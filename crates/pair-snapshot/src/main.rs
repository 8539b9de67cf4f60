//! Pair Snapshot
//!
//! Computes correlation, hedge ratio, spread z-score and a cointegration
//! heuristic for each configured pair and writes a markdown snapshot.

use anyhow::{Context, Result};
use clap::Parser;
use pair_snapshot::{render_console_summary, render_snapshot, run_snapshot, PriceFetcher};
use pairscope_core::config::Config;
use pairscope_core::types::AssetPair;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Snapshot pair-trading statistics across timeframes")]
struct Args {
    /// Configuration file (defaults to ./pairscope.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (overrides config)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Comma-separated pairs, e.g. BTC/ETH,SOL/AVAX (overrides config)
    #[arg(long, value_delimiter = ',')]
    pairs: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pair_snapshot=info,pairscope_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let snapshot_config = &config.snapshot;

    let pairs: Vec<AssetPair> = if args.pairs.is_empty() {
        snapshot_config.asset_pairs()?
    } else {
        args.pairs
            .iter()
            .map(|p| p.parse())
            .collect::<pairscope_core::Result<_>>()?
    };

    info!(
        pairs = pairs.len(),
        timeframes = ?snapshot_config.timeframes,
        "Starting pair snapshot"
    );

    let fetcher = PriceFetcher::from_config(&snapshot_config.sources)?;
    let snapshots = run_snapshot(
        &fetcher,
        &pairs,
        &snapshot_config.timeframes,
        Duration::from_millis(snapshot_config.pair_delay_ms),
    )
    .await;

    println!("{}", render_console_summary(&snapshots, snapshot_config.notional));

    let markdown = render_snapshot(&snapshots, chrono::Utc::now(), snapshot_config.notional);
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(&snapshot_config.output_path));
    std::fs::write(&output, markdown)
        .with_context(|| format!("writing snapshot to {}", output.display()))?;

    let failures: usize = snapshots.iter().map(|s| s.failures()).sum();
    info!(failures, output = %output.display(), "Snapshot complete");
    println!("Snapshot written to {}", output.display());
    Ok(())
}
