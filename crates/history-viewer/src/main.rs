//! History Viewer
//!
//! Prints summary statistics and recent trades from the trade history file.

use anyhow::Result;
use clap::Parser;
use history_viewer::{load_history, render_history};
use pairscope_core::config::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Show completed pair trades and their P&L")]
struct Args {
    /// Trade history JSON file (overrides config)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Number of recent trades to list (overrides config)
    #[arg(long)]
    limit: Option<usize>,

    /// Configuration file (defaults to ./pairscope.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "history_viewer=warn,pairscope_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let path = args
        .file
        .unwrap_or_else(|| PathBuf::from(&config.history.file));
    let limit = args.limit.unwrap_or(config.history.recent_limit);

    let history = load_history(&path)?;
    print!("{}", render_history(&history, limit));
    Ok(())
}
