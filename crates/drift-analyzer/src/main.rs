//! Drift Analyzer
//!
//! Parses the latest backtest report and studies how beta drift during a
//! trade relates to its outcome.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use drift_analyzer::{
    analyze, find_latest_report, output_file_name, parse_report, render_console_summary,
    render_markdown, write_report,
};
use pairscope_core::config::Config;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Correlate beta drift with backtest trade outcomes")]
struct Args {
    /// Directory holding backtest reports (overrides config)
    #[arg(long)]
    reports_dir: Option<PathBuf>,

    /// Analyze this report instead of the latest one
    #[arg(long)]
    report: Option<PathBuf>,

    /// Where to write the analysis (defaults to the report's directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Configuration file (defaults to ./pairscope.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the analysis as JSON instead of the text summary
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drift_analyzer=info,pairscope_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let report_path = match args.report {
        Some(path) => path,
        None => {
            let dir = args
                .reports_dir
                .unwrap_or_else(|| PathBuf::from(&config.drift.reports_dir));
            find_latest_report(&dir, &config.drift.report_prefix, &config.drift.report_suffix)?
        }
    };
    info!(report = %report_path.display(), "Analyzing backtest report");

    let trades = parse_report(&report_path)?;
    if trades.is_empty() {
        anyhow::bail!("no trades found in {}", report_path.display());
    }

    let analysis = analyze(&trades);
    if analysis.trades_with_drift == 0 {
        warn!("No trades carry beta information; buckets will be empty");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        println!("{}", render_console_summary(&analysis));
    }

    let now = Utc::now();
    let source_name = report_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    let markdown = render_markdown(&analysis, source_name, now);

    let output_dir = args.output_dir.unwrap_or_else(|| {
        report_path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let written = write_report(&output_dir, &output_file_name(now), &markdown)
        .with_context(|| format!("writing report to {}", output_dir.display()))?;

    println!("Report written to {}", written.display());
    Ok(())
}
