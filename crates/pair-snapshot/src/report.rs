//! Markdown and console rendering of a snapshot run.

use crate::snapshot::PairSnapshot;
use chrono::{DateTime, Utc};
use pairscope_core::types::{AssetPair, PairStatistics};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn fmt_half_life(half_life: Option<f64>) -> String {
    half_life
        .map(|hl| format!("{:.1}d", hl))
        .unwrap_or_else(|| "-".to_string())
}

/// Which leg to short and which to buy for a z-score.
fn direction(pair: &AssetPair, zscore: f64) -> String {
    if zscore > 0.0 {
        format!("short {} / long {}", pair.asset1, pair.asset2)
    } else if zscore < 0.0 {
        format!("long {} / short {}", pair.asset1, pair.asset2)
    } else {
        "no directional bias".to_string()
    }
}

/// Hedge sizing line for the longest successful timeframe.
pub fn hedge_guidance(snapshot: &PairSnapshot, notional: f64) -> Option<String> {
    let (days, stats) = snapshot.longest_success()?;
    let pair = &snapshot.pair;
    Some(format!(
        "{}d beta {:.4}: for {:.2} {} hold {:.2} {} ({}, z {:+.2})",
        days,
        stats.beta,
        notional,
        pair.asset1,
        stats.beta * notional,
        pair.asset2,
        direction(pair, stats.zscore),
        stats.zscore
    ))
}

/// Render the full snapshot report.
pub fn render_snapshot(
    snapshots: &[PairSnapshot],
    generated_at: DateTime<Utc>,
    notional: f64,
) -> String {
    let mut out = String::new();

    out.push_str("# Pair Trading Snapshot\n\n");
    out.push_str(&format!(
        "- **Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("- **Pairs:** {}\n", snapshots.len()));
    out.push_str(&format!("- **Hedge notional:** {:.2}\n\n", notional));

    for snapshot in snapshots {
        render_pair(&mut out, snapshot, notional);
    }

    out.push_str("## Method\n\n");
    out.push_str("- Beta and correlation come from daily simple returns.\n");
    out.push_str("- Spread is `ln(p1) - beta * ln(p2)`; the z-score uses the last 30 spreads.\n");
    out.push_str(
        "- Cointegration is a heuristic: pseudo-ADF below -2.5, or mean reversion above 50% with |lag-1 autocorrelation| below 0.3.\n",
    );

    out
}

fn render_pair(out: &mut String, snapshot: &PairSnapshot, notional: f64) {
    out.push_str(&format!("## {}\n\n", snapshot.pair));

    out.push_str("| Timeframe | Source | Correlation | Beta | Spread | Mean Spread | Z-Score | Mean Reversion | Half-Life | Cointegrated | Signal |\n");
    out.push_str("|-----------|--------|-------------|------|--------|-------------|---------|----------------|-----------|--------------|--------|\n");

    for tf in &snapshot.timeframes {
        let source = tf.source.as_deref().unwrap_or("-");
        let row = match &tf.outcome {
            Ok(stats) => stats_row(tf.days, source, stats),
            Err(message) => format!(
                "| {}d | {} | Error: {} | - | - | - | - | - | - | - | - |",
                tf.days,
                source,
                message.replace('|', "/")
            ),
        };
        out.push_str(&row);
        out.push('\n');
    }
    out.push('\n');

    match hedge_guidance(snapshot, notional) {
        Some(line) => out.push_str(&format!("**Hedge ratio:** {}\n\n", line)),
        None => out.push_str("_No successful timeframe; no hedge guidance._\n\n"),
    }
}

fn stats_row(days: usize, source: &str, stats: &PairStatistics) -> String {
    format!(
        "| {}d | {} | {:.4} | {:.4} | {:.4} | {:.4} | {:+.2} | {:.1}% | {} | {} | {} |",
        days,
        source,
        stats.correlation,
        stats.beta,
        stats.current_spread,
        stats.mean_spread,
        stats.zscore,
        stats.mean_reversion_rate * 100.0,
        fmt_half_life(stats.half_life),
        yes_no(stats.cointegrated),
        stats.signal.label()
    )
}

/// Plain-text summary for stdout.
pub fn render_console_summary(snapshots: &[PairSnapshot], notional: f64) -> String {
    let mut out = String::new();
    for snapshot in snapshots {
        out.push_str(&format!("{}\n", snapshot.pair));
        for tf in &snapshot.timeframes {
            let line = match &tf.outcome {
                Ok(stats) => format!(
                    "  {:>3}d  corr {:>7.4}  beta {:>7.4}  z {:>+6.2}  coint {:<3}  {}\n",
                    tf.days,
                    stats.correlation,
                    stats.beta,
                    stats.zscore,
                    yes_no(stats.cointegrated),
                    stats.signal.label()
                ),
                Err(message) => format!("  {:>3}d  ERROR {}\n", tf.days, message),
            };
            out.push_str(&line);
        }
        if let Some(line) = hedge_guidance(snapshot, notional) {
            out.push_str(&format!("  hedge: {}\n", line));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TimeframeResult;
    use chrono::TimeZone;
    use pairscope_core::types::SpreadSignal;

    fn stats(beta: f64, zscore: f64) -> PairStatistics {
        PairStatistics {
            correlation: 0.85,
            beta,
            current_spread: 0.12,
            mean_spread: 0.1,
            spread_std: 0.01,
            zscore,
            mean_reversion_rate: 0.55,
            autocorrelation: -0.1,
            pseudo_adf: 0.5,
            cointegrated: true,
            half_life: Some(4.3),
            signal: SpreadSignal::from_zscore(zscore),
            data_points: 30,
        }
    }

    fn snapshot() -> PairSnapshot {
        PairSnapshot {
            pair: AssetPair::new("BTC", "ETH"),
            timeframes: vec![
                TimeframeResult {
                    days: 7,
                    source: Some("binance".to_string()),
                    outcome: Ok(stats(0.9, -0.3)),
                },
                TimeframeResult {
                    days: 30,
                    source: Some("binance+bybit".to_string()),
                    outcome: Ok(stats(1.25, 2.4)),
                },
                TimeframeResult {
                    days: 90,
                    source: None,
                    outcome: Err("Insufficient data for BTC/ETH: needed 90 points, got 60".to_string()),
                },
            ],
        }
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_render_rows_and_errors() {
        let md = render_snapshot(&[snapshot()], generated_at(), 1000.0);

        assert!(md.starts_with("# Pair Trading Snapshot"));
        assert!(md.contains("2026-03-01 12:00:00 UTC"));
        assert!(md.contains("## BTC/ETH"));
        assert!(md.contains(
            "| 30d | binance+bybit | 0.8500 | 1.2500 | 0.1200 | 0.1000 | +2.40 | 55.0% | 4.3d | yes | SHORT spread |"
        ));
        assert!(md.contains("| 7d | binance | 0.8500 | 0.9000 |"));
        assert!(md.contains("| 90d | - | Error: Insufficient data for BTC/ETH"));
    }

    #[test]
    fn test_hedge_uses_longest_successful_timeframe() {
        let line = hedge_guidance(&snapshot(), 1000.0).unwrap();
        assert!(line.starts_with("30d beta 1.2500"), "{}", line);
        assert!(line.contains("hold 1250.00 ETH"));
        assert!(line.contains("short BTC / long ETH"));
    }

    #[test]
    fn test_direction_follows_zscore_sign() {
        let pair = AssetPair::new("SOL", "AVAX");
        assert_eq!(direction(&pair, -1.0), "long SOL / short AVAX");
        assert_eq!(direction(&pair, 0.7), "short SOL / long AVAX");
        assert_eq!(direction(&pair, 0.0), "no directional bias");
    }

    #[test]
    fn test_pair_without_success_has_no_guidance() {
        let mut snap = snapshot();
        snap.timeframes.retain(|tf| tf.outcome.is_err());
        let md = render_snapshot(&[snap], generated_at(), 1000.0);
        assert!(md.contains("_No successful timeframe; no hedge guidance._"));
    }

    #[test]
    fn test_error_message_pipes_are_escaped() {
        let mut snap = snapshot();
        snap.timeframes[2].outcome = Err("bad | row".to_string());
        let md = render_snapshot(&[snap], generated_at(), 1000.0);
        assert!(md.contains("Error: bad / row"));
    }

    #[test]
    fn test_console_summary() {
        let summary = render_console_summary(&[snapshot()], 500.0);
        assert!(summary.starts_with("BTC/ETH\n"));
        assert!(summary.contains("ERROR Insufficient data"));
        assert!(summary.contains("hedge: 30d beta 1.2500: for 500.00 BTC hold 625.00 ETH"));
    }
}
