//! Markdown and console rendering of a drift analysis.

use crate::analyzer::{BucketStats, DriftAnalysis};
use chrono::{DateTime, Utc};

fn fmt_opt(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "N/A".to_string(),
    }
}

fn fmt_signed_pct(value: f64) -> String {
    format!("{:+.2}%", value)
}

/// Render the full markdown report.
pub fn render_markdown(
    analysis: &DriftAnalysis,
    source_name: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = String::new();

    out.push_str("# Beta Drift Analysis\n\n");
    out.push_str(&format!("- **Source report:** `{}`\n", source_name));
    out.push_str(&format!(
        "- **Generated:** {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!("- **Trades parsed:** {}\n", analysis.total_trades));
    out.push_str(&format!(
        "- **Trades with beta drift:** {}\n",
        analysis.trades_with_drift
    ));
    out.push_str(&format!(
        "- **Trades with % drift:** {}\n",
        analysis.trades_with_pct_drift
    ));
    if let Some(corr) = analysis.drift_roi_correlation {
        out.push_str(&format!("- **Drift/ROI correlation:** {:.4}\n", corr));
    }
    out.push('\n');

    out.push_str("## Win Rate by Absolute Beta Drift\n\n");
    render_bucket_table(&mut out, &analysis.absolute_buckets, true);

    out.push_str("## Win Rate by Percent Beta Drift\n\n");
    render_bucket_table(&mut out, &analysis.percent_buckets, false);

    out.push_str("## Top 10 Trades by Beta Drift\n\n");
    if analysis.top_drifts.is_empty() {
        out.push_str("_No trades with beta drift._\n\n");
    } else {
        out.push_str("| # | Pair | Entry Time | Beta Entry | Beta Exit | Drift | Drift % | Actual ROI | Predicted ROI | Diverged |\n");
        out.push_str("|---|------|------------|------------|-----------|-------|---------|------------|---------------|----------|\n");
        for (i, t) in analysis.top_drifts.iter().enumerate() {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                i + 1,
                t.pair,
                t.entry_time,
                fmt_opt(t.entry_beta, 4),
                fmt_opt(t.exit_beta, 4),
                fmt_opt(t.beta_drift, 4),
                t.beta_drift_pct
                    .map(|p| format!("{:.1}%", p))
                    .unwrap_or_else(|| "N/A".to_string()),
                t.actual_roi
                    .map(fmt_signed_pct)
                    .unwrap_or_else(|| "N/A".to_string()),
                t.predicted_roi
                    .map(fmt_signed_pct)
                    .unwrap_or_else(|| "N/A".to_string()),
                if t.diverged { "yes" } else { "no" },
            ));
        }
        out.push('\n');
    }

    out.push_str("## Key Findings\n\n");
    for line in key_findings(analysis) {
        out.push_str(&format!("- {}\n", line));
    }

    out
}

fn render_bucket_table(out: &mut String, buckets: &[BucketStats], absolute: bool) {
    if buckets.is_empty() {
        out.push_str("_No trades in any bucket._\n\n");
        return;
    }

    if absolute {
        out.push_str("| Drift | Trades | Win Rate | Avg ROI | Avg Abs Error | Avg Abs(Actual-Pred) | Diverged | Divergence Rate |\n");
        out.push_str("|-------|--------|----------|---------|---------------|----------------------|----------|-----------------|\n");
    } else {
        out.push_str("| Drift | Trades | Win Rate | Avg ROI | Avg Abs Error | Diverged | Divergence Rate |\n");
        out.push_str("|-------|--------|----------|---------|---------------|----------|-----------------|\n");
    }

    for b in buckets {
        let roi_diff = if absolute {
            format!(" {} |", fmt_opt(b.avg_roi_diff, 2))
        } else {
            String::new()
        };
        out.push_str(&format!(
            "| {} | {} | {:.1}% | {} | {:.1}% |{} {} | {:.1}% |\n",
            b.range.label,
            b.count,
            b.win_rate,
            fmt_signed_pct(b.avg_roi),
            b.avg_error,
            roi_diff,
            b.divergence_count,
            b.divergence_rate,
        ));
    }
    out.push('\n');
}

/// Compare the lowest and highest absolute-drift buckets.
pub fn key_findings(analysis: &DriftAnalysis) -> Vec<String> {
    let buckets = &analysis.absolute_buckets;
    let (low, high) = match (buckets.first(), buckets.last()) {
        (Some(low), Some(high)) if buckets.len() >= 2 => (low, high),
        _ => {
            return vec![
                "Insufficient data: need trades in at least two drift buckets to compare."
                    .to_string(),
            ]
        }
    };

    let mut findings = vec![
        format!(
            "Lowest drift ({}): {} trades, {:.1}% win rate, {} avg ROI",
            low.range.label,
            low.count,
            low.win_rate,
            fmt_signed_pct(low.avg_roi)
        ),
        format!(
            "Highest drift ({}): {} trades, {:.1}% win rate, {} avg ROI",
            high.range.label,
            high.count,
            high.win_rate,
            fmt_signed_pct(high.avg_roi)
        ),
    ];

    let worse_win_rate = high.win_rate < low.win_rate;
    let worse_roi = high.avg_roi < low.avg_roi;

    if worse_win_rate || worse_roi {
        let mut metrics = Vec::new();
        if worse_win_rate {
            metrics.push(format!(
                "win rate {:.1} pts lower",
                low.win_rate - high.win_rate
            ));
        }
        if worse_roi {
            metrics.push(format!("avg ROI {:.2} pts lower", low.avg_roi - high.avg_roi));
        }
        findings.push(format!(
            "**Conclusion:** high beta drift underperforms ({}). Consider exiting or re-hedging when beta drifts beyond {:.2}.",
            metrics.join(", "),
            high.range.min
        ));
    } else {
        findings.push(
            "**Conclusion:** no degradation from beta drift is visible in this report."
                .to_string(),
        );
    }

    findings
}

/// Plain-text bucket summary for stdout.
pub fn render_console_summary(analysis: &DriftAnalysis) -> String {
    let bucket_line = |b: &BucketStats| {
        format!(
            "  {:<10} {:>4} trades  win {:>5.1}%  avg ROI {:>7}  diverged {:>5.1}%",
            b.range.label,
            b.count,
            b.win_rate,
            fmt_signed_pct(b.avg_roi),
            b.divergence_rate
        )
    };

    let mut lines = vec![
        format!(
            "Trades: {} parsed, {} with drift, {} with % drift",
            analysis.total_trades, analysis.trades_with_drift, analysis.trades_with_pct_drift
        ),
        String::new(),
        "Absolute beta drift:".to_string(),
    ];
    lines.extend(analysis.absolute_buckets.iter().map(bucket_line));
    lines.push(String::new());
    lines.push("Percent beta drift:".to_string());
    lines.extend(analysis.percent_buckets.iter().map(bucket_line));
    lines.push(String::new());
    lines.extend(key_findings(analysis).iter().map(|l| l.replace("**", "")));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}
