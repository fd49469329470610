//! Studio Insights: franchise revenue, marketing ROI and campaign attribution
//! from POS and ad-platform CSV exports.
//!
//! Loads the uploaded files, runs the reporting pipeline once and prints the
//! resulting snapshot as JSON on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use studio_core::config::AppConfig;
use studio_ingest::{load_marketing, load_transactions, InputFile};
use studio_reporting::{ProductFilter, PromotionSelection, ReportingEngine, RunOutcome};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "studio-insights")]
#[command(about = "Revenue, marketing ROI and campaign attribution for studio franchisees")]
#[command(version)]
struct Cli {
    /// Transaction (POS) CSV exports
    #[arg(long, required = true, num_args = 1..)]
    transactions: Vec<PathBuf>,

    /// Marketing spend CSV exports
    #[arg(long, num_args = 1..)]
    marketing: Vec<PathBuf>,

    /// Campaign window to analyze in detail, by index
    #[arg(long)]
    campaign: Option<usize>,

    /// Restrict the detailed campaign analysis to one item
    #[arg(long)]
    product: Option<String>,

    /// Config file (defaults to ./studio-insights.toml when present)
    #[arg(long, env = "STUDIO_INSIGHTS_CONFIG")]
    config: Option<PathBuf>,

    /// Days between a campaign start and its comparison window (overrides config)
    #[arg(long, env = "STUDIO_INSIGHTS__REPORTING__COMPARISON_OFFSET_DAYS")]
    comparison_offset_days: Option<i64>,

    /// Monthly revenue target (overrides config)
    #[arg(long, env = "STUDIO_INSIGHTS__REPORTING__MONTHLY_REVENUE_TARGET")]
    monthly_target: Option<f64>,

    /// Pretty-print the JSON output
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studio_insights=info,studio_ingest=info,studio_reporting=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    // Apply CLI overrides
    if let Some(days) = cli.comparison_offset_days {
        config.reporting.comparison_offset_days = days;
    }
    if let Some(target) = cli.monthly_target {
        config.reporting.monthly_revenue_target = target;
    }

    info!(
        transaction_files = cli.transactions.len(),
        marketing_files = cli.marketing.len(),
        comparison_offset_days = config.reporting.comparison_offset_days,
        "Studio Insights starting"
    );

    let tx_files: Vec<InputFile> = cli.transactions.iter().map(InputFile::from_path).collect();
    let mkt_files: Vec<InputFile> = cli.marketing.iter().map(InputFile::from_path).collect();

    let (transactions, mut files) = load_transactions(&tx_files);
    let (marketing, marketing_files) = load_marketing(&mkt_files);
    files.extend(marketing_files);

    let selection = PromotionSelection {
        campaign_index: cli.campaign,
        product: cli.product.map(ProductFilter::Item).unwrap_or_default(),
    };

    let engine = ReportingEngine::new(&config);
    let outcome = engine.run(&transactions, &marketing, files, &selection);
    if let RunOutcome::NoData { files } = &outcome {
        warn!(files = files.len(), "No transaction data could be loaded");
    }

    let json = if cli.pretty {
        serde_json::to_string_pretty(&outcome)
    } else {
        serde_json::to_string(&outcome)
    }
    .context("Failed to serialize metrics snapshot")?;
    println!("{json}");

    Ok(())
}
