//! Flag Download CLI
//!
//! Downloads a flag SVG for every country that does not have one cached yet.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use countrykit::flags::{FlagOutcome, FlagSummary};
use countrykit::{DataDir, FlagFetcher, KitConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "countrykit-flags")]
#[command(about = "Download country flags as SVG")]
struct Cli {
    /// Data directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Flag cache directory (overrides config)
    #[arg(short, long)]
    flags_dir: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Concurrent downloads per batch (overrides config)
    #[arg(short, long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = KitConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(batch_size) = cli.batch_size {
        cfg.flags.batch_size = batch_size;
    }

    let data = DataDir::new(cli.data_dir.unwrap_or_else(|| cfg.data_dir()));
    let flags_dir = cli.flags_dir.unwrap_or_else(|| cfg.flags_dir());
    let countries = data.load_countries()?;

    println!("=== Downloading Country Flags ===");
    println!("Downloading flags for {} countries into {:?}", countries.len(), flags_dir);
    println!();

    let fetcher = FlagFetcher::new(&cfg.flags, &flags_dir)?;
    let results = fetcher.fetch_all(&countries).await;

    for result in &results {
        match &result.outcome {
            FlagOutcome::Downloaded => println!("✓ {} ({})", result.name, result.cca2),
            FlagOutcome::Skipped => println!("⏭  {} ({}) - already exists", result.name, result.cca2),
            FlagOutcome::Failed(reason) => println!("✗ {} ({}) - {}", result.name, result.cca2, reason),
        }
    }

    let summary = FlagSummary::from_results(&results);
    println!();
    println!("=== Summary ===");
    println!("Downloaded: {}", summary.downloaded);
    println!("Skipped (already exists): {}", summary.skipped);
    println!("Errors: {}", summary.failed);
    println!("Total: {}", summary.total);

    if summary.downloaded > 0 || summary.skipped > 0 {
        println!();
        println!("✓ Flag download complete!");
    }

    Ok(())
}
