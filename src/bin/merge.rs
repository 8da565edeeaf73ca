//! Dataset Merge CLI
//!
//! Fills gaps in countries.json from an external country dataset and adds
//! countries that are missing. Existing values are never overwritten.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use countrykit::merge::{fetch_external, parse_external};
use countrykit::{merge_countries, DataDir, KitConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "countrykit-merge")]
#[command(about = "Merge an external country dataset into countries.json")]
struct Cli {
    /// Data directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Remote dataset URL (overrides config)
    #[arg(short, long)]
    source: Option<String>,

    /// Read the external dataset from a local file instead of fetching it
    #[arg(short, long, conflicts_with = "source")]
    input: Option<PathBuf>,

    /// Dry run - report counts without writing countries.json
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = KitConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    let data = DataDir::new(cli.data_dir.unwrap_or_else(|| cfg.data_dir()));

    let existing = data.load_countries()?;
    println!("📂 Existing countries: {}", existing.len());

    let (incoming, skipped) = match &cli.input {
        Some(path) => {
            println!("📂 Reading external dataset from {:?}", path);
            let body = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {:?}", path))?;
            parse_external(&body)?
        }
        None => {
            let url = cli.source.as_deref().unwrap_or(&cfg.merge.source_url);
            println!("🌐 Fetching {}", url);
            fetch_external(url)?
        }
    };
    println!("   Received {} countries", incoming.len());

    let (merged, mut summary) = merge_countries(existing, incoming);
    summary.skipped = skipped;

    println!();
    println!("✅ Total countries: {}", summary.total);
    println!("✅ Added {} new countries", summary.added);
    println!("✅ Updated {} countries with missing data", summary.updated);
    if summary.skipped > 0 {
        println!("⚠️  Skipped {} unreadable external records", summary.skipped);
    }

    if cli.dry_run {
        println!();
        println!("💡 Dry run - countries.json not written");
        return Ok(());
    }

    data.save_countries(&merged, cfg.generate.output_format)?;

    println!();
    println!("Run these commands next:");
    println!("  countrykit-generate");
    println!("  countrykit-flags");
    println!("  countrykit-validate");

    Ok(())
}
