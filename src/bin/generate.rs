//! Artifact Generation CLI
//!
//! Regenerates every derived artifact from the canonical countries.json.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use countrykit::{DataDir, KitConfig, OutputFormat, WriteOptions};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "countrykit-generate")]
#[command(about = "Generate derived artifacts from countries.json")]
struct Cli {
    /// Data directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Write compact JSON instead of pretty-printed
    #[arg(long)]
    compact: bool,

    /// Skip writing checksums.sha256
    #[arg(long)]
    no_checksums: bool,
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

    let options = WriteOptions {
        format: if cli.compact {
            OutputFormat::Compact
        } else {
            cfg.generate.output_format
        },
        write_checksums: cfg.generate.write_checksums && !cli.no_checksums,
    };

    println!("=== Auto-Generating All Data Files ===");
    println!("  Data: {:?}", data.root());
    println!();

    let summary = data.generate(options)?;

    for file in &summary.files_written {
        println!("  ✅ {}", file);
    }
    println!("  📦 countries.min.json is {:.1}% smaller", summary.minified_saving);

    println!();
    println!("=== Summary ===");
    println!("Countries:  {}", summary.countries);
    println!("Dial Codes: {}", summary.dial_codes);
    println!("Currencies: {}", summary.currencies);
    println!("Languages:  {}", summary.languages);
    println!();
    println!("✅ All files generated successfully!");

    Ok(())
}
