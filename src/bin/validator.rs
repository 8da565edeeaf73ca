//! Dataset Validator CLI
//!
//! Validates the canonical list and derived artifacts. Exits non-zero only
//! when validation fails; warnings never block.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use countrykit::{validate, DataDir, KitConfig, Outcome};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "countrykit-validate")]
#[command(about = "Validate countries.json and its derived artifacts")]
struct Cli {
    /// Data directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value = "text")]
    format: Format,

    /// Write the JSON report to a file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also verify checksums.sha256
    #[arg(long)]
    checksums: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the dataset passed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let cfg = KitConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    let data = DataDir::new(cli.data_dir.unwrap_or_else(|| cfg.data_dir()));

    let dataset = data.load_dataset()?;
    let report = validate(&dataset);

    let mut checksums_ok = true;
    if cli.checksums {
        for status in data.verify_checksums()? {
            if !status.is_valid() {
                checksums_ok = false;
                eprintln!("✗ ERROR: {}", status.into_error());
            }
        }
    }

    let json = report.to_json();
    if let Some(path) = &cli.output {
        std::fs::write(path, serde_json::to_string_pretty(&json)?)
            .with_context(|| format!("failed to write report to {:?}", path))?;
    }

    match cli.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&json)?),
        Format::Text => print_text(&report),
    }

    Ok(!report.outcome().is_failure() && checksums_ok)
}

fn print_text(report: &countrykit::ValidationReport) {
    println!("=== Validating CountryKit Data ===");

    for (section, checked) in &report.checked {
        println!();
        println!("--- Validating {} ---", section.title());
        let (errors, warnings) = report.section_findings(*section);
        for finding in errors {
            println!("✗ ERROR: {}", finding.message);
        }
        for finding in warnings {
            println!("⚠ WARNING: {}", finding.message);
        }
        println!("✓ Validated {} {}", checked, section.noun());
    }

    println!();
    println!("=== Validation Summary ===");
    println!("Errors:   {}", report.errors.len());
    println!("Warnings: {}", report.warnings.len());
    println!();

    match report.outcome() {
        Outcome::Fail => println!("✗ Validation failed!"),
        Outcome::PassWithWarnings => println!("⚠ Validation passed with warnings"),
        Outcome::Pass => println!("✓ All validations passed!"),
    }
}
