//! Dataset Lookup CLI
//!
//! Query the generated dataset from the command line.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use countrykit::{Catalog, Country, KitConfig};

#[derive(Parser)]
#[command(name = "countrykit-lookup")]
#[command(about = "Query the generated country dataset")]
struct Cli {
    /// Data directory (overrides config)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Config file to load
    #[arg(short, long)]
    config: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all countries
    List,
    /// Show one country by alpha-2 or alpha-3 code
    Info { code: String },
    /// Search country names
    Search { query: String },
    /// Countries in a region
    Region { region: String },
    /// Countries using a currency
    Currency { code: String },
    /// Countries listing a language
    Language { code: String },
    /// Countries sharing a calling code
    Dial { code: String },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = KitConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    let catalog = Catalog::load(cli.data_dir.unwrap_or_else(|| cfg.data_dir()))?;

    let countries: Vec<&Country> = match &cli.command {
        Commands::List => {
            let mut all: Vec<&Country> = catalog.countries().iter().collect();
            all.sort_by(|a, b| countrykit::country::collate(&a.name, &b.name));
            all
        }
        Commands::Info { code } => match catalog.by_code(code) {
            Some(country) => {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(country)?);
                } else {
                    print_details(country);
                }
                return Ok(());
            }
            None => {
                eprintln!("❌ Country not found: {}", code);
                std::process::exit(1);
            }
        },
        Commands::Search { query } => catalog.search(query),
        Commands::Region { region } => catalog.by_region(region),
        Commands::Currency { code } => catalog.by_currency(code),
        Commands::Language { code } => catalog.by_language(code),
        Commands::Dial { code } => catalog.by_calling_code(code).iter().collect(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&countries)?);
    } else {
        println!("{} countries:", countries.len());
        println!();
        for c in countries {
            println!("{} {:3} - {}", c.flag.emoji, c.cca2, c.name);
        }
    }
    Ok(())
}

fn print_details(country: &Country) {
    let currencies: Vec<String> = country
        .currency
        .iter()
        .map(|c| format!("{} ({})", c.code, c.symbol))
        .collect();
    let languages: Vec<&str> = country.languages.iter().map(|l| l.name.as_str()).collect();

    println!("{} {}", country.flag.emoji, country.name);
    println!("{}", "=".repeat(50));
    println!("Native Name:   {}", country.native_name);
    println!("ISO Codes:     {} / {} / {}", country.cca2, country.cca3, country.ccn3);
    println!("Calling Code:  {}", country.calling_code());
    println!("Capital:       {}", country.capital);
    println!("Region:        {} ({})", country.region, country.subregion);
    println!("TLD:           {}", country.tld);
    println!("Currencies:    {}", currencies.join(", "));
    println!("Languages:     {}", languages.join(", "));
}
