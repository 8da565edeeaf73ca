//! Config CLI
//!
//! View and manage pipeline configuration.

use clap::{Parser, Subcommand};
use countrykit::KitConfig;

#[derive(Parser)]
#[command(name = "countrykit-config")]
#[command(about = "View and manage countrykit configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show current configuration
    Show {
        /// Config file to load (optional)
        #[arg(short, long)]
        config: Option<String>,

        /// Output as TOML
        #[arg(long)]
        toml: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Initialize a new config file
    Init {
        /// Output path
        #[arg(short, long, default_value = "countrykit.toml")]
        output: String,
    },

    /// Validate configuration
    Validate {
        /// Config file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Show { config, toml, json } => {
            let cfg = KitConfig::load_from(config.as_deref())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else if toml {
                println!("{}", ::toml::to_string_pretty(&cfg)?);
            } else {
                println!("📋 CountryKit Configuration\n");
                println!("Data:");
                println!("  Dir: {:?}", cfg.data.dir);

                println!("\nGenerate:");
                println!("  Format: {:?}", cfg.generate.output_format);
                println!("  Checksums: {}", cfg.generate.write_checksums);

                println!("\nMerge:");
                println!("  Source: {}", cfg.merge.source_url);

                println!("\nFlags:");
                println!("  Dir: {:?}", cfg.flags.dir);
                println!("  Base URL: {}", cfg.flags.base_url);
                println!("  Batch size: {}", cfg.flags.batch_size);
                println!("  Batch pause: {}ms", cfg.flags.batch_pause_ms);
            }
        }

        Commands::Init { output } => {
            let cfg = KitConfig::default();
            cfg.save(&output)?;
            println!("✅ Created config file: {}", output);
        }

        Commands::Validate { config } => match KitConfig::load_from(config.as_deref()) {
            Ok(cfg) => {
                println!("✅ Configuration is valid");
                println!("   Data: {:?}", cfg.data.dir);
                println!("   Flags: {:?}", cfg.flags.dir);
            }
            Err(e) => {
                eprintln!("❌ Configuration error: {}", e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
