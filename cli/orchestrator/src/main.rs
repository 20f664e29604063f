//! Prismany CLI
//!
//! This binary provides the main entry point for Prismany, offering
//! subcommands to generate and link every client, inspect the schema
//! directory, and write a starter configuration.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use config::{Config, CONFIG_FILE_NAME};
use prismany_cli::{describe_source, list_schemas, load, CliError, Overrides, Result};
use tracing::debug;

/// Command-line interface configuration for prismany.
#[derive(Parser, Debug)]
#[command(name = "prismany", about = "Generate many Prisma clients into one project", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
    /// Configuration file (defaults to the nearest prismany.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log level or filter directive (overrides the configuration)
    #[arg(long, global = true)]
    log_level: Option<String>,
}

/// Available prismany commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate every schema's client and link them together
    Generate {
        /// Directory containing the schema files
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Output root (removed and recreated)
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Prefix of every exported client symbol
        #[arg(long)]
        prefix: Option<String>,
        /// Do not write generation_report.json
        #[arg(long)]
        no_report: bool,
    },
    /// List the schemas a run would process
    List {
        /// Directory containing the schema files
        #[arg(long)]
        input_dir: Option<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Write a configuration file with the default settings
    InitConfig {
        /// Destination (defaults to ./prismany.toml)
        #[arg(long)]
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Main entry point for the prismany application.
fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.cmd {
        Commands::Generate { input_dir, output_dir, prefix, no_report } => {
            let overrides = Overrides {
                input_dir,
                output_dir,
                client_prefix: prefix,
                no_report,
                log_level: cli.log_level,
            };
            let loaded = load(cli.config.as_deref(), &overrides, &cwd)?;
            logging::init(&loaded.config.logging.level, loaded.config.logging.file.as_deref())?;
            debug!("Using configuration from {}", describe_source(&loaded.source));

            // The pipeline logs the success summary itself
            let report = pipeline::run(&loaded.settings)?;
            for symbol in &report.exports {
                println!("  {}", symbol);
            }
            for skipped in &report.skipped {
                println!("  skipped {}: {}", skipped.schema, skipped.reason);
            }
        }
        Commands::List { input_dir, json } => {
            let overrides = Overrides { input_dir, log_level: cli.log_level, ..Overrides::default() };
            let loaded = load(cli.config.as_deref(), &overrides, &cwd)?;
            logging::init(&loaded.config.logging.level, loaded.config.logging.file.as_deref())?;

            let listed = list_schemas(&loaded.settings)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listed)?);
            } else {
                for schema in &listed {
                    println!(
                        "{}\t{}\t{}\t{}",
                        schema.file_name,
                        schema.kind,
                        schema.symbol.as_ref().map(|s| s.as_str()).unwrap_or("-"),
                        schema.output.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Commands::InitConfig { path: destination, force } => {
            let target = destination.unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            let target = path::absolutize(&cwd, &target);
            Config::default().save_new(&target, force).map_err(CliError::from)?;
            println!("Wrote {}", target.display());
        }
    }

    Ok(())
}
