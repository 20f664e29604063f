//! Pipeline CLI tool for Prismany.
//!
//! Runs one generation pass with the discovered configuration, or with the
//! configuration file given as the only argument.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

use std::env;
use std::path::PathBuf;

use config::Config;
use pipeline::RunSettings;

fn main() {
    let args: Vec<String> = env::args().collect();

    let explicit = match args.len() {
        1 => None,
        2 if args[1] != "--help" && args[1] != "-h" => Some(PathBuf::from(&args[1])),
        _ => {
            eprintln!("Usage:");
            eprintln!("  {}                 # Use prismany.toml, the user config or defaults", args[0]);
            eprintln!("  {} <config.toml>   # Use the given configuration file", args[0]);
            std::process::exit(1);
        }
    };

    let cwd = match env::current_dir() {
        Ok(cwd) => cwd,
        Err(e) => {
            eprintln!("Error: cannot determine current directory: {}", e);
            std::process::exit(1);
        }
    };

    let (config, source) = match Config::discover(explicit.as_deref(), &cwd) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.logging.level, config.logging.file.as_deref()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let settings = RunSettings::from_config(&config, config.project_root(&source, &cwd));
    if let Err(e) = pipeline::run(&settings) {
        eprintln!("pipeline failed: {}", e);
        std::process::exit(1);
    }
}
