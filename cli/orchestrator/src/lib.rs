#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
//! Collection of utilities for the Prismany command line.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, ConfigSource};
use pipeline::directive::declared_output;
use pipeline::discovery::discover_schemas;
use pipeline::{PipelineError, RunSettings};
use serde::Serialize;
use thiserror::Error;
use types::{ClientSymbol, SchemaKind};

/// Errors that can occur during Prismany operations.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or written.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Logging could not be initialized.
    #[error(transparent)]
    Logging(#[from] logging::LoggingError),
    /// The pipeline aborted.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Failed to write command output.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// I/O error outside the pipeline.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for Prismany operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// Command-line values that take precedence over the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Schema directory
    pub input_dir: Option<PathBuf>,
    /// Output root
    pub output_dir: Option<PathBuf>,
    /// Client symbol prefix
    pub client_prefix: Option<String>,
    /// Disable the run report
    pub no_report: bool,
    /// Log level
    pub log_level: Option<String>,
}

impl Overrides {
    /// Apply the overrides to `config`. Paths are taken relative to `cwd`.
    pub fn apply(&self, config: &mut Config, cwd: &Path) {
        if let Some(dir) = &self.input_dir {
            config.schemas.input_dir = path::absolutize(cwd, dir);
        }
        if let Some(dir) = &self.output_dir {
            config.output.dir = path::absolutize(cwd, dir);
        }
        if let Some(prefix) = &self.client_prefix {
            config.output.client_prefix = prefix.clone();
        }
        if self.no_report {
            config.output.report = false;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

/// A configuration ready to run, with where it came from.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// Configuration after overrides
    pub config: Config,
    /// Where the configuration file was found
    pub source: ConfigSource,
    /// Resolved run settings
    pub settings: RunSettings,
}

/// Discover the configuration for `cwd`, apply `overrides` and resolve the run settings.
pub fn load(explicit: Option<&Path>, overrides: &Overrides, cwd: &Path) -> Result<Loaded> {
    let (mut config, source) = Config::discover(explicit, cwd)?;
    overrides.apply(&mut config, cwd);
    let project_root = config.project_root(&source, cwd);
    let settings = RunSettings::from_config(&config, project_root);
    Ok(Loaded { config, source, settings })
}

/// A discovered schema as shown by `prismany list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedSchema {
    /// File name in the schema directory
    pub file_name: String,
    /// Schema name
    pub name: String,
    /// How a run processes the schema
    pub kind: SchemaKind,
    /// Exported symbol; primary schemas are not exported
    pub symbol: Option<ClientSymbol>,
    /// Output location the schema already declares
    pub output: Option<String>,
}

/// Describe the schemas a run with `settings` would process. Nothing is written.
pub fn list_schemas(settings: &RunSettings) -> Result<Vec<ListedSchema>> {
    let schemas = discover_schemas(&settings.input_dir, &settings.extension, &settings.primary)?;
    let mut listed = Vec::with_capacity(schemas.len());
    for schema in schemas {
        let source = std::fs::read_to_string(&schema.path)?;
        let symbol = match schema.kind {
            SchemaKind::Primary => None,
            SchemaKind::PostProcessed =>
                Some(ClientSymbol::for_schema(&settings.client_prefix, &schema.name)),
        };
        listed.push(ListedSchema {
            output: declared_output(&source).map_err(PipelineError::from)?,
            file_name: schema.file_name,
            name: schema.name,
            kind: schema.kind,
            symbol,
        });
    }
    Ok(listed)
}

/// Human-readable name of a configuration source.
pub fn describe_source(source: &ConfigSource) -> String {
    match source.path() {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    }
}
