#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Prismany Configuration
//!
//! This crate provides configuration management for Prismany.
//! It handles loading, saving, and locating configuration files that specify:
//! - Where schema files live and which one is the primary schema
//! - How the Prisma generator is invoked
//! - Where generated clients go and how their symbols are named
//! - Logging configuration
//!
//! Configuration is stored in TOML format. Every section is optional; missing
//! sections and fields fall back to the defaults of a standard Prisma project
//! layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the project-local configuration file.
pub const CONFIG_FILE_NAME: &str = "prismany.toml";

/// Errors that can occur when loading or saving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize configuration to TOML format
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    /// Configuration file was not found at the specified path
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Refused to overwrite an existing configuration file
    #[error("Config file already exists at: {0}")]
    AlreadyExists(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory the generator runs in and relative paths are resolved against.
    /// Defaults to the directory of the project config file, or the current directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
    /// Schema discovery settings
    pub schemas: SchemaConfig,
    /// Generator invocation settings
    pub generator: GeneratorConfig,
    /// Output layout settings
    pub output: OutputConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Schema discovery configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directory scanned for schema files (not recursive)
    pub input_dir: PathBuf,
    /// File extension of schema files, without the dot
    pub extension: String,
    /// File name of the primary schema, generated with the generator's defaults
    pub primary: String,
}

/// Generator invocation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program to run, looked up on `PATH` unless it is a path
    pub program: String,
    /// Arguments passed before the schema flag
    pub args: Vec<String>,
    /// Flag introducing the schema path for non-primary schemas
    pub schema_flag: String,
    /// Kill the generator after this many seconds; wait indefinitely when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Output layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the generated output; removed and recreated on every run
    pub dir: PathBuf,
    /// Prefix of every exported client symbol
    pub client_prefix: String,
    /// Write `generation_report.json` into the output root
    pub report: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive (error, warn, info, debug, trace)
    pub level: String,
    /// Log file path (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Where a loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Path given explicitly (e.g. `--config`)
    Explicit(PathBuf),
    /// `prismany.toml` found in the current directory or one of its ancestors
    Project(PathBuf),
    /// `{config_dir()}/prismany/config.toml`
    User(PathBuf),
    /// No file found; built-in defaults
    Defaults,
}

impl ConfigSource {
    /// Path of the file the configuration was read from, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Project(p) | ConfigSource::User(p) =>
                Some(p),
            ConfigSource::Defaults => None,
        }
    }

    /// Directory relative settings are anchored to when `project_root` is unset.
    ///
    /// Project and explicit files anchor to their own directory; user-level
    /// files and defaults anchor to `cwd`.
    pub fn anchor_dir(&self, cwd: &Path) -> PathBuf {
        match self {
            ConfigSource::Explicit(p) | ConfigSource::Project(p) => p
                .parent()
                .map(|dir| path::absolutize(cwd, dir))
                .unwrap_or_else(|| cwd.to_path_buf()),
            ConfigSource::User(_) | ConfigSource::Defaults => cwd.to_path_buf(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save this configuration as a pretty-printed TOML file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Save to `path`, refusing to replace an existing file unless `force` is set
    pub fn save_new<P: AsRef<Path>>(&self, path: P, force: bool) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if path.exists() && !force {
            return Err(ConfigError::AlreadyExists(path.to_path_buf()));
        }
        self.save(path)
    }

    /// Returns the user-level config file path:
    /// `{config_dir()}/prismany/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("prismany");
        Ok(config_dir.join("config.toml"))
    }

    /// Locate and load the configuration for a run started in `cwd`.
    ///
    /// Resolution order: `explicit` (must exist), the nearest `prismany.toml`
    /// in `cwd` or its ancestors, the user-level config file, built-in defaults.
    pub fn discover(
        explicit: Option<&Path>,
        cwd: &Path,
    ) -> Result<(Self, ConfigSource), ConfigError> {
        if let Some(explicit) = explicit {
            let explicit = path::absolutize(cwd, explicit);
            if !explicit.exists() {
                return Err(ConfigError::NotFound(explicit));
            }
            return Ok((Self::from_file(&explicit)?, ConfigSource::Explicit(explicit)));
        }

        if let Some(dir) = path::find_ancestor_with(cwd, CONFIG_FILE_NAME) {
            let file = dir.join(CONFIG_FILE_NAME);
            return Ok((Self::from_file(&file)?, ConfigSource::Project(file)));
        }

        if let Ok(user) = Self::default_path() {
            if user.exists() {
                return Ok((Self::from_file(&user)?, ConfigSource::User(user)));
            }
        }

        Ok((Self::default(), ConfigSource::Defaults))
    }

    /// Absolute project root for a configuration loaded from `source`.
    pub fn project_root(&self, source: &ConfigSource, cwd: &Path) -> PathBuf {
        let anchor = source.anchor_dir(cwd);
        match &self.project_root {
            Some(root) => path::absolutize(&anchor, root),
            None => anchor,
        }
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("prisma"),
            extension: "prisma".to_string(),
            primary: "schema.prisma".to_string(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            args: vec!["prisma".to_string(), "generate".to_string()],
            schema_flag: "--schema".to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("node_modules/prismany"),
            client_prefix: "PrismaClient".to_string(),
            report: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string(), file: None } }
}
