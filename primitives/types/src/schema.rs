//! Schema discovery results and loaded schema sources.
//!
//! A run starts from a directory listing. Every schema file found there becomes
//! a [`DiscoveredSchema`] tagged with a [`SchemaKind`]: the reserved primary
//! schema is generated with the generator's defaults and left alone, all the
//! others go through the post-generation pipeline and are read into a
//! [`SchemaDescriptor`] before their output directive is checked.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How a discovered schema is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// Generated with the generator's default invocation and output location.
    /// Never post-processed and never part of the aggregate index.
    Primary,
    /// Generated into its own directory, then deduplicated, rewritten and indexed.
    PostProcessed,
}

impl SchemaKind {
    /// Get the string representation of the schema kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaKind::Primary => "primary",
            SchemaKind::PostProcessed => "post-processed",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

/// A schema file found in the input directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredSchema {
    /// File name as listed in the input directory (e.g. `users.prisma`)
    pub file_name: String,
    /// Schema name: the file name up to its first `.` (e.g. `users`)
    pub name: String,
    /// Full path to the schema file
    pub path: PathBuf,
    /// Processing path for this schema
    pub kind: SchemaKind,
}

impl DiscoveredSchema {
    /// Classify the schema file at `path`.
    ///
    /// The file named exactly `primary_file_name` is [`SchemaKind::Primary`];
    /// every other file is [`SchemaKind::PostProcessed`].
    pub fn classify(path: PathBuf, primary_file_name: &str) -> Self {
        let file_name =
            path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let name = schema_name(&file_name).to_string();
        let kind = if file_name == primary_file_name {
            SchemaKind::Primary
        } else {
            SchemaKind::PostProcessed
        };
        Self { file_name, name, path, kind }
    }

    /// Whether this is the primary schema.
    pub fn is_primary(&self) -> bool { self.kind == SchemaKind::Primary }
}

/// A post-processed schema with its source text loaded.
///
/// Immutable once read; the output directive injector writes a new source to
/// disk rather than mutating the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDescriptor {
    /// Schema name (e.g. `users`)
    pub name: String,
    /// Path the source was read from
    pub path: PathBuf,
    /// Raw schema text
    pub source: String,
}

impl SchemaDescriptor {
    /// Read the schema source for `schema` from disk.
    pub fn read(schema: &DiscoveredSchema) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(&schema.path)?;
        Ok(Self { name: schema.name.clone(), path: schema.path.clone(), source })
    }

    /// Directory containing the schema file.
    ///
    /// Relative output directives are resolved against this directory.
    pub fn directory(&self) -> &Path { self.path.parent().unwrap_or_else(|| Path::new(".")) }
}

/// Schema name for a schema file name: everything before the first `.`.
///
/// ```
/// use types::schema::schema_name;
/// assert_eq!(schema_name("users.prisma"), "users");
/// assert_eq!(schema_name("audit.v2.prisma"), "audit");
/// assert_eq!(schema_name("plain"), "plain");
/// ```
pub fn schema_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}
