//! Run summary.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use types::{ClientSymbol, SchemaKind};

use crate::{PipelineError, Stage};

/// A client linked during the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientEntry {
    /// Schema the client was generated from
    pub schema: String,
    /// Exported symbol
    pub symbol: ClientSymbol,
    /// Module specifier in the aggregate index
    pub module: String,
    /// Client directory
    pub dir: PathBuf,
}

/// A schema that was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSchema {
    /// Schema name
    pub schema: String,
    /// How the schema would have been processed
    pub kind: SchemaKind,
    /// Stage that failed
    pub stage: Option<Stage>,
    /// Error message
    pub reason: String,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// RFC 3339 timestamp of the end of the run
    pub timestamp: String,
    /// Schemas whose generator invocation succeeded
    pub generated: usize,
    /// Whether the primary schema was generated
    pub primary_generated: bool,
    /// Linked clients in processing order
    pub clients: Vec<ClientEntry>,
    /// Schemas skipped after a schema-scoped error
    pub skipped: Vec<SkippedSchema>,
    /// Aggregate export order
    pub exports: Vec<ClientSymbol>,
}

impl RunReport {
    /// Empty report.
    pub fn new() -> Self {
        Self {
            timestamp: String::new(),
            generated: 0,
            primary_generated: false,
            clients: Vec::new(),
            skipped: Vec::new(),
            exports: Vec::new(),
        }
    }

    /// Record a skipped schema.
    pub fn skip(&mut self, schema: &str, kind: SchemaKind, error: &PipelineError) {
        self.skipped.push(SkippedSchema {
            schema: schema.to_string(),
            kind,
            stage: error.stage(),
            reason: error.to_string(),
        });
    }

    /// Stamp the report with the current time.
    pub fn finish(&mut self) { self.timestamp = chrono::Utc::now().to_rfc3339(); }

    /// Write the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), PipelineError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| PipelineError::ArtifactOperation {
            schema: "*".to_string(),
            stage: Stage::Indexing,
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for RunReport {
    fn default() -> Self { Self::new() }
}
