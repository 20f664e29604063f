#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Post-generation linking pipeline for multiple Prisma clients.
//!
//! `prisma generate` produces one self-contained client per schema, each with
//! its own copy of the native query engine and runtime, all exported as
//! `PrismaClient`. This crate runs the generator for every schema in a
//! directory and links the results so they coexist in one project: one shared
//! engine and runtime, uniquely named clients, and an aggregate entry module
//! that re-exports them all.
//!
//! ## Module Organization
//!
//! - `discovery` - Schema listing and classification
//! - `directive` - Output directive injection into schema files
//! - `generator` - Generator invocation (external collaborator)
//! - `locator` - Client location from generator output
//! - `patch` - Anchored text patches over generated files
//! - `dedup` - Shared engine/runtime registry and deduplication
//! - `rewriter` - Client source and type declaration rewriting
//! - `aggregate_index` - Aggregate entry modules
//! - `layout` - Output directory layout
//! - `report` - Run summary
//! - `orchestration` - Main pipeline entry points (`run`, `run_with`)

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Convenient result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stage an error or event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Listing the schema directory
    Discovery,
    /// Preparing the output directory
    Preparation,
    /// Checking and injecting the output directive
    Injection,
    /// Running the generator
    Generation,
    /// Extracting the client location from generator output
    Location,
    /// Moving or deleting engine and runtime copies
    Deduplication,
    /// Patching client sources and type declarations
    Rewriting,
    /// Building the aggregate entry modules
    Indexing,
}

impl Stage {
    /// Get the string representation of the stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discovery => "discovery",
            Stage::Preparation => "preparation",
            Stage::Injection => "injection",
            Stage::Generation => "generation",
            Stage::Location => "location",
            Stage::Deduplication => "deduplication",
            Stage::Rewriting => "rewriting",
            Stage::Indexing => "indexing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

/// Errors that can occur while running the generation pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The schema directory could not be listed. Fatal.
    #[error("Error reading directory {}: {source}", dir.display())]
    Discovery {
        /// Directory that was listed
        dir: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// A schema file could not be read.
    #[error("Failed to read schema file {}: {source}", path.display())]
    SchemaRead {
        /// Schema name
        schema: String,
        /// Schema file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// A schema lacks a required structural block or would collide with
    /// another schema.
    #[error("Invalid schema file {file}: {reason}")]
    SchemaValidation {
        /// Schema name
        schema: String,
        /// Schema file name
        file: String,
        /// What is wrong with it
        reason: String,
    },
    /// The generator failed to run or exited unsuccessfully.
    #[error("Generator failed for {schema}: {source}")]
    Generator {
        /// Schema name
        schema: String,
        /// Underlying generator error
        #[source]
        source: generator::GeneratorError,
    },
    /// The generator output does not report where the client was written.
    #[error("Error parsing client path from generator output for {schema}")]
    OutputParse {
        /// Schema name
        schema: String,
        /// Raw generator output
        output: String,
    },
    /// A filesystem operation on generated artifacts failed.
    #[error("{stage} failed for {schema} at {}: {source}", path.display())]
    ArtifactOperation {
        /// Schema name
        schema: String,
        /// Stage the operation belongs to
        stage: Stage,
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// An expected generated artifact is missing.
    #[error("{stage} failed for {schema}: missing {what} in {}", dir.display())]
    MissingArtifact {
        /// Schema name
        schema: String,
        /// Stage that looked for the artifact
        stage: Stage,
        /// Description of the missing artifact
        what: String,
        /// Directory that was searched
        dir: PathBuf,
    },
    /// A required patch anchor is absent from a generated file.
    #[error("Patch '{patch}' found no anchor in {} (schema {schema})", file.display())]
    PatchPatternNotFound {
        /// Schema name
        schema: String,
        /// Stage the patch belongs to
        stage: Stage,
        /// File being patched
        file: PathBuf,
        /// Name of the patch whose anchor was not found
        patch: &'static str,
    },
    /// A generated client landed in the shared artifact directory. Fatal, since
    /// the generator may already have overwritten the shared copies.
    #[error("Client for {schema} was generated into the shared directory {}", dir.display())]
    SharedDirOverlap {
        /// Schema name
        schema: String,
        /// Reported client directory
        dir: PathBuf,
    },
    /// The output directory would overlap the project or its schemas.
    #[error("Refusing to use output directory {}: {reason}", dir.display())]
    UnsafeOutputDir {
        /// Configured output directory
        dir: PathBuf,
        /// Why it was rejected
        reason: String,
    },
    /// Generic message-based error.
    #[error("{0}")]
    Message(String),
    /// I/O error while creating or writing files.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Regex compilation error in a patch or pattern.
    #[error(transparent)]
    Regex(#[from] regex::Error),
    /// Serialization error when writing the run report.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Whether the error only affects the schema being processed.
    ///
    /// Schema-scoped errors are logged and the schema is skipped; everything
    /// else aborts the run.
    pub fn is_schema_scoped(&self) -> bool {
        matches!(
            self,
            PipelineError::SchemaRead { .. }
                | PipelineError::SchemaValidation { .. }
                | PipelineError::Generator { .. }
                | PipelineError::OutputParse { .. }
        )
    }

    /// Stage the error was raised in, when it is tied to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Discovery { .. } => Some(Stage::Discovery),
            PipelineError::SchemaRead { .. } | PipelineError::SchemaValidation { .. } =>
                Some(Stage::Injection),
            PipelineError::Generator { .. } => Some(Stage::Generation),
            PipelineError::OutputParse { .. } => Some(Stage::Location),
            PipelineError::ArtifactOperation { stage, .. }
            | PipelineError::MissingArtifact { stage, .. }
            | PipelineError::PatchPatternNotFound { stage, .. } => Some(*stage),
            PipelineError::SharedDirOverlap { .. } => Some(Stage::Deduplication),
            PipelineError::UnsafeOutputDir { .. } => Some(Stage::Preparation),
            _ => None,
        }
    }

    /// Schema the error concerns, when it is tied to one.
    pub fn schema(&self) -> Option<&str> {
        match self {
            PipelineError::SchemaRead { schema, .. }
            | PipelineError::SchemaValidation { schema, .. }
            | PipelineError::Generator { schema, .. }
            | PipelineError::OutputParse { schema, .. }
            | PipelineError::ArtifactOperation { schema, .. }
            | PipelineError::MissingArtifact { schema, .. }
            | PipelineError::PatchPatternNotFound { schema, .. }
            | PipelineError::SharedDirOverlap { schema, .. } => Some(schema),
            _ => None,
        }
    }
}

// Module declarations
pub mod aggregate_index;
pub mod dedup;
pub mod directive;
pub mod discovery;
pub mod generator;
pub mod layout;
pub mod locator;
pub mod orchestration;
pub mod patch;
pub mod report;
pub mod rewriter;

// Re-export public API from orchestration module
pub use orchestration::{run, run_with, RunSettings};
pub use report::RunReport;
