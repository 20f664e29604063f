//! Output directive injection.
//!
//! A post-processed schema must tell the generator where to write its client,
//! otherwise every schema would overwrite the default client. Schemas without
//! an `output = "..."` line get one injected right after the opening of their
//! `generator client` block, pointing at `<output>/clients/<schema>`. The
//! schema file is rewritten in place, so later runs find the directive and
//! leave the file alone.

use std::fs;
use std::path::Path;

use regex::{Captures, Regex};
use tracing::info;
use types::SchemaDescriptor;

use crate::layout::OutputLayout;
use crate::{PipelineError, Stage};

/// Matches an explicit output directive and captures its value.
const OUTPUT_DIRECTIVE_PATTERN: &str = r#"(?m)^\s*output\s*=\s*"([^"]*)""#;

/// Matches the opening of the client generator block.
const GENERATOR_BLOCK_PATTERN: &str = r"generator\s+client\s*\{";

/// Result of checking a schema source for an output directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectivePlan {
    /// The schema already declares this output location.
    AlreadyDeclared(String),
    /// The directive was injected; `source` is the new schema text.
    Inject {
        /// Schema text with the directive added
        source: String,
        /// Output location that was injected
        output: String,
    },
    /// The schema has no `generator client` block to inject into.
    MissingGeneratorBlock,
}

/// Output location the schema declares, if any.
pub fn declared_output(source: &str) -> Result<Option<String>, regex::Error> {
    let re = Regex::new(OUTPUT_DIRECTIVE_PATTERN)?;
    Ok(re.captures(source).map(|caps| caps[1].to_string()))
}

/// Decide what to do with `source` given the output location to inject.
///
/// Pure; nothing is written.
pub fn plan_directive(source: &str, output: &str) -> Result<DirectivePlan, regex::Error> {
    if let Some(existing) = declared_output(source)? {
        return Ok(DirectivePlan::AlreadyDeclared(existing));
    }

    let block = Regex::new(GENERATOR_BLOCK_PATTERN)?;
    if !block.is_match(source) {
        return Ok(DirectivePlan::MissingGeneratorBlock);
    }

    let injected = block.replacen(source, 1, |caps: &Captures| {
        format!("{}\n  output = \"{}\"", &caps[0], output)
    });
    Ok(DirectivePlan::Inject { source: injected.into_owned(), output: output.to_string() })
}

/// Output location injected for `schema`: the path from the schema's directory
/// to the schema's default client directory, with `/` separators.
pub fn injected_output_for(schema: &SchemaDescriptor, layout: &OutputLayout) -> String {
    let target = layout.default_client_dir(&schema.name);
    match path::relative_path(schema.directory(), &target) {
        Some(rel) => path::to_slash(&rel),
        None => path::to_slash(&target),
    }
}

/// Make sure `schema` declares an output location, rewriting the file if needed.
///
/// # Returns
///
/// Returns the declared or injected output location. A schema without a
/// `generator client` block, or whose output location is the shared artifact
/// directory or lies inside it, is a [`PipelineError::SchemaValidation`]; the
/// file is left untouched in both cases.
pub fn ensure_output_directive(
    schema: &SchemaDescriptor,
    layout: &OutputLayout,
) -> Result<String, PipelineError> {
    let plan = plan_directive(&schema.source, &injected_output_for(schema, layout))?;
    let output = match &plan {
        DirectivePlan::AlreadyDeclared(output) | DirectivePlan::Inject { output, .. } =>
            output.clone(),
        DirectivePlan::MissingGeneratorBlock => {
            return Err(invalid(schema, "missing generator client block".to_string()))
        }
    };

    if layout.is_shared(&path::absolutize(schema.directory(), Path::new(&output))) {
        return Err(invalid(
            schema,
            format!("output directory {} overlaps the shared client directory", output),
        ));
    }

    match plan {
        DirectivePlan::Inject { source, .. } => {
            write_schema(schema, &source)?;
            info!("Adding output directory to {}", file_name(&schema.path));
        }
        _ => logging::trace("directive", &format!("{} already declares {}", schema.name, output)),
    }
    Ok(output)
}

fn invalid(schema: &SchemaDescriptor, reason: String) -> PipelineError {
    PipelineError::SchemaValidation {
        schema: schema.name.clone(),
        file: file_name(&schema.path),
        reason,
    }
}

fn write_schema(schema: &SchemaDescriptor, text: &str) -> Result<(), PipelineError> {
    fs::write(&schema.path, text).map_err(|source| PipelineError::ArtifactOperation {
        schema: schema.name.clone(),
        stage: Stage::Injection,
        path: schema.path.clone(),
        source,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default()
}
