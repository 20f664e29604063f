//! Pipeline orchestration for the main entry points.
//!
//! One run lists the schema directory, prepares a fresh output root, and then
//! drives every schema through the pipeline in order. The primary schema is
//! only generated. Every other schema has its output directive checked, is
//! generated, located, deduplicated against the clients before it, rewritten,
//! and added to the aggregate index. Schema-scoped failures skip the schema;
//! anything else aborts the run.

use std::path::{Path, PathBuf};

use config::{Config, GeneratorConfig};
use tracing::{error, info};
use types::artifacts::CLIENT_INDEX_FILE;
use types::{ClientSymbol, DiscoveredSchema, SchemaDescriptor, SchemaKind};

use crate::aggregate_index::AggregateIndex;
use crate::dedup::{deduplicate, GeneratedClient, SharedArtifactRegistry};
use crate::directive::ensure_output_directive;
use crate::discovery::discover_schemas;
use crate::generator::{CommandGenerator, GeneratorInvoker};
use crate::layout::OutputLayout;
use crate::locator::{reported_client_path, resolve_client_dir};
use crate::report::{ClientEntry, RunReport};
use crate::rewriter::rewrite_client;
use crate::{PipelineError, Result};

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    /// Directory the generator runs in; relative paths resolve against it
    pub project_root: PathBuf,
    /// Absolute schema directory
    pub input_dir: PathBuf,
    /// Schema file extension without the dot
    pub extension: String,
    /// File name of the primary schema
    pub primary: String,
    /// Absolute output root
    pub output_dir: PathBuf,
    /// Prefix of every exported client symbol
    pub client_prefix: String,
    /// Whether to write the run report
    pub write_report: bool,
    /// Generator invocation
    pub generator: GeneratorConfig,
}

impl RunSettings {
    /// Resolve `config` against `project_root`.
    pub fn from_config(config: &Config, project_root: PathBuf) -> Self {
        Self {
            input_dir: path::absolutize(&project_root, &config.schemas.input_dir),
            extension: config.schemas.extension.clone(),
            primary: config.schemas.primary.clone(),
            output_dir: path::absolutize(&project_root, &config.output.dir),
            client_prefix: config.output.client_prefix.clone(),
            write_report: config.output.report,
            generator: config.generator.clone(),
            project_root,
        }
    }

    /// Output layout for these settings.
    pub fn layout(&self) -> OutputLayout { OutputLayout::new(self.output_dir.clone()) }
}

/// Mutable state of one run.
struct RunState<'a> {
    settings: &'a RunSettings,
    layout: OutputLayout,
    registry: SharedArtifactRegistry,
    index: AggregateIndex,
    report: RunReport,
}

/// Run the pipeline with the configured generator command.
pub fn run(settings: &RunSettings) -> Result<RunReport> {
    let generator =
        CommandGenerator::from_config(&settings.generator, settings.project_root.clone());
    run_with(settings, &generator)
}

/// Run the pipeline with `generator`.
///
/// # Arguments
///
/// * `settings` - Resolved run settings
/// * `generator` - Generator invoked once per schema
///
/// # Returns
///
/// Returns the run report. Discovery failures, unsafe output directories and
/// artifact or patch failures abort the run with an error; schema-scoped
/// failures are recorded in the report and logged.
pub fn run_with(settings: &RunSettings, generator: &dyn GeneratorInvoker) -> Result<RunReport> {
    let schemas = discover_schemas(&settings.input_dir, &settings.extension, &settings.primary)
        .map_err(|err| {
            error!("Error reading directory: {}", err);
            err
        })?;
    info!("Found {} schema file(s) in {}", schemas.len(), settings.input_dir.display());

    let layout = settings.layout();
    layout.prepare(&settings.project_root, &settings.input_dir)?;
    AggregateIndex::new().write_all(&layout)?;

    let mut state = RunState {
        settings,
        layout,
        registry: SharedArtifactRegistry::new(),
        index: AggregateIndex::new(),
        report: RunReport::new(),
    };

    for schema in &schemas {
        let outcome = match schema.kind {
            SchemaKind::Primary => state.generate_primary(schema, generator),
            SchemaKind::PostProcessed => state.process(schema, generator),
        };
        if let Err(err) = outcome {
            if !err.is_schema_scoped() {
                error!(
                    schema = %schema.name,
                    stage = err.stage().map(|s| s.as_str()).unwrap_or("unknown"),
                    "Aborting run: {}",
                    err
                );
                return Err(err);
            }
            error!(
                schema = %schema.name,
                stage = err.stage().map(|s| s.as_str()).unwrap_or("unknown"),
                "{}",
                err
            );
            state.report.skip(&schema.name, schema.kind, &err);
        }
    }

    state.finish()
}

impl RunState<'_> {
    fn generate_primary(
        &mut self,
        schema: &DiscoveredSchema,
        generator: &dyn GeneratorInvoker,
    ) -> Result<()> {
        info!("Generating primary schema {}", schema.file_name);
        generator
            .generate(None)
            .map_err(|source| PipelineError::Generator { schema: schema.name.clone(), source })?;
        self.report.generated += 1;
        self.report.primary_generated = true;
        Ok(())
    }

    fn process(&mut self, schema: &DiscoveredSchema, generator: &dyn GeneratorInvoker) -> Result<()> {
        let descriptor = SchemaDescriptor::read(schema).map_err(|source| {
            PipelineError::SchemaRead { schema: schema.name.clone(), path: schema.path.clone(), source }
        })?;

        let symbol = ClientSymbol::for_schema(&self.settings.client_prefix, &schema.name);
        if self.index.contains(&symbol) {
            return Err(PipelineError::SchemaValidation {
                schema: schema.name.clone(),
                file: schema.file_name.clone(),
                reason: format!("client symbol {} is already used by another schema", symbol),
            });
        }

        ensure_output_directive(&descriptor, &self.layout)?;

        let schema_arg = self.schema_argument(&schema.path);
        info!("Generating {} ({})", schema.file_name, symbol);
        let output = generator
            .generate(Some(&schema_arg))
            .map_err(|source| PipelineError::Generator { schema: schema.name.clone(), source })?;

        let reported = reported_client_path(&output)?.ok_or_else(|| PipelineError::OutputParse {
            schema: schema.name.clone(),
            output: output.clone(),
        })?;
        let client = GeneratedClient::new(
            schema.name.clone(),
            resolve_client_dir(&self.settings.project_root, &reported),
        );

        let shared =
            deduplicate(&client, &mut self.registry, &self.layout, &self.settings.project_root)?;
        rewrite_client(&client, &symbol, &shared)?;

        let module = self.module_for(&client);
        logging::trace("orchestration", &format!("{} exported from {}", symbol, module));
        self.index.insert(symbol.clone(), module.clone());
        self.report.clients.push(ClientEntry {
            schema: schema.name.clone(),
            symbol,
            module,
            dir: client.dir.clone(),
        });
        self.report.generated += 1;
        Ok(())
    }

    /// Schema path as passed to the generator, relative to the project root when possible.
    fn schema_argument(&self, schema_path: &Path) -> PathBuf {
        path::relative_path(&self.settings.project_root, schema_path)
            .unwrap_or_else(|| schema_path.to_path_buf())
    }

    fn module_for(&self, client: &GeneratedClient) -> String {
        let entry = client.dir.join(CLIENT_INDEX_FILE);
        match path::relative_path(self.layout.root(), &entry) {
            Some(rel) => path::module_specifier(&rel),
            None => path::to_slash(&entry),
        }
    }

    fn finish(mut self) -> Result<RunReport> {
        self.index.write_all(&self.layout)?;
        self.report.exports = self.index.exports().into_iter().cloned().collect();
        self.report.finish();
        if self.settings.write_report {
            self.report.write_json(&self.layout.report_file())?;
        }
        info!("Successfully generated {} clients!", self.report.generated);
        Ok(self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_resolve_against_project_root() {
        let settings = RunSettings::from_config(&Config::default(), PathBuf::from("/work/app"));
        assert_eq!(settings.input_dir, PathBuf::from("/work/app/prisma"));
        assert_eq!(settings.output_dir, PathBuf::from("/work/app/node_modules/prismany"));
        assert_eq!(settings.primary, "schema.prisma");
        assert_eq!(settings.client_prefix, "PrismaClient");
        assert!(settings.write_report);
    }

    #[test]
    fn missing_input_dir_is_fatal() {
        struct Unreachable;
        impl GeneratorInvoker for Unreachable {
            fn generate(
                &self,
                _schema: Option<&Path>,
            ) -> std::result::Result<String, crate::generator::GeneratorError> {
                panic!("generator must not run when discovery fails")
            }
        }

        let temp = tempfile::tempdir().expect("Failed to create temporary directory");
        let settings = RunSettings::from_config(&Config::default(), temp.path().to_path_buf());
        match run_with(&settings, &Unreachable) {
            Err(PipelineError::Discovery { dir, .. }) => assert_eq!(dir, settings.input_dir),
            other => panic!("Expected Discovery error, got {:?}", other),
        }
        assert!(!settings.output_dir.exists());
    }
}
