//! Shared engine and runtime deduplication.
//!
//! Every generated client ships its own copy of the native query engine and of
//! the runtime directory. The first copy of each is moved into the shared
//! directory; later copies are deleted. The shared runtime's engine lookup is
//! pinned to the shared engine once, when the runtime is first moved.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use types::artifacts::{
    is_engine_file, CLIENT_INDEX_FILE, CLIENT_TYPES_FILE, RUNTIME_DIR, RUNTIME_LIBRARY_FILE,
};

use crate::layout::OutputLayout;
use crate::patch::{escape_replacement, Patch, PatchSet, Requirement};
use crate::{PipelineError, Stage};

/// Engine path lookup in the runtime library, keyed by engine type.
const RUNTIME_ENGINE_LOOKUP_PATTERN: &str = r"let (\w+?)=\{binary:process\.env\.PRISMA_QUERY_ENGINE_BINARY,library:process\.env\.PRISMA_QUERY_ENGINE_LIBRARY\}\[\w+?\]\?\?\w+?\.prismaPath;";

/// A client directory written by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedClient {
    /// Schema the client was generated from
    pub schema: String,
    /// Absolute client directory
    pub dir: PathBuf,
}

impl GeneratedClient {
    /// Client generated from `schema` into `dir`.
    pub fn new(schema: impl Into<String>, dir: PathBuf) -> Self {
        Self { schema: schema.into(), dir }
    }

    /// CommonJS entry point.
    pub fn index_js(&self) -> PathBuf { self.dir.join(CLIENT_INDEX_FILE) }

    /// Type declarations.
    pub fn index_dts(&self) -> PathBuf { self.dir.join(CLIENT_TYPES_FILE) }

    /// Runtime directory shipped with the client.
    pub fn runtime_dir(&self) -> PathBuf { self.dir.join(RUNTIME_DIR) }

    /// Locate every query engine library shipped with the client, sorted by
    /// file name. A client generated for several binary targets ships one per
    /// target.
    pub fn find_engines(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| self.error(&self.dir, source))?;
        let mut engines = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| self.error(&self.dir, source))?;
            if is_engine_file(&entry.file_name().to_string_lossy()) {
                engines.push(entry.path());
            }
        }
        if engines.is_empty() {
            return Err(PipelineError::MissingArtifact {
                schema: self.schema.clone(),
                stage: Stage::Deduplication,
                what: "query engine library".to_string(),
                dir: self.dir.clone(),
            });
        }
        engines.sort();
        Ok(engines)
    }

    fn error(&self, path: &Path, source: std::io::Error) -> PipelineError {
        PipelineError::ArtifactOperation {
            schema: self.schema.clone(),
            stage: Stage::Deduplication,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Locations of the shared engine and runtime once both exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedArtifacts {
    /// Shared query engine library
    pub engine: PathBuf,
    /// Shared runtime directory
    pub runtime: PathBuf,
}

/// Tracks which shared artifacts have been created during a run.
///
/// Owned by the orchestrator for the duration of one run; never global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SharedArtifactRegistry {
    engine: Option<PathBuf>,
    runtime: Option<PathBuf>,
}

impl SharedArtifactRegistry {
    /// Registry with nothing shared yet.
    pub fn new() -> Self { Self::default() }

    /// Whether the shared engine has been created.
    pub fn engine_created(&self) -> bool { self.engine.is_some() }

    /// Whether the shared runtime has been created.
    pub fn runtime_created(&self) -> bool { self.runtime.is_some() }

    /// Shared engine location, if created.
    pub fn engine(&self) -> Option<&Path> { self.engine.as_deref() }

    /// Shared runtime location, if created.
    pub fn runtime(&self) -> Option<&Path> { self.runtime.as_deref() }

    /// Both shared locations, once both exist.
    pub fn shared(&self) -> Option<SharedArtifacts> {
        match (&self.engine, &self.runtime) {
            (Some(engine), Some(runtime)) =>
                Some(SharedArtifacts { engine: engine.clone(), runtime: runtime.clone() }),
            _ => None,
        }
    }
}

/// Patch pinning the runtime's engine lookup to `engine_path`.
pub fn runtime_patch(engine_path: &str) -> Result<PatchSet, regex::Error> {
    Ok(PatchSet::new().with(Patch::new(
        "runtime-engine-path",
        RUNTIME_ENGINE_LOOKUP_PATTERN,
        format!("let ${{1}}='{}';", escape_replacement(engine_path)),
        Requirement::Required,
    )?))
}

/// Engine path written into the shared runtime: relative to the project root,
/// with `/` separators, since the runtime resolves it against the working
/// directory of the process using the client.
pub fn runtime_engine_path(project_root: &Path, engine: &Path) -> String {
    match path::relative_path(project_root, engine) {
        Some(rel) => path::to_slash(&rel),
        None => path::to_slash(engine),
    }
}

/// Move or delete the engine and runtime copies of `client`.
///
/// The first client's first engine (by file name) becomes the shared engine;
/// every other engine file is deleted. A client directory that is the shared
/// directory or lies inside it is a [`PipelineError::SharedDirOverlap`].
///
/// # Arguments
///
/// * `client` - Freshly generated client
/// * `registry` - Shared artifacts created so far in this run
/// * `layout` - Output layout
/// * `project_root` - Directory the generated code runs from
///
/// # Returns
///
/// Returns the shared artifact locations after this client was processed.
pub fn deduplicate(
    client: &GeneratedClient,
    registry: &mut SharedArtifactRegistry,
    layout: &OutputLayout,
    project_root: &Path,
) -> Result<SharedArtifacts, PipelineError> {
    if layout.is_shared(&client.dir) {
        return Err(PipelineError::SharedDirOverlap {
            schema: client.schema.clone(),
            dir: client.dir.clone(),
        });
    }
    dedup_engine(client, registry, layout)?;
    dedup_runtime(client, registry, layout, project_root)?;
    registry.shared().ok_or_else(|| {
        PipelineError::Message(format!("shared artifacts missing after processing {}", client.schema))
    })
}

fn dedup_engine(
    client: &GeneratedClient,
    registry: &mut SharedArtifactRegistry,
    layout: &OutputLayout,
) -> Result<(), PipelineError> {
    let mut engines = client.find_engines()?.into_iter();
    if !registry.engine_created() {
        if let Some(engine) = engines.next() {
            let file_name =
                engine.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let shared = layout.shared_engine(&file_name);
            fs::rename(&engine, &shared).map_err(|source| client.error(&engine, source))?;
            debug!("Moved engine to {}", shared.display());
            registry.engine = Some(shared);
        }
    }

    for engine in engines {
        debug!("Removing duplicate engine {}", engine.display());
        fs::remove_file(&engine).map_err(|source| client.error(&engine, source))?;
    }
    Ok(())
}

fn dedup_runtime(
    client: &GeneratedClient,
    registry: &mut SharedArtifactRegistry,
    layout: &OutputLayout,
    project_root: &Path,
) -> Result<(), PipelineError> {
    let runtime = client.runtime_dir();
    if !runtime.is_dir() {
        return Err(PipelineError::MissingArtifact {
            schema: client.schema.clone(),
            stage: Stage::Deduplication,
            what: format!("{} directory", RUNTIME_DIR),
            dir: client.dir.clone(),
        });
    }

    if registry.runtime_created() {
        debug!("Removing duplicate runtime {}", runtime.display());
        return fs::remove_dir_all(&runtime).map_err(|source| client.error(&runtime, source));
    }

    let shared = layout.shared_runtime_dir();
    fs::rename(&runtime, &shared).map_err(|source| client.error(&runtime, source))?;
    debug!("Moved runtime to {}", shared.display());

    let engine = registry.engine().ok_or_else(|| {
        PipelineError::Message("shared engine must exist before the runtime is patched".to_string())
    })?;
    let engine_path = runtime_engine_path(project_root, engine);
    runtime_patch(&engine_path)?.apply_to_file(
        &shared.join(RUNTIME_LIBRARY_FILE),
        &client.schema,
        Stage::Deduplication,
    )?;
    registry.runtime = Some(shared);
    Ok(())
}
