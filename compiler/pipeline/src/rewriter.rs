//! Client source and type declaration rewriting.
//!
//! After deduplication a client's entry point still refers to its own runtime
//! and engine, and still exports the generator's default class name. The
//! rewrites here point it at the shared copies and rename the class to the
//! client's unique symbol, in both the source and the type declarations.

use std::path::Path;

use regex::escape;
use tracing::debug;
use types::artifacts::DEFAULT_CLIENT_NAME;
use types::ClientSymbol;

use crate::dedup::{GeneratedClient, SharedArtifacts};
use crate::patch::{escape_replacement, Patch, PatchSet, Requirement};
use crate::{PipelineError, Stage};

/// Module specifier and engine path a client uses to reach the shared artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedReferences {
    /// Specifier replacing `./runtime` (e.g. `../shared/runtime`)
    pub runtime: String,
    /// Engine path joined to `__dirname` (e.g. `../shared/libquery_engine-x.so.node`)
    pub engine: String,
}

impl SharedReferences {
    /// References from `client_dir` to `shared`.
    pub fn from_client_dir(client_dir: &Path, shared: &SharedArtifacts) -> Self {
        let runtime = match path::relative_path(client_dir, &shared.runtime) {
            Some(rel) => path::module_specifier(&rel),
            None => path::to_slash(&shared.runtime),
        };
        let engine = match path::relative_path(client_dir, &shared.engine) {
            Some(rel) => path::to_slash(&rel),
            None => path::to_slash(&shared.engine),
        };
        Self { runtime, engine }
    }
}

/// Patches applied to a client's `index.js`.
pub fn source_patches(
    symbol: &ClientSymbol,
    refs: &SharedReferences,
) -> Result<PatchSet, regex::Error> {
    let default = escape(DEFAULT_CLIENT_NAME);
    let symbol = escape_replacement(symbol.as_str());
    let engine_call = format!("path.join(__dirname, \"{}\")", escape_replacement(&refs.engine));

    Ok(PatchSet::new()
        .with(Patch::new(
            "runtime-import",
            r#"(["'])\./runtime\b"#,
            format!("${{1}}{}", escape_replacement(&refs.runtime)),
            Requirement::Required,
        )?)
        .with(Patch::new(
            "engine-dirname",
            r#"path\.join\(__dirname,\s*"(?:lib)?query_engine-[^"]+?\.node"\)"#,
            engine_call.clone(),
            Requirement::Required,
        )?)
        .with(Patch::new(
            "engine-cwd",
            r#"path\.join\(process\.cwd\(\),\s*"[^"]*?(?:lib)?query_engine-[^"]+?\.node"\)"#,
            engine_call,
            Requirement::Optional,
        )?)
        .with(Patch::new(
            "client-declaration",
            &format!(r"\bconst {}\s*=", default),
            format!("const {} =", symbol),
            Requirement::Required,
        )?)
        .with(Patch::new(
            "client-export",
            &format!(r"\bexports\.{0}\s*=\s*{0}\b", default),
            format!("exports.{0} = {0}", symbol),
            Requirement::Required,
        )?))
}

/// Patches applied to a client's `index.d.ts`.
pub fn declaration_patches(
    symbol: &ClientSymbol,
    refs: &SharedReferences,
) -> Result<PatchSet, regex::Error> {
    let default = escape(DEFAULT_CLIENT_NAME);
    let symbol = escape_replacement(symbol.as_str());

    Ok(PatchSet::new()
        .with(Patch::new(
            "runtime-types-import",
            r#"(["'])\./runtime\b"#,
            format!("${{1}}{}", escape_replacement(&refs.runtime)),
            Requirement::Optional,
        )?)
        .with(Patch::new(
            "client-class",
            &format!(r"\bexport class {}<", default),
            format!("export class {}<", symbol),
            Requirement::Required,
        )?)
        .with(Patch::new(
            "default-client-alias",
            &format!(r"\bexport type Default{0} = {0}\b", default),
            format!("export type Default{} = {}", DEFAULT_CLIENT_NAME, symbol),
            Requirement::Optional,
        )?))
}

/// Rewrite `client` to use the shared artifacts and export `symbol`.
///
/// Both files are patched in memory first; neither is written unless every
/// required anchor in both was found.
pub fn rewrite_client(
    client: &GeneratedClient,
    symbol: &ClientSymbol,
    shared: &SharedArtifacts,
) -> Result<(), PipelineError> {
    let refs = SharedReferences::from_client_dir(&client.dir, shared);
    debug!("Rewriting {} to use {} and {}", client.schema, refs.runtime, refs.engine);

    let source =
        source_patches(symbol, &refs)?.stage_file(&client.index_js(), &client.schema, Stage::Rewriting)?;
    let declarations = declaration_patches(symbol, &refs)?.stage_file(
        &client.index_dts(),
        &client.schema,
        Stage::Rewriting,
    )?;
    source.commit()?;
    declarations.commit()?;
    Ok(())
}
