//! Schema discovery.
//!
//! Lists the input directory (no recursion) and keeps the entries carrying the
//! schema extension, in lexicographic file name order.

use std::fs;
use std::path::Path;

use types::DiscoveredSchema;

use crate::PipelineError;

/// List the schema files in `dir`.
///
/// # Arguments
///
/// * `dir` - Directory to list
/// * `extension` - Schema file extension without the dot (e.g. `prisma`)
/// * `primary_file_name` - File name of the primary schema (e.g. `schema.prisma`)
///
/// # Returns
///
/// Returns the discovered schemas sorted by file name. Failing to list `dir`
/// is a [`PipelineError::Discovery`], which aborts the run.
pub fn discover_schemas(
    dir: &Path,
    extension: &str,
    primary_file_name: &str,
) -> Result<Vec<DiscoveredSchema>, PipelineError> {
    let discovery_error =
        |source: std::io::Error| PipelineError::Discovery { dir: dir.to_path_buf(), source };

    let suffix = format!(".{}", extension);
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;
        let file_name = entry.file_name();
        if file_name.to_string_lossy().ends_with(&suffix) {
            paths.push(entry.path());
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(paths.into_iter().map(|p| DiscoveredSchema::classify(p, primary_file_name)).collect())
}
