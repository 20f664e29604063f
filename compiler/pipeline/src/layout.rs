//! Output directory layout.
//!
//! ```text
//! <root>/
//!   index.ts                  aggregate entry, ES module dialect
//!   index.js                  aggregate entry, CommonJS dialect
//!   generation_report.json
//!   clients/
//!     shared/
//!       libquery_engine-*.node
//!       runtime/
//!     <schema>/
//!       index.js
//!       index.d.ts
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use types::artifacts::RUNTIME_DIR;

use crate::{PipelineError, Stage};

/// Directory holding every generated client.
pub const CLIENTS_DIR: &str = "clients";

/// Directory under [`CLIENTS_DIR`] holding the shared engine and runtime.
pub const SHARED_DIR: &str = "shared";

/// Run summary file written into the output root.
pub const REPORT_FILE: &str = "generation_report.json";

/// Absolute paths of everything the pipeline writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    /// Layout rooted at `root`, which should be absolute.
    pub fn new(root: PathBuf) -> Self { Self { root } }

    /// Output root.
    pub fn root(&self) -> &Path { &self.root }

    /// Directory holding every generated client.
    pub fn clients_dir(&self) -> PathBuf { self.root.join(CLIENTS_DIR) }

    /// Directory holding the shared engine and runtime.
    pub fn shared_dir(&self) -> PathBuf { self.clients_dir().join(SHARED_DIR) }

    /// Location of the shared runtime directory.
    pub fn shared_runtime_dir(&self) -> PathBuf { self.shared_dir().join(RUNTIME_DIR) }

    /// Location of the shared engine named `file_name`.
    pub fn shared_engine(&self, file_name: &str) -> PathBuf { self.shared_dir().join(file_name) }

    /// Directory a schema's client is generated into when the pipeline injects
    /// the output directive.
    pub fn default_client_dir(&self, schema_name: &str) -> PathBuf {
        self.clients_dir().join(schema_name)
    }

    /// Whether `dir` is the shared directory or lies inside it.
    pub fn is_shared(&self, dir: &Path) -> bool { path::is_same_or_ancestor(&self.shared_dir(), dir) }

    /// Location of the run summary.
    pub fn report_file(&self) -> PathBuf { self.root.join(REPORT_FILE) }

    /// Remove any previous output and recreate the shared directory.
    ///
    /// Refuses to delete the project root or any directory containing the
    /// schema input directory.
    pub fn prepare(&self, project_root: &Path, input_dir: &Path) -> Result<(), PipelineError> {
        if path::is_same_or_ancestor(&self.root, project_root) {
            return Err(PipelineError::UnsafeOutputDir {
                dir: self.root.clone(),
                reason: "it contains the project root".to_string(),
            });
        }
        if path::is_same_or_ancestor(&self.root, input_dir) {
            return Err(PipelineError::UnsafeOutputDir {
                dir: self.root.clone(),
                reason: "it contains the schema directory".to_string(),
            });
        }

        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|source| preparation_error(&self.root, source))?;
        }
        let shared = self.shared_dir();
        fs::create_dir_all(&shared).map_err(|source| preparation_error(&shared, source))?;
        Ok(())
    }
}

fn preparation_error(path: &Path, source: std::io::Error) -> PipelineError {
    PipelineError::ArtifactOperation {
        schema: "*".to_string(),
        stage: Stage::Preparation,
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_layout() {
        let layout = OutputLayout::new(PathBuf::from("/app/node_modules/prismany"));
        assert_eq!(layout.clients_dir(), PathBuf::from("/app/node_modules/prismany/clients"));
        assert_eq!(layout.shared_dir(), PathBuf::from("/app/node_modules/prismany/clients/shared"));
        assert_eq!(
            layout.shared_runtime_dir(),
            PathBuf::from("/app/node_modules/prismany/clients/shared/runtime")
        );
        assert_eq!(
            layout.default_client_dir("users"),
            PathBuf::from("/app/node_modules/prismany/clients/users")
        );
        assert_eq!(
            layout.report_file(),
            PathBuf::from("/app/node_modules/prismany/generation_report.json")
        );
    }

    #[test]
    fn shared_dir_and_its_contents_are_reserved() {
        let layout = OutputLayout::new(PathBuf::from("/app/node_modules/prismany"));
        assert!(layout.is_shared(&layout.default_client_dir("shared")));
        assert!(layout.is_shared(Path::new("/app/node_modules/prismany/clients/shared/runtime")));
        assert!(layout.is_shared(Path::new("/app/node_modules/prismany/clients/users/../shared")));
        assert!(!layout.is_shared(&layout.default_client_dir("users")));
        assert!(!layout.is_shared(&layout.default_client_dir("shared_orders")));
    }

    #[test]
    fn prepare_clears_previous_output() {
        let temp = tempfile::tempdir().expect("Failed to create temporary directory");
        let root = temp.path().join("out");
        fs::create_dir_all(root.join("clients/stale")).expect("Failed to create stale output");
        fs::write(root.join("index.js"), "stale").expect("Failed to write stale index");

        let layout = OutputLayout::new(root.clone());
        layout.prepare(temp.path(), &temp.path().join("prisma")).expect("prepare should succeed");

        assert!(layout.shared_dir().is_dir());
        assert!(!root.join("clients/stale").exists());
        assert!(!root.join("index.js").exists());
    }

    #[test]
    fn prepare_refuses_project_root() {
        let temp = tempfile::tempdir().expect("Failed to create temporary directory");
        let layout = OutputLayout::new(temp.path().to_path_buf());
        match layout.prepare(temp.path(), &temp.path().join("prisma")) {
            Err(PipelineError::UnsafeOutputDir { reason, .. }) => {
                assert!(reason.contains("project root"))
            }
            other => panic!("Expected UnsafeOutputDir, got {:?}", other),
        }
        assert!(temp.path().exists());
    }

    #[test]
    fn prepare_refuses_schema_ancestor() {
        let temp = tempfile::tempdir().expect("Failed to create temporary directory");
        let project = temp.path().join("project");
        let schemas = temp.path().join("shared/prisma");
        let layout = OutputLayout::new(temp.path().join("shared"));
        match layout.prepare(&project, &schemas) {
            Err(PipelineError::UnsafeOutputDir { reason, .. }) => {
                assert!(reason.contains("schema directory"))
            }
            other => panic!("Expected UnsafeOutputDir, got {:?}", other),
        }
    }
}
