//! Anchored text patches over generated files.
//!
//! Generated code is linked by rewriting known expressions in it. Each rewrite
//! is a [`Patch`]: a named anchor pattern, the replacement, and whether the
//! anchor must be present. A [`PatchSet`] applies its patches in order and
//! stops at the first required anchor that does not match, so a generator
//! release that changes its output shape is caught instead of producing a
//! half-rewritten file.

use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::{PipelineError, Stage};

/// Whether a patch's anchor must be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Missing anchor is an error.
    Required,
    /// Missing anchor leaves the text unchanged.
    Optional,
}

/// One anchored rewrite.
#[derive(Debug, Clone)]
pub struct Patch {
    name: &'static str,
    anchor: Regex,
    replacement: String,
    requirement: Requirement,
}

impl Patch {
    /// Create a patch replacing every match of `anchor` with `replacement`.
    ///
    /// `replacement` uses the `regex` expansion syntax (`$1`, `${name}`); pass
    /// literal text through [`escape_replacement`].
    pub fn new(
        name: &'static str,
        anchor: &str,
        replacement: impl Into<String>,
        requirement: Requirement,
    ) -> Result<Self, regex::Error> {
        Ok(Self { name, anchor: Regex::new(anchor)?, replacement: replacement.into(), requirement })
    }

    /// Patch name, used in diagnostics.
    pub fn name(&self) -> &'static str { self.name }

    /// Whether the anchor must be found.
    pub fn requirement(&self) -> Requirement { self.requirement }
}

/// Outcome of applying a [`PatchSet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patched {
    /// Rewritten text
    pub text: String,
    /// Number of replacements per patch, in application order
    pub applied: Vec<(&'static str, usize)>,
}

/// A required anchor did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingAnchor {
    /// Name of the patch whose anchor was not found
    pub patch: &'static str,
}

/// Ordered list of patches applied to one file.
#[derive(Debug, Clone, Default)]
pub struct PatchSet {
    patches: Vec<Patch>,
}

impl PatchSet {
    /// Create an empty patch set.
    pub fn new() -> Self { Self::default() }

    /// Append a patch.
    pub fn with(mut self, patch: Patch) -> Self {
        self.patches.push(patch);
        self
    }

    /// Patches in application order.
    pub fn patches(&self) -> &[Patch] { &self.patches }

    /// Apply every patch to `text` in order.
    pub fn apply(&self, text: &str) -> Result<Patched, MissingAnchor> {
        let mut current = text.to_string();
        let mut applied = Vec::with_capacity(self.patches.len());
        for patch in &self.patches {
            let count = patch.anchor.find_iter(&current).count();
            if count == 0 && patch.requirement == Requirement::Required {
                return Err(MissingAnchor { patch: patch.name });
            }
            if count > 0 {
                current = patch.anchor.replace_all(&current, patch.replacement.as_str()).into_owned();
            }
            applied.push((patch.name, count));
        }
        Ok(Patched { text: current, applied })
    }

    /// Read `file`, apply the patches and write the result back.
    ///
    /// Nothing is written when a required anchor is missing.
    pub fn apply_to_file(
        &self,
        file: &Path,
        schema: &str,
        stage: Stage,
    ) -> Result<Patched, PipelineError> {
        self.stage_file(file, schema, stage)?.commit()
    }

    /// Read `file` and apply the patches in memory, without writing anything.
    ///
    /// Staging every file of a client before committing any of them keeps a
    /// missing anchor in one file from leaving the others rewritten.
    pub fn stage_file(
        &self,
        file: &Path,
        schema: &str,
        stage: Stage,
    ) -> Result<StagedFile, PipelineError> {
        let original = fs::read_to_string(file).map_err(|source| PipelineError::ArtifactOperation {
            schema: schema.to_string(),
            stage,
            path: file.to_path_buf(),
            source,
        })?;
        let patched = self.apply(&original).map_err(|missing| {
            PipelineError::PatchPatternNotFound {
                schema: schema.to_string(),
                stage,
                file: file.to_path_buf(),
                patch: missing.patch,
            }
        })?;
        Ok(StagedFile { file: file.to_path_buf(), schema: schema.to_string(), stage, patched })
    }
}

/// Patched contents of one file, not yet written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    file: PathBuf,
    schema: String,
    stage: Stage,
    patched: Patched,
}

impl StagedFile {
    /// File the contents belong to.
    pub fn file(&self) -> &Path { &self.file }

    /// Write the patched contents back to the file.
    pub fn commit(self) -> Result<Patched, PipelineError> {
        fs::write(&self.file, &self.patched.text).map_err(|source| {
            PipelineError::ArtifactOperation {
                schema: self.schema.clone(),
                stage: self.stage,
                path: self.file.clone(),
                source,
            }
        })?;

        for (name, count) in &self.patched.applied {
            logging::trace(
                "patch",
                &format!(
                    "{}: {} replaced {} occurrence(s) in {}",
                    self.schema,
                    name,
                    count,
                    self.file.display()
                ),
            );
        }
        Ok(self.patched)
    }
}

/// Escape `$` so `text` is inserted literally by a replacement.
///
/// ```
/// use pipeline::patch::escape_replacement;
/// assert_eq!(escape_replacement("a$b"), "a$$b");
/// assert_eq!(escape_replacement("../shared/runtime"), "../shared/runtime");
/// ```
pub fn escape_replacement(text: &str) -> String { text.replace('$', "$$") }

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> PatchSet {
        PatchSet::new()
            .with(Patch::new("greeting", r"hello", "goodbye", Requirement::Required).expect("valid"))
            .with(Patch::new("name", r"world(\d)", "planet-$1", Requirement::Optional).expect("valid"))
    }

    #[test]
    fn applies_in_order_and_counts() {
        let patched = set().apply("hello world1, hello world2").expect("anchors present");
        assert_eq!(patched.text, "goodbye planet-1, goodbye planet-2");
        assert_eq!(patched.applied, vec![("greeting", 2), ("name", 2)]);
    }

    #[test]
    fn optional_anchor_may_be_missing() {
        let patched = set().apply("hello there").expect("required anchor present");
        assert_eq!(patched.text, "goodbye there");
        assert_eq!(patched.applied, vec![("greeting", 1), ("name", 0)]);
    }

    #[test]
    fn required_anchor_missing_fails() {
        assert_eq!(set().apply("hi world1"), Err(MissingAnchor { patch: "greeting" }));
    }

    #[test]
    fn escaped_replacement_is_literal() {
        let set = PatchSet::new().with(
            Patch::new("path", r"PATH", escape_replacement("/tmp/$HOME/x"), Requirement::Required)
                .expect("valid"),
        );
        assert_eq!(set.apply("at PATH").expect("anchor present").text, "at /tmp/$HOME/x");
    }

    #[test]
    fn file_is_untouched_when_anchor_missing() {
        let temp = tempfile::tempdir().expect("Failed to create temporary directory");
        let file = temp.path().join("index.js");
        fs::write(&file, "const Other = 1;").expect("Failed to write fixture");

        match set().apply_to_file(&file, "users", Stage::Rewriting) {
            Err(PipelineError::PatchPatternNotFound { schema, patch, .. }) => {
                assert_eq!(schema, "users");
                assert_eq!(patch, "greeting");
            }
            other => panic!("Expected PatchPatternNotFound, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&file).expect("Failed to read"), "const Other = 1;");
    }

    #[test]
    fn missing_file_is_artifact_error() {
        let temp = tempfile::tempdir().expect("Failed to create temporary directory");
        match set().apply_to_file(&temp.path().join("absent.js"), "users", Stage::Rewriting) {
            Err(PipelineError::ArtifactOperation { stage, .. }) => assert_eq!(stage, Stage::Rewriting),
            other => panic!("Expected ArtifactOperation, got {:?}", other),
        }
    }
}
