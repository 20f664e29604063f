//! Client location from generator output.
//!
//! The generator reports where it wrote the client in a line such as
//! `✔ Generated Prisma Client (v5.7.0) to ./node_modules/prismany/clients/users in 62ms`.
//! The path between the `to` marker and the trailing duration is the only
//! thing the pipeline relies on from the generator's log.

use std::path::{Path, PathBuf};

use regex::Regex;

/// Captures the reported location between `to ` and ` in <N>ms`.
const GENERATED_TO_PATTERN: &str = r"\bto\s(.+?)\sin\s[\d.]+m?s\b";

/// Extract the reported client location from generator `output`.
///
/// Returns `Ok(None)` when the output does not contain the report line.
pub fn reported_client_path(output: &str) -> Result<Option<String>, regex::Error> {
    let re = Regex::new(GENERATED_TO_PATTERN)?;
    Ok(re.captures(output).map(|caps| caps[1].trim().to_string()))
}

/// Resolve a reported location against the generator's working directory.
pub fn resolve_client_dir(working_dir: &Path, reported: &str) -> PathBuf {
    path::absolutize(working_dir, Path::new(reported))
}
