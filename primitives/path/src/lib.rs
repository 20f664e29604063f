// SPDX-License-Identifier: CC0-1.0

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Path utility functions for locating project files and linking generated code.
//!
//! This module provides utilities for walking up to a marker file, making paths
//! absolute without touching the filesystem, computing relative paths between
//! generated directories, and rendering them as JavaScript module specifiers.

pub mod path_utils;

// Re-export for convenience
pub use path_utils::*;
