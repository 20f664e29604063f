#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Core types shared by the Prismany crates.
//!
//! This crate defines the data model of a generation run: which schemas were
//! discovered and how each one is treated, the collision-free symbol every
//! post-processed client is exported under, and the names of the artifacts
//! the Prisma generator is known to emit.

/// Names of files and directories produced by `prisma generate`.
///
/// The post-generation pipeline relies on these to find the native query
/// engine, the runtime directory and the client entry points inside each
/// generated client directory.
pub mod artifacts;
/// Schema discovery results and loaded schema sources.
pub mod schema;
/// Unique client symbol names.
pub mod symbol;

pub use schema::{DiscoveredSchema, SchemaDescriptor, SchemaKind};
pub use symbol::ClientSymbol;
