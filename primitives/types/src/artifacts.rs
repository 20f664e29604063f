/// Name the generator gives the client class and its exports.
pub const DEFAULT_CLIENT_NAME: &str = "PrismaClient";

/// File name stem of the native query engine library.
///
/// Unix builds prefix it with `lib` (`libquery_engine-darwin-arm64.dylib.node`),
/// Windows builds do not (`query_engine-windows.dll.node`).
pub const ENGINE_FILE_STEM: &str = "query_engine-";

/// File name suffix shared by every platform's query engine library.
pub const ENGINE_FILE_SUFFIX: &str = ".node";

/// Runtime support directory inside a generated client.
pub const RUNTIME_DIR: &str = "runtime";

/// Runtime module that resolves the query engine path at startup.
pub const RUNTIME_LIBRARY_FILE: &str = "library.js";

/// CommonJS entry point of a generated client.
pub const CLIENT_INDEX_FILE: &str = "index.js";

/// Type declarations of a generated client.
pub const CLIENT_TYPES_FILE: &str = "index.d.ts";

/// Returns `true` when `file_name` names a query engine library.
///
/// ```
/// use types::artifacts::is_engine_file;
/// assert!(is_engine_file("libquery_engine-debian-openssl-3.0.x.so.node"));
/// assert!(is_engine_file("libquery_engine-darwin-arm64.dylib.node"));
/// assert!(is_engine_file("query_engine-windows.dll.node"));
/// assert!(!is_engine_file("libquery_engine-darwin-arm64.dylib.node.tmp"));
/// assert!(!is_engine_file("index.js"));
/// ```
pub fn is_engine_file(file_name: &str) -> bool {
    let unprefixed = file_name.strip_prefix("lib").unwrap_or(file_name);
    unprefixed.starts_with(ENGINE_FILE_STEM) && file_name.ends_with(ENGINE_FILE_SUFFIX)
}
