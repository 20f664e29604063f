//! Aggregate entry modules.
//!
//! The output root carries two entry modules re-exporting every linked client
//! under its unique symbol: `index.ts` in ES module syntax and `index.js` in
//! CommonJS. Entries are accumulated in processing order; each new entry is
//! placed first, so the rendered export lists run in reverse processing order.

use std::fs;

use types::ClientSymbol;

use crate::layout::OutputLayout;
use crate::{PipelineError, Stage};

/// Syntax of an aggregate entry module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportDialect {
    /// `import {X} from '...'` and `export { X }`
    EsModule,
    /// `const {X} = require('...')` and `module.exports = { X }`
    CommonJs,
}

impl ExportDialect {
    /// File name of the entry module in the output root.
    pub fn file_name(&self) -> &'static str {
        match self {
            ExportDialect::EsModule => "index.ts",
            ExportDialect::CommonJs => "index.js",
        }
    }

    fn import_line(&self, entry: &IndexEntry) -> String {
        match self {
            ExportDialect::EsModule => format!("import {{{}}} from '{}';", entry.symbol, entry.module),
            ExportDialect::CommonJs =>
                format!("const {{{}}} = require('{}');", entry.symbol, entry.module),
        }
    }

    fn export_open(&self) -> &'static str {
        match self {
            ExportDialect::EsModule => "export {",
            ExportDialect::CommonJs => "module.exports = {",
        }
    }
}

/// One re-exported client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Exported symbol
    pub symbol: ClientSymbol,
    /// Module specifier of the client entry point, relative to the output root
    pub module: String,
}

/// Clients re-exported by the aggregate entry modules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateIndex {
    entries: Vec<IndexEntry>,
}

impl AggregateIndex {
    /// Empty index.
    pub fn new() -> Self { Self::default() }

    /// Record a linked client. Returns `false` if `symbol` is already present.
    pub fn insert(&mut self, symbol: ClientSymbol, module: String) -> bool {
        if self.contains(&symbol) {
            return false;
        }
        self.entries.push(IndexEntry { symbol, module });
        true
    }

    /// Whether `symbol` is already exported.
    pub fn contains(&self, symbol: &ClientSymbol) -> bool {
        self.entries.iter().any(|e| &e.symbol == symbol)
    }

    /// Number of exported clients.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether no client is exported.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Entries in processing order.
    pub fn entries(&self) -> &[IndexEntry] { &self.entries }

    /// Exported symbols in rendered order (most recently processed first).
    pub fn exports(&self) -> Vec<&ClientSymbol> {
        self.entries.iter().rev().map(|e| &e.symbol).collect()
    }

    /// Render the entry module in `dialect`.
    ///
    /// ```
    /// use pipeline::aggregate_index::{AggregateIndex, ExportDialect};
    /// use types::ClientSymbol;
    ///
    /// let mut index = AggregateIndex::new();
    /// index.insert(ClientSymbol::for_schema("Client", "users"), "./clients/users/index.js".into());
    /// assert_eq!(
    ///     index.render(ExportDialect::EsModule),
    ///     "import {ClientUsers} from './clients/users/index.js';\nexport {\n  ClientUsers,\n}\n"
    /// );
    /// ```
    pub fn render(&self, dialect: ExportDialect) -> String {
        let mut out = String::new();
        for entry in self.entries.iter().rev() {
            out.push_str(&dialect.import_line(entry));
            out.push('\n');
        }
        out.push_str(dialect.export_open());
        out.push('\n');
        for entry in self.entries.iter().rev() {
            out.push_str(&format!("  {},\n", entry.symbol));
        }
        out.push_str("}\n");
        out
    }

    /// Write both entry modules into the output root.
    pub fn write_all(&self, layout: &OutputLayout) -> Result<(), PipelineError> {
        for dialect in [ExportDialect::EsModule, ExportDialect::CommonJs] {
            let file = layout.root().join(dialect.file_name());
            fs::write(&file, self.render(dialect)).map_err(|source| {
                PipelineError::ArtifactOperation {
                    schema: "*".to_string(),
                    stage: Stage::Indexing,
                    path: file.clone(),
                    source,
                }
            })?;
        }
        Ok(())
    }
}
