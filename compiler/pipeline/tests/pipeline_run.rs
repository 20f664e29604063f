//! End-to-end runs of the pipeline against an in-process generator that writes
//! client fixtures shaped like `prisma generate` output.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::Config;
use pipeline::generator::{GeneratorError, GeneratorInvoker};
use pipeline::{run_with, PipelineError, RunSettings, Stage};
use regex::Regex;
use tempfile::TempDir;

const ENGINE: &str = "libquery_engine-debian-openssl-3.0.x.so.node";

const INDEX_JS: &str = r#"const {
  getPrismaClient,
} = require('./runtime/library.js')
const path = require('path')
const config = { dirname: __dirname }
path.join(__dirname, "libquery_engine-debian-openssl-3.0.x.so.node");
const PrismaClient = getPrismaClient(config)
exports.PrismaClient = PrismaClient
"#;

const INDEX_DTS: &str = "import * as runtime from './runtime/library.js';
export class PrismaClient<T = {}> {}
export type DefaultPrismaClient = PrismaClient
";

const LIBRARY_JS: &str = "let r={binary:process.env.PRISMA_QUERY_ENGINE_BINARY,library:process.env.PRISMA_QUERY_ENGINE_LIBRARY}[e]??t.prismaPath;load(r);";

fn schema(name: &str) -> String {
    format!(
        "generator client {{\n  provider = \"prisma-client-js\"\n}}\n\nmodel {} {{\n  id Int @id\n}}\n",
        name
    )
}

/// Writes a client where the schema's output directive points and reports it.
struct FakeGenerator {
    project_root: PathBuf,
    malformed_output: HashSet<String>,
    missing_class: HashSet<String>,
    timing_out: HashSet<String>,
    calls: RefCell<Vec<Option<PathBuf>>>,
}

impl FakeGenerator {
    fn new(project_root: &Path) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            malformed_output: HashSet::new(),
            missing_class: HashSet::new(),
            timing_out: HashSet::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn write_client(&self, dir: &Path, schema_name: &str) {
        fs::create_dir_all(dir.join("runtime")).expect("Failed to create client dir");
        fs::write(dir.join(ENGINE), "engine").expect("Failed to write engine");
        fs::write(dir.join("runtime/library.js"), LIBRARY_JS).expect("Failed to write runtime");
        fs::write(dir.join("index.js"), INDEX_JS).expect("Failed to write index.js");
        let dts = if self.missing_class.contains(schema_name) {
            "export declare const PrismaClient: any;\n".to_string()
        } else {
            INDEX_DTS.to_string()
        };
        fs::write(dir.join("index.d.ts"), dts).expect("Failed to write index.d.ts");
    }
}

impl GeneratorInvoker for FakeGenerator {
    fn generate(&self, schema: Option<&Path>) -> Result<String, GeneratorError> {
        self.calls.borrow_mut().push(schema.map(Path::to_path_buf));
        let Some(schema) = schema else {
            return Ok("✔ Generated Prisma Client (v5.7.0) to ./node_modules/@prisma/client in 40ms\n"
                .to_string());
        };

        let schema_path = self.project_root.join(schema);
        let name = schema_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .expect("schema has a file name");
        if self.timing_out.contains(&name) {
            return Err(GeneratorError::TimedOut(Duration::from_secs(120)));
        }
        if self.malformed_output.contains(&name) {
            return Ok("Prisma schema loaded\nsomething went sideways\n".to_string());
        }

        let source = fs::read_to_string(&schema_path).expect("Failed to read schema");
        let output = Regex::new(r#"output\s*=\s*"([^"]*)""#)
            .expect("valid regex")
            .captures(&source)
            .map(|caps| caps[1].to_string())
            .expect("schema declares an output directory");
        let dir = path::absolutize(schema_path.parent().expect("schema has a parent"), Path::new(&output));
        self.write_client(&dir, &name);

        let reported = path::relative_path(&self.project_root, &dir).expect("relative path");
        Ok(format!(
            "Prisma schema loaded from {}\n\n✔ Generated Prisma Client (v5.7.0) to ./{} in 62ms\n",
            schema.display(),
            path::to_slash(&reported)
        ))
    }
}

fn project(schemas: &[(&str, String)]) -> (TempDir, RunSettings) {
    let temp = tempfile::tempdir().expect("Failed to create temporary directory");
    let prisma = temp.path().join("prisma");
    fs::create_dir_all(&prisma).expect("Failed to create schema dir");
    for (file, contents) in schemas {
        fs::write(prisma.join(file), contents).expect("Failed to write schema");
    }

    let mut config = Config::default();
    config.output.client_prefix = "Client".to_string();
    let settings = RunSettings::from_config(&config, temp.path().to_path_buf());
    (temp, settings)
}

fn read(path: PathBuf) -> String {
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

#[test]
fn links_every_client_against_shared_artifacts() {
    let (temp, settings) = project(&[
        ("schema.prisma", schema("Main")),
        ("users.prisma", schema("User")),
        ("orders.prisma", schema("Order")),
        ("README.md", "not a schema".to_string()),
    ]);
    let generator = FakeGenerator::new(temp.path());

    let report = run_with(&settings, &generator).expect("run succeeds");
    assert_eq!(report.generated, 3);
    assert!(report.primary_generated);
    assert!(report.skipped.is_empty());

    // File name order; the primary schema runs without a schema argument
    let calls = generator.calls.borrow();
    assert_eq!(
        *calls,
        vec![
            Some(PathBuf::from("prisma/orders.prisma")),
            None,
            Some(PathBuf::from("prisma/users.prisma")),
        ]
    );

    for name in ["users", "orders"] {
        let source = read(temp.path().join(format!("prisma/{}.prisma", name)));
        assert!(source.contains(&format!("output = \"../node_modules/prismany/clients/{}\"", name)));
    }

    let out = temp.path().join("node_modules/prismany");
    let shared = out.join("clients/shared");
    let engines: Vec<_> = fs::read_dir(&shared)
        .expect("Failed to list shared dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".node"))
        .collect();
    assert_eq!(engines.len(), 1);
    assert!(read(shared.join("runtime/library.js")).contains(&format!(
        "let r='node_modules/prismany/clients/shared/{}';",
        ENGINE
    )));

    for (name, symbol) in [("users", "ClientUsers"), ("orders", "ClientOrders")] {
        let dir = out.join("clients").join(name);
        assert!(!dir.join("runtime").exists());
        assert!(!dir.join(ENGINE).exists());
        let index = read(dir.join("index.js"));
        assert!(index.contains("require('../shared/runtime/library.js')"));
        assert!(index.contains(&format!("path.join(__dirname, \"../shared/{}\")", ENGINE)));
        assert!(index.contains(&format!("exports.{0} = {0}", symbol)));
        assert!(read(dir.join("index.d.ts")).contains(&format!("export class {}<", symbol)));
    }

    let exports: Vec<&str> = report.exports.iter().map(|s| s.as_str()).collect();
    assert_eq!(exports, vec!["ClientUsers", "ClientOrders"]);
    assert_eq!(
        read(out.join("index.ts")),
        "import {ClientUsers} from './clients/users/index.js';\n\
         import {ClientOrders} from './clients/orders/index.js';\n\
         export {\n  ClientUsers,\n  ClientOrders,\n}\n"
    );
    assert!(read(out.join("index.js")).contains("module.exports = {\n  ClientUsers,\n  ClientOrders,\n}"));

    let json: serde_json::Value =
        serde_json::from_str(&read(out.join("generation_report.json"))).expect("report is JSON");
    assert_eq!(json["generated"], 3);
    assert_eq!(json["clients"].as_array().map(|c| c.len()), Some(2));
}

#[test]
fn schema_without_generator_block_is_skipped() {
    let (temp, settings) = project(&[
        ("broken.prisma", "model Orphan {\n  id Int @id\n}\n".to_string()),
        ("users.prisma", schema("User")),
    ]);
    let generator = FakeGenerator::new(temp.path());

    let report = run_with(&settings, &generator).expect("run succeeds");
    assert_eq!(report.generated, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].schema, "broken");
    assert_eq!(report.skipped[0].stage, Some(Stage::Injection));
    assert_eq!(generator.calls.borrow().len(), 1);
    assert_eq!(read(temp.path().join("prisma/broken.prisma")), "model Orphan {\n  id Int @id\n}\n");

    let exports: Vec<&str> = report.exports.iter().map(|s| s.as_str()).collect();
    assert_eq!(exports, vec!["ClientUsers"]);
}

#[test]
fn unparseable_generator_output_is_skipped() {
    let (temp, settings) = project(&[
        ("orders.prisma", schema("Order")),
        ("users.prisma", schema("User")),
    ]);
    let mut generator = FakeGenerator::new(temp.path());
    generator.malformed_output.insert("orders".to_string());

    let report = run_with(&settings, &generator).expect("run succeeds");
    assert_eq!(report.generated, 1);
    assert_eq!(report.skipped[0].schema, "orders");
    assert_eq!(report.skipped[0].stage, Some(Stage::Location));

    // The first linked client still provides the shared artifacts
    let shared = temp.path().join("node_modules/prismany/clients/shared");
    assert!(shared.join(ENGINE).is_file());
    assert!(shared.join("runtime/library.js").is_file());
    assert!(!read(temp.path().join("node_modules/prismany/index.ts")).contains("ClientOrders"));
}

#[test]
fn generator_failure_skips_schema_and_run_continues() {
    let (temp, settings) = project(&[
        ("orders.prisma", schema("Order")),
        ("schema.prisma", schema("Main")),
        ("users.prisma", schema("User")),
    ]);
    let mut generator = FakeGenerator::new(temp.path());
    generator.timing_out.insert("orders".to_string());

    let report = run_with(&settings, &generator).expect("run succeeds");
    assert_eq!(generator.calls.borrow().len(), 3);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].schema, "orders");
    assert_eq!(report.skipped[0].stage, Some(Stage::Generation));
    assert!(report.skipped[0].reason.contains("timed out"));

    // Primary plus users
    assert_eq!(report.generated, 2);
    let exports: Vec<&str> = report.exports.iter().map(|s| s.as_str()).collect();
    assert_eq!(exports, vec!["ClientUsers"]);
    let shared = temp.path().join("node_modules/prismany/clients/shared");
    assert!(shared.join(ENGINE).is_file());
    assert!(!temp.path().join("node_modules/prismany/clients/users/runtime").exists());
}

#[cfg(target_os = "linux")]
#[test]
fn colliding_client_symbol_is_skipped_before_generation() {
    let (temp, settings) = project(&[
        ("Users.prisma", schema("Account")),
        ("users.prisma", schema("User")),
    ]);
    let generator = FakeGenerator::new(temp.path());

    let report = run_with(&settings, &generator).expect("run succeeds");
    assert_eq!(*generator.calls.borrow(), vec![Some(PathBuf::from("prisma/Users.prisma"))]);
    assert_eq!(report.generated, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].schema, "users");
    assert_eq!(report.skipped[0].stage, Some(Stage::Injection));
    assert!(report.skipped[0].reason.contains("ClientUsers is already used"));
    assert_eq!(read(temp.path().join("prisma/users.prisma")), schema("User"));
}

#[test]
fn schema_named_shared_cannot_clobber_shared_artifacts() {
    let (temp, settings) = project(&[
        ("orders.prisma", schema("Order")),
        ("shared.prisma", schema("Shared")),
    ]);
    let generator = FakeGenerator::new(temp.path());

    let report = run_with(&settings, &generator).expect("run succeeds");
    assert_eq!(*generator.calls.borrow(), vec![Some(PathBuf::from("prisma/orders.prisma"))]);
    assert_eq!(report.generated, 1);
    assert_eq!(report.skipped[0].schema, "shared");
    assert_eq!(report.skipped[0].stage, Some(Stage::Injection));
    assert_eq!(read(temp.path().join("prisma/shared.prisma")), schema("Shared"));

    let shared = temp.path().join("node_modules/prismany/clients/shared");
    assert!(shared.join(ENGINE).is_file());
    assert!(shared.join("runtime/library.js").is_file());
}

#[test]
fn rerun_keeps_injected_directive() {
    let (temp, settings) = project(&[("users.prisma", schema("User"))]);

    run_with(&settings, &FakeGenerator::new(temp.path())).expect("first run succeeds");
    let after_first = read(temp.path().join("prisma/users.prisma"));
    run_with(&settings, &FakeGenerator::new(temp.path())).expect("second run succeeds");

    assert_eq!(read(temp.path().join("prisma/users.prisma")), after_first);
    assert_eq!(after_first.matches("output =").count(), 1);
}

#[test]
fn missing_patch_anchor_aborts_run() {
    let (temp, settings) = project(&[
        ("orders.prisma", schema("Order")),
        ("users.prisma", schema("User")),
    ]);
    let mut generator = FakeGenerator::new(temp.path());
    generator.missing_class.insert("orders".to_string());

    match run_with(&settings, &generator) {
        Err(PipelineError::PatchPatternNotFound { schema, stage, patch, .. }) => {
            assert_eq!(schema, "orders");
            assert_eq!(stage, Stage::Rewriting);
            assert_eq!(patch, "client-class");
        }
        other => panic!("Expected PatchPatternNotFound, got {:?}", other),
    }
    // Neither client file is written when one of them lacks an anchor
    let orders_index = read(temp.path().join("node_modules/prismany/clients/orders/index.js"));
    assert!(orders_index.contains("exports.PrismaClient = PrismaClient"));
    assert!(orders_index.contains("require('./runtime/library.js')"));
    // users.prisma is never reached
    assert_eq!(generator.calls.borrow().len(), 1);
    assert!(!temp.path().join("node_modules/prismany/clients/users").exists());
}

#[test]
fn empty_schema_directory_writes_empty_index() {
    let (temp, settings) = project(&[]);
    let report = run_with(&settings, &FakeGenerator::new(temp.path())).expect("run succeeds");
    assert_eq!(report.generated, 0);
    assert_eq!(read(temp.path().join("node_modules/prismany/index.ts")), "export {\n}\n");
    assert_eq!(read(temp.path().join("node_modules/prismany/index.js")), "module.exports = {\n}\n");
}
