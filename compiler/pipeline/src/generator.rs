//! Generator invocation.
//!
//! The code generator is an external collaborator: given a schema it writes a
//! client somewhere and prints a log saying where. [`GeneratorInvoker`] is the
//! seam the pipeline calls through; [`CommandGenerator`] runs the configured
//! command (by default `npx prisma generate`).

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use config::GeneratorConfig;
use thiserror::Error;
use tracing::debug;
use wait_timeout::ChildExt;

/// Errors raised while running the generator for one schema.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// The program could not be found on `PATH`.
    #[error("generator program '{program}' not found: {source}")]
    NotFound {
        /// Configured program
        program: String,
        /// Lookup error
        #[source]
        source: which::Error,
    },
    /// The program could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        /// Resolved program path
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The program exited unsuccessfully.
    #[error("generator exited with {status}: {output}")]
    Failed {
        /// Exit status
        status: ExitStatus,
        /// Everything the generator printed
        output: String,
    },
    /// The program ran longer than the configured timeout and was killed.
    #[error("generator timed out after {0:?}")]
    TimedOut(Duration),
    /// Reading the generator's output failed.
    #[error("failed to read generator output: {0}")]
    Io(#[from] std::io::Error),
}

/// Runs the code generator.
pub trait GeneratorInvoker {
    /// Generate the client for `schema`, or for the generator's default schema
    /// when `schema` is `None`.
    ///
    /// # Returns
    ///
    /// Returns everything the generator printed.
    fn generate(&self, schema: Option<&Path>) -> Result<String, GeneratorError>;
}

/// Runs the configured generator command as a child process.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args: Vec<String>,
    schema_flag: String,
    working_dir: PathBuf,
    timeout: Option<Duration>,
}

impl CommandGenerator {
    /// Create a generator running `config` from `working_dir`.
    pub fn from_config(config: &GeneratorConfig, working_dir: PathBuf) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            schema_flag: config.schema_flag.clone(),
            working_dir,
            timeout: config.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Arguments for one invocation.
    pub fn arguments(&self, schema: Option<&Path>) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(schema) = schema {
            args.push(self.schema_flag.clone());
            args.push(schema.to_string_lossy().into_owned());
        }
        args
    }

    fn resolve_program(&self) -> Result<PathBuf, GeneratorError> {
        which::which_in(&self.program, std::env::var_os("PATH"), &self.working_dir).map_err(
            |source| GeneratorError::NotFound { program: self.program.clone(), source },
        )
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, GeneratorError> {
        match self.timeout {
            None => Ok(child.wait()?),
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => Ok(status),
                None => {
                    let _ = child.kill();
                    let _ = child.wait();
                    Err(GeneratorError::TimedOut(timeout))
                }
            },
        }
    }
}

impl GeneratorInvoker for CommandGenerator {
    fn generate(&self, schema: Option<&Path>) -> Result<String, GeneratorError> {
        let program = self.resolve_program()?;
        let args = self.arguments(schema);
        debug!("Running {} {}", program.display(), args.join(" "));

        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| GeneratorError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        // Drain both pipes concurrently so a chatty generator cannot block on a full pipe
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let waited = self.wait(&mut child);
        let output = format!("{}{}", collect(stdout)?, collect(stderr)?);
        let status = waited?;

        if !status.success() {
            return Err(GeneratorError::Failed { status, output });
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<std::io::Result<String>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    })
}

fn collect(handle: Option<JoinHandle<std::io::Result<String>>>) -> std::io::Result<String> {
    match handle {
        None => Ok(String::new()),
        Some(handle) => handle.join().unwrap_or_else(|_| {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "output reader panicked"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator(program: &str, args: &[&str], timeout_secs: Option<u64>) -> CommandGenerator {
        let config = GeneratorConfig {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            schema_flag: "--schema".to_string(),
            timeout_secs,
        };
        CommandGenerator::from_config(&config, std::env::temp_dir())
    }

    #[test]
    fn arguments_append_schema_flag() {
        let gen = generator("npx", &["prisma", "generate"], None);
        assert_eq!(gen.arguments(None), vec!["prisma", "generate"]);
        assert_eq!(
            gen.arguments(Some(Path::new("prisma/users.prisma"))),
            vec!["prisma", "generate", "--schema", "prisma/users.prisma"]
        );
    }

    #[test]
    fn unknown_program_is_not_found() {
        let gen = generator("prismany-definitely-missing-generator", &[], None);
        match gen.generate(None) {
            Err(GeneratorError::NotFound { program, .. }) => {
                assert_eq!(program, "prismany-definitely-missing-generator")
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_and_stderr() {
        let gen = generator("sh", &["-c", "echo to-stdout; echo to-stderr >&2"], None);
        let output = gen.generate(None).expect("sh should succeed");
        assert!(output.contains("to-stdout"));
        assert!(output.contains("to-stderr"));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_failure() {
        let gen = generator("sh", &["-c", "echo boom >&2; exit 3"], None);
        match gen.generate(None) {
            Err(GeneratorError::Failed { status, output }) => {
                assert_eq!(status.code(), Some(3));
                assert!(output.contains("boom"));
            }
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn slow_generator_times_out() {
        let gen = generator("sh", &["-c", "exec sleep 5"], Some(1));
        match gen.generate(None) {
            Err(GeneratorError::TimedOut(timeout)) => assert_eq!(timeout, Duration::from_secs(1)),
            other => panic!("Expected TimedOut, got {:?}", other),
        }
    }
}
