//! External optimization engine bridge.
//!
//! The engine is an opaque program invoked as
//! `<engine> <input-path> <output-path>` (optionally through an
//! interpreter). It reads the job document from the first path and writes
//! its result document to the second. This module starts it safely, waits
//! for it, and classifies how it exited.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::subprocess;
use crate::error::RelayError;

/// Fallback message when the engine fails without writing to stderr.
pub const GENERIC_ENGINE_FAILURE: &str = "Engine process exited with an error";

/// Conventional `SomethingError: message` line in engine stderr.
static ERROR_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Error[^:]*:\s*([^\n]+)").expect("valid regex"));

/// Arguments for a single engine run.
#[derive(Debug, Clone)]
pub struct EngineInvocation {
    /// Job input document, passed as the first argument.
    pub input_path: PathBuf,
    /// Where the engine must write its result, passed as the second argument.
    pub output_path: PathBuf,
    /// Maximum wall-clock time before the process is killed.
    pub timeout: Duration,
}

/// Captured output from an engine run.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Starts an engine entry point for one invocation.
///
/// Implementations verify the entry point before spawning and return
/// [`RelayError::EngineNotFound`] without starting anything when it is
/// missing. A non-zero exit code is *not* an error at this level.
pub trait EngineExecutor: Send + Sync {
    fn execute(
        &self,
        engine_path: &Path,
        invocation: EngineInvocation,
    ) -> impl std::future::Future<Output = Result<EngineOutput, RelayError>> + Send;
}

/// Runs a script through an interpreter: `<interpreter> <script> <in> <out>`.
pub struct InterpretedExecutor {
    interpreter: String,
}

impl InterpretedExecutor {
    pub fn new(interpreter: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl EngineExecutor for InterpretedExecutor {
    async fn execute(
        &self,
        engine_path: &Path,
        invocation: EngineInvocation,
    ) -> Result<EngineOutput, RelayError> {
        let is_file = tokio::fs::metadata(engine_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(RelayError::EngineNotFound(engine_path.display().to_string()));
        }

        let mut cmd = tokio::process::Command::new(&self.interpreter);
        cmd.arg(engine_path)
            .arg(&invocation.input_path)
            .arg(&invocation.output_path);
        subprocess::run_command(&mut cmd, invocation.timeout).await
    }
}

/// Runs a pre-compiled executable directly: `<engine> <in> <out>`.
pub struct BinaryExecutor;

impl EngineExecutor for BinaryExecutor {
    async fn execute(
        &self,
        engine_path: &Path,
        invocation: EngineInvocation,
    ) -> Result<EngineOutput, RelayError> {
        let metadata = tokio::fs::metadata(engine_path)
            .await
            .map_err(|_| RelayError::EngineNotFound(engine_path.display().to_string()))?;
        if !metadata.is_file() {
            return Err(RelayError::EngineNotFound(engine_path.display().to_string()));
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = metadata.permissions().mode();
            if mode & 0o111 == 0 {
                return Err(RelayError::EngineSpawn(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("{} is not executable (mode {mode:#o})", engine_path.display()),
                )));
            }
        }

        let mut cmd = tokio::process::Command::new(engine_path);
        cmd.arg(&invocation.input_path).arg(&invocation.output_path);
        subprocess::run_command(&mut cmd, invocation.timeout).await
    }
}

/// How the engine entry point is started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineRuntime {
    /// Pass the entry point to an interpreter such as `python3`.
    Interpreted { interpreter: String },
    /// Execute the entry point directly.
    Binary,
}

/// A configured engine: entry point, runtime, and time budget.
#[derive(Debug, Clone)]
pub struct Engine {
    path: PathBuf,
    runtime: EngineRuntime,
    timeout: Duration,
}

impl Engine {
    pub fn new(path: impl Into<PathBuf>, runtime: EngineRuntime, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            runtime,
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether the entry point is currently present on disk.
    pub async fn is_available(&self) -> bool {
        tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Run the engine once against a job's files and classify the exit.
    ///
    /// Returns the captured output only when the engine exited with code 0.
    pub async fn invoke(&self, input_path: &Path, output_path: &Path) -> Result<EngineOutput, RelayError> {
        let invocation = EngineInvocation {
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
            timeout: self.timeout,
        };

        let output = match &self.runtime {
            EngineRuntime::Interpreted { interpreter } => {
                InterpretedExecutor::new(interpreter.as_str())
                    .execute(&self.path, invocation)
                    .await?
            }
            EngineRuntime::Binary => BinaryExecutor.execute(&self.path, invocation).await?,
        };

        if !output.stdout.is_empty() {
            tracing::debug!(stdout = %output.stdout.trim_end(), "Engine stdout");
        }
        if !output.stderr.is_empty() {
            tracing::debug!(stderr = %output.stderr.trim_end(), "Engine stderr");
        }
        tracing::info!(
            exit_code = output.exit_code,
            duration_ms = output.duration_ms,
            "Engine process exited"
        );

        classify_exit(output)
    }
}

/// Turn a non-zero exit into [`RelayError::EngineExecution`].
pub fn classify_exit(output: EngineOutput) -> Result<EngineOutput, RelayError> {
    if output.exit_code == 0 {
        return Ok(output);
    }

    let message = extract_error_message(&output.stderr).unwrap_or_else(|| {
        let raw = output.stderr.trim();
        if raw.is_empty() {
            GENERIC_ENGINE_FAILURE.to_string()
        } else {
            raw.to_string()
        }
    });

    Err(RelayError::EngineExecution {
        exit_code: output.exit_code,
        message,
    })
}

/// Pull the message out of the first `...Error...: message` line.
pub fn extract_error_message(stderr: &str) -> Option<String> {
    ERROR_LINE_RE
        .captures(stderr)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
