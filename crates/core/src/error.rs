//! Error taxonomy for the optimization relay.
//!
//! Variants are ordered roughly by the stage that detects them. The `api`
//! crate maps each one to an HTTP status and a JSON error body.

/// Any failure a single optimization job can end in.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Malformed, oversized, or missing input. Detected before any job
    /// resources are allocated.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        details: Option<String>,
    },

    /// The scratch directory or the job input file could not be written.
    #[error("Workspace I/O error: {0}")]
    Workspace(#[source] std::io::Error),

    /// The engine entry point is missing from the deployment.
    #[error("Engine not found: {0}")]
    EngineNotFound(String),

    /// The engine entry point exists but could not be started.
    #[error("Failed to spawn engine: {0}")]
    EngineSpawn(#[source] std::io::Error),

    /// The engine exited with a non-zero exit code.
    #[error("Engine failed with exit code {exit_code}: {message}")]
    EngineExecution { exit_code: i32, message: String },

    /// The engine exceeded its wall-clock budget and was killed.
    #[error("Engine timed out after {elapsed_ms}ms")]
    EngineTimeout { elapsed_ms: u64 },

    /// Exit code 0 but no output file was written.
    #[error("Output file was not created")]
    OutputMissing,

    /// Exit code 0 but the output file holds only whitespace.
    #[error("Output file is empty")]
    OutputEmpty,

    /// The output file is not a well-formed result document.
    #[error("Failed to parse output: {reason}")]
    OutputParse {
        reason: String,
        /// Bounded excerpt of the file content.
        raw: String,
    },

    /// The output file exists but could not be read.
    #[error("Failed to read output: {0}")]
    OutputRead(#[source] std::io::Error),

    /// The engine wrote a well-formed document declaring failure.
    #[error("Engine reported failure: {error}")]
    EngineReported {
        error: String,
        traceback: Option<String>,
    },
}

impl RelayError {
    /// Validation failure with a message only.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: None,
        }
    }

    /// Validation failure with an additional human-readable explanation.
    pub fn validation_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Workspace(_) => "WORKSPACE_ERROR",
            Self::EngineNotFound(_) => "ENGINE_NOT_FOUND",
            Self::EngineSpawn(_) => "ENGINE_SPAWN_FAILED",
            Self::EngineExecution { .. } => "ENGINE_EXECUTION_FAILED",
            Self::EngineTimeout { .. } => "ENGINE_TIMEOUT",
            Self::OutputMissing => "OUTPUT_MISSING",
            Self::OutputEmpty => "OUTPUT_EMPTY",
            Self::OutputParse { .. } => "OUTPUT_PARSE_ERROR",
            Self::OutputRead(_) => "OUTPUT_READ_ERROR",
            Self::EngineReported { .. } => "ENGINE_REPORTED_ERROR",
        }
    }

    /// `true` when the caller sent a bad request; every other kind is a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
