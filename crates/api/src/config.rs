use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use recombyne_core::optimization::engine::{Engine, EngineRuntime};
use recombyne_core::optimization::workspace::DEFAULT_SCRATCH_SUBDIR;

/// Error raised when an environment variable holds an unusable value.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be a valid {expected}, got {value:?}")]
pub struct ConfigError {
    pub var: &'static str,
    pub expected: &'static str,
    pub value: String,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3001`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `330`). Kept above the
    /// engine timeout so engine failures are reported, not cut off.
    pub request_timeout_secs: u64,
    /// How long to wait for in-flight requests after a shutdown signal
    /// (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Maximum accepted request body size in bytes (default: 10 MiB).
    pub body_limit_bytes: usize,
    /// External optimization engine settings.
    pub engine: EngineConfig,
}

/// Where the optimization engine lives and how to run it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine entry point (script or executable).
    pub script_path: PathBuf,
    /// Interpreter used to run the script; `None` executes it directly.
    pub interpreter: Option<String>,
    /// Wall-clock budget for a single engine run.
    pub timeout_secs: u64,
    /// Shared scratch directory for job input/output files.
    pub scratch_dir: PathBuf,
}

impl EngineConfig {
    /// Build the core [`Engine`] described by this configuration.
    pub fn engine(&self) -> Engine {
        let runtime = match &self.interpreter {
            Some(interpreter) => EngineRuntime::Interpreted {
                interpreter: interpreter.clone(),
            },
            None => EngineRuntime::Binary,
        };
        Engine::new(
            &self.script_path,
            runtime,
            Duration::from_secs(self.timeout_secs),
        )
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                               |
    /// |-------------------------|---------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                             |
    /// | `PORT`                  | `3001`                                |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`               |
    /// | `REQUEST_TIMEOUT_SECS`  | `330`                                 |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                                  |
    /// | `BODY_LIMIT_BYTES`      | `10485760`                            |
    /// | `ENGINE_SCRIPT_PATH`    | `engine/dna_optimization.py`          |
    /// | `ENGINE_INTERPRETER`    | `python3` (empty: run directly)       |
    /// | `ENGINE_TIMEOUT_SECS`   | `300`                                 |
    /// | `SCRATCH_DIR`           | `{system temp}/recombyne-dnachisel`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_var(&lookup, "PORT", 3001u16, "u16")?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_var(&lookup, "REQUEST_TIMEOUT_SECS", 330u64, "u64")?;
        let shutdown_timeout_secs = parse_var(&lookup, "SHUTDOWN_TIMEOUT_SECS", 30u64, "u64")?;
        let body_limit_bytes =
            parse_var(&lookup, "BODY_LIMIT_BYTES", 10 * 1024 * 1024usize, "usize")?;

        let script_path = lookup("ENGINE_SCRIPT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("engine/dna_optimization.py"));

        // Unset means the default interpreter; set-but-empty means none.
        let interpreter = match lookup("ENGINE_INTERPRETER") {
            None => Some("python3".to_string()),
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.trim().to_string()),
        };

        let timeout_secs = parse_var(&lookup, "ENGINE_TIMEOUT_SECS", 300u64, "u64")?;

        let scratch_dir = lookup("SCRATCH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_SCRATCH_SUBDIR));

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            body_limit_bytes,
            engine: EngineConfig {
                script_path,
                interpreter,
                timeout_secs,
                scratch_dir,
            },
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            expected,
            value,
        }),
    }
}
