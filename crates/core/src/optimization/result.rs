//! Interpretation of the engine's result document.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Characters of unparseable output kept for diagnostics.
pub const RAW_EXCERPT_CHARS: usize = 200;

/// Fallback when the engine declares failure without saying why.
pub const UNKNOWN_ENGINE_ERROR: &str = "Unknown error during optimization";

/// Result document as written by the engine.
///
/// Everything is optional here; which fields are required depends on
/// `success` and is checked in [`parse_result`].
#[derive(Debug, Deserialize)]
struct ResultDocument {
    success: Option<bool>,
    optimized_sequence: Option<String>,
    constraints_summary: Option<String>,
    objectives_summary: Option<String>,
    all_constraints_passing: Option<bool>,
    error: Option<String>,
    traceback: Option<String>,
}

/// A successful optimization, as returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizationResult {
    pub success: bool,
    pub optimized_sequence: String,
    pub constraints_summary: String,
    pub objectives_summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_constraints_passing: Option<bool>,
}

/// Read and interpret the engine's output file.
///
/// Only meaningful after the engine exited with code 0.
pub async fn read_result(output_path: &Path) -> Result<OptimizationResult, RelayError> {
    let content = match tokio::fs::read(output_path).await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(RelayError::OutputMissing)
        }
        Err(e) => return Err(RelayError::OutputRead(e)),
    };
    tracing::debug!(bytes = content.len(), "Read engine output");
    parse_result(&content)
}

/// Classify result document content.
pub fn parse_result(content: &str) -> Result<OptimizationResult, RelayError> {
    if content.trim().is_empty() {
        return Err(RelayError::OutputEmpty);
    }

    let doc: ResultDocument = serde_json::from_str(content).map_err(|e| RelayError::OutputParse {
        reason: format!("JSON parse error: {e}"),
        raw: excerpt(content),
    })?;

    if doc.success == Some(false) {
        return Err(RelayError::EngineReported {
            error: doc
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| UNKNOWN_ENGINE_ERROR.to_string()),
            traceback: doc.traceback,
        });
    }

    let optimized_sequence = doc.optimized_sequence.ok_or_else(|| RelayError::OutputParse {
        reason: "Result document is missing optimized_sequence".to_string(),
        raw: excerpt(content),
    })?;

    Ok(OptimizationResult {
        success: true,
        optimized_sequence,
        constraints_summary: doc.constraints_summary.unwrap_or_default(),
        objectives_summary: doc.objectives_summary.unwrap_or_default(),
        all_constraints_passing: doc.all_constraints_passing,
    })
}

/// First [`RAW_EXCERPT_CHARS`] characters of `content`.
fn excerpt(content: &str) -> String {
    content.chars().take(RAW_EXCERPT_CHARS).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
