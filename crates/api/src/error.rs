use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recombyne_core::error::RelayError;
use serde::Serialize;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`RelayError`] for job failures and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A failure from one of the relay stages.
    #[error(transparent)]
    Relay(#[from] RelayError),

    /// The request body exceeded the configured size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>, code: &'static str) -> Self {
        Self {
            error: error.into(),
            code,
            details: None,
            traceback: None,
            raw: None,
        }
    }

    fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

const OPTIMIZATION_FAILED: &str = "DNA optimization failed";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Relay(err) => relay_error_body(err),

            AppError::PayloadTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody::new("Request body too large", "PAYLOAD_TOO_LARGE").with_details(msg),
            ),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Response for a handler panic caught by `CatchPanicLayer`.
///
/// The panic payload is logged, never returned.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    tracing::error!(panic = %detail, "Request handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        axum::Json(ErrorBody::new("An internal error occurred", "INTERNAL_ERROR")),
    )
        .into_response()
}

/// Map a relay failure to its HTTP status and body.
///
/// Validation failures are the caller's fault (400); everything else is a
/// server-side failure (500) with the most specific diagnostic available in
/// `details`. Deployment paths are logged, never returned.
fn relay_error_body(err: RelayError) -> (StatusCode, ErrorBody) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let code = err.code();

    let body = match err {
        RelayError::Validation { message, details } => {
            let mut body = ErrorBody::new(message, code);
            body.details = details;
            body
        }
        RelayError::Workspace(e) => {
            tracing::error!(error = %e, "Failed to stage optimization job");
            ErrorBody::new("Failed to prepare optimization job", code).with_details(e.to_string())
        }
        RelayError::EngineNotFound(path) => {
            tracing::error!(path = %path, "Optimization engine not found");
            ErrorBody::new("DNA optimization script not found", code)
        }
        RelayError::EngineSpawn(e) => {
            tracing::error!(error = %e, "Failed to start optimization engine");
            ErrorBody::new(OPTIMIZATION_FAILED, code)
                .with_details("Optimization engine could not be started")
        }
        RelayError::EngineExecution { message, .. } => {
            ErrorBody::new(OPTIMIZATION_FAILED, code).with_details(message)
        }
        RelayError::EngineTimeout { elapsed_ms } => ErrorBody::new(OPTIMIZATION_FAILED, code)
            .with_details(format!("Optimization timed out after {elapsed_ms}ms")),
        err @ (RelayError::OutputMissing | RelayError::OutputEmpty) => {
            ErrorBody::new(OPTIMIZATION_FAILED, code).with_details(err.to_string())
        }
        RelayError::OutputParse { reason, raw } => {
            let mut body =
                ErrorBody::new("Failed to parse optimization results", code).with_details(reason);
            body.raw = Some(raw);
            body
        }
        RelayError::OutputRead(e) => {
            ErrorBody::new("Failed to read optimization results", code).with_details(e.to_string())
        }
        RelayError::EngineReported { error, traceback } => {
            let mut body = ErrorBody::new(OPTIMIZATION_FAILED, code).with_details(error);
            body.traceback = traceback;
            body
        }
    };

    (status, body)
}
