//! Handlers for the `/dna-optimization` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use recombyne_core::error::RelayError;
use recombyne_core::optimization::result::OptimizationResult;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// POST /api/dna-optimization
///
/// The body is taken as untyped JSON so that field-level problems are
/// reported by the relay's own validation rather than a generic
/// deserialization message.
pub async fn optimize(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> AppResult<Json<OptimizationResult>> {
    let Json(body) = payload.map_err(reject_body)?;
    let result = state.relay.run(body).await?;
    Ok(Json(result))
}

/// Any method other than POST on `/api/dna-optimization`.
pub async fn method_not_allowed() -> AppError {
    AppError::Relay(RelayError::validation("Method not allowed"))
}

fn reject_body(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge(rejection.body_text());
    }
    AppError::Relay(RelayError::validation_with_details(
        "Invalid request body",
        rejection.body_text(),
    ))
}
