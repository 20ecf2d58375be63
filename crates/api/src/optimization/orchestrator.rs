//! Central optimization relay service.
//!
//! Coordinates request validation, job workspace lifecycle, engine
//! invocation, and result interpretation. Held in
//! [`AppState`](crate::state::AppState) as an `Arc<OptimizationRelay>`.

use recombyne_core::error::RelayError;
use recombyne_core::optimization::engine::Engine;
use recombyne_core::optimization::request::OptimizationRequest;
use recombyne_core::optimization::result::{read_result, OptimizationResult};
use recombyne_core::optimization::workspace::{Job, JobWorkspace};
use recombyne_core::optimization::RelayStage;
use tracing::Instrument;

use crate::config::EngineConfig;

/// Runs optimization jobs against the external engine.
///
/// Manages the full lifecycle of one request:
/// 1. Validate the raw body into an [`OptimizationRequest`].
/// 2. Allocate a job workspace.
/// 3. Write the engine input document.
/// 4. Invoke the engine once.
/// 5. Read and classify the engine output.
/// 6. Release the workspace, whatever happened in 3-5.
///
/// Holds no per-job state, so one instance serves any number of concurrent
/// requests.
pub struct OptimizationRelay {
    workspace: JobWorkspace,
    engine: Engine,
}

impl OptimizationRelay {
    pub fn new(workspace: JobWorkspace, engine: Engine) -> Self {
        Self { workspace, engine }
    }

    /// Create a relay from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(JobWorkspace::new(&config.scratch_dir), config.engine())
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn workspace(&self) -> &JobWorkspace {
        &self.workspace
    }

    /// Run one optimization job end to end.
    ///
    /// Validation failures return before anything touches the filesystem.
    /// Once a job is allocated it is released on every path, and a cleanup
    /// problem never replaces the job's own outcome.
    pub async fn run(&self, body: serde_json::Value) -> Result<OptimizationResult, RelayError> {
        let request = OptimizationRequest::from_json(body).map_err(|e| {
            tracing::info!(stage = %RelayStage::Validating, error = %e, "Rejected optimization request");
            e
        })?;

        tracing::info!(
            sequence_length = request.sequence.len(),
            constraints = ?request.constraint_kinds(),
            objectives = ?request.objective_kinds(),
            is_circular = request.is_circular,
            "Accepted optimization request"
        );

        let job = self
            .workspace
            .allocate()
            .await
            .map_err(|e| stage_failed(RelayStage::Allocating, e))?;

        let span = tracing::info_span!("optimization_job", job_id = %job.id());
        let outcome = self.execute(&job, &request).instrument(span.clone()).await;
        job.release().instrument(span.clone()).await;

        span.in_scope(|| {
            tracing::info!(
                stage = %RelayStage::Done,
                success = outcome.is_ok(),
                "Optimization job finished"
            );
        });
        outcome
    }

    /// Serialize, invoke, read. Each stage runs at most once, in order.
    async fn execute(
        &self,
        job: &Job,
        request: &OptimizationRequest,
    ) -> Result<OptimizationResult, RelayError> {
        tracing::debug!(stage = %RelayStage::Serializing, path = %job.input_path().display(), "Writing engine input");
        job.write_input(request)
            .await
            .map_err(|e| stage_failed(RelayStage::Serializing, e))?;

        tracing::debug!(stage = %RelayStage::Invoking, engine = %self.engine.path().display(), "Invoking engine");
        self.engine
            .invoke(job.input_path(), job.output_path())
            .await
            .map_err(|e| stage_failed(RelayStage::Invoking, e))?;

        tracing::debug!(stage = %RelayStage::Reading, path = %job.output_path().display(), "Reading engine output");
        read_result(job.output_path())
            .await
            .map_err(|e| stage_failed(RelayStage::Reading, e))
    }
}

fn stage_failed(stage: RelayStage, err: RelayError) -> RelayError {
    tracing::warn!(stage = %stage, code = err.code(), error = %err, "Optimization job failed");
    err
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
