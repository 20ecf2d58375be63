//! Job-scoped file workspaces under a shared scratch directory.
//!
//! Every job gets a fresh UUID v4 and derives its file names from it, so
//! concurrent jobs never touch each other's files and no locking is needed.

use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use super::request::OptimizationRequest;
use crate::error::RelayError;

/// Name of the scratch subdirectory created under the system temp dir when
/// no explicit location is configured.
pub const DEFAULT_SCRATCH_SUBDIR: &str = "recombyne-dnachisel";

/// Allocates [`Job`]s inside one shared scratch directory.
#[derive(Debug, Clone)]
pub struct JobWorkspace {
    scratch_dir: PathBuf,
}

impl JobWorkspace {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Ensure the scratch directory exists and hand out a fresh job.
    ///
    /// No files are created for the job itself; they appear once the input
    /// is written and the engine runs.
    pub async fn allocate(&self) -> Result<Job, RelayError> {
        fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(RelayError::Workspace)?;

        let id = Uuid::new_v4();
        Ok(Job {
            id,
            input_path: self.scratch_dir.join(format!("{id}-input.json")),
            output_path: self.scratch_dir.join(format!("{id}-output.json")),
            staging_path: self.scratch_dir.join(format!("{id}-input.json.partial")),
            released: false,
        })
    }
}

/// One request's isolated unit of work.
///
/// Owned exclusively by the request that allocated it. Call
/// [`Job::release`] on every exit path; if the owning future is dropped
/// first (client disconnect, request timeout) the files are removed
/// synchronously on drop instead.
#[derive(Debug)]
pub struct Job {
    id: Uuid,
    input_path: PathBuf,
    output_path: PathBuf,
    staging_path: PathBuf,
    released: bool,
}

impl Job {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Serialize the request as the engine's input document.
    ///
    /// The document is written to a staging file and renamed into place, so
    /// the engine never observes a half-written input.
    pub async fn write_input(&self, request: &OptimizationRequest) -> Result<(), RelayError> {
        let bytes = serde_json::to_vec(request)
            .map_err(|e| RelayError::Workspace(std::io::Error::other(e)))?;

        if let Err(e) = fs::write(&self.staging_path, &bytes).await {
            let _ = fs::remove_file(&self.staging_path).await;
            return Err(RelayError::Workspace(e));
        }
        fs::rename(&self.staging_path, &self.input_path)
            .await
            .map_err(RelayError::Workspace)?;

        tracing::debug!(job_id = %self.id, bytes = bytes.len(), "Wrote engine input");
        Ok(())
    }

    /// Best-effort removal of every file this job may have created.
    ///
    /// Missing files are expected (earlier failure, or the engine removed
    /// them). Other errors are logged and swallowed.
    pub async fn release(mut self) {
        for path in self.paths() {
            match fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        job_id = %self.id,
                        path = %path.display(),
                        error = %e,
                        "Failed to remove job file"
                    );
                }
            }
        }
        self.released = true;
        tracing::debug!(job_id = %self.id, "Released job workspace");
    }

    fn paths(&self) -> [&Path; 3] {
        [&self.input_path, &self.output_path, &self.staging_path]
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for path in self.paths() {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        job_id = %self.id,
                        path = %path.display(),
                        error = %e,
                        "Failed to remove abandoned job file"
                    );
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;

    use super::*;

    fn sample_request() -> OptimizationRequest {
        OptimizationRequest {
            sequence: "ATGCATGCATGC".to_string(),
            constraints: vec![],
            objectives: vec![],
            is_circular: false,
        }
    }

    #[tokio::test]
    async fn allocate_creates_missing_scratch_dir() {
        let root = tempfile::tempdir().expect("create temp dir");
        let scratch = root.path().join("nested").join("scratch");
        let workspace = JobWorkspace::new(&scratch);

        let job = workspace.allocate().await.expect("allocate");
        assert!(scratch.is_dir());
        assert!(job.input_path().starts_with(&scratch));
        assert!(job.output_path().starts_with(&scratch));
        assert!(!job.input_path().exists(), "allocate must not create job files");

        // Idempotent on an existing directory.
        workspace.allocate().await.expect("allocate again");
    }

    #[tokio::test]
    async fn paths_derive_from_job_id() {
        let root = tempfile::tempdir().expect("create temp dir");
        let job = JobWorkspace::new(root.path()).allocate().await.expect("allocate");
        let id = job.id().to_string();

        assert_eq!(
            job.input_path().file_name().unwrap().to_str().unwrap(),
            format!("{id}-input.json")
        );
        assert_eq!(
            job.output_path().file_name().unwrap().to_str().unwrap(),
            format!("{id}-output.json")
        );
    }

    #[tokio::test]
    async fn concurrent_allocations_never_collide() {
        let root = tempfile::tempdir().expect("create temp dir");
        let workspace = JobWorkspace::new(root.path());

        let jobs = futures::future::join_all((0..128).map(|_| {
            let workspace = workspace.clone();
            tokio::spawn(async move { workspace.allocate().await.expect("allocate") })
        }))
        .await;

        let mut paths = HashSet::new();
        let mut ids = HashSet::new();
        for job in jobs {
            let job = job.expect("join");
            assert!(ids.insert(job.id()));
            assert!(paths.insert(job.input_path().to_path_buf()));
            assert!(paths.insert(job.output_path().to_path_buf()));
        }
        assert_eq!(ids.len(), 128);
        assert_eq!(paths.len(), 256);
    }

    #[tokio::test]
    async fn write_input_produces_engine_document() {
        let root = tempfile::tempdir().expect("create temp dir");
        let job = JobWorkspace::new(root.path()).allocate().await.expect("allocate");

        job.write_input(&sample_request()).await.expect("write input");

        let content = std::fs::read_to_string(job.input_path()).expect("read input");
        let doc: serde_json::Value = serde_json::from_str(&content).expect("parse input");
        assert_eq!(doc["sequence"], "ATGCATGCATGC");
        assert_eq!(doc["constraints"], serde_json::json!([]));
        assert_eq!(doc["objectives"], serde_json::json!([]));
        assert_eq!(doc["isCircular"], false);

        // No staging file left behind.
        let entries = std::fs::read_dir(root.path()).expect("read dir").count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn write_input_fails_when_scratch_dir_vanishes() {
        let root = tempfile::tempdir().expect("create temp dir");
        let scratch = root.path().join("scratch");
        let job = JobWorkspace::new(&scratch).allocate().await.expect("allocate");
        std::fs::remove_dir_all(&scratch).expect("remove scratch");

        let result = job.write_input(&sample_request()).await;
        assert_matches!(result, Err(RelayError::Workspace(_)));
    }

    #[tokio::test]
    async fn release_removes_files() {
        let root = tempfile::tempdir().expect("create temp dir");
        let job = JobWorkspace::new(root.path()).allocate().await.expect("allocate");
        job.write_input(&sample_request()).await.expect("write input");
        std::fs::write(job.output_path(), "{}").expect("write output");

        let input = job.input_path().to_path_buf();
        let output = job.output_path().to_path_buf();
        job.release().await;

        assert!(!input.exists());
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn release_tolerates_missing_files() {
        let root = tempfile::tempdir().expect("create temp dir");
        let job = JobWorkspace::new(root.path()).allocate().await.expect("allocate");
        // Nothing was ever written.
        job.release().await;
    }

    #[tokio::test]
    async fn dropping_unreleased_job_removes_files() {
        let root = tempfile::tempdir().expect("create temp dir");
        let job = JobWorkspace::new(root.path()).allocate().await.expect("allocate");
        job.write_input(&sample_request()).await.expect("write input");
        let input = job.input_path().to_path_buf();

        drop(job);

        assert!(!input.exists());
    }
}
