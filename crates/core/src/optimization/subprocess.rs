//! Child-process plumbing for engine runs.
//!
//! [`run_command`] spawns a prepared [`Command`], drains stdout and stderr
//! on separate tasks while waiting for exit, and enforces the wall-clock
//! timeout. Executors only decide the program and its arguments.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use super::engine::EngineOutput;
use crate::error::RelayError;

/// Maximum stdout or stderr size captured per stream (10 MiB).
///
/// The remainder of a longer stream is still read (so the child never
/// blocks on a full pipe) but discarded.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Spawn `cmd`, capture its output streams, and wait at most `timeout`.
///
/// The deadline covers both the child's exit and draining its pipes, which
/// stay open while any descendant that inherited them is still running.
/// The child gets no stdin. On timeout it is killed and reaped before
/// [`RelayError::EngineTimeout`] is returned; if the calling future is
/// dropped instead, `kill_on_drop` takes care of it.
pub async fn run_command(cmd: &mut Command, timeout: Duration) -> Result<EngineOutput, RelayError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let deadline = tokio::time::Instant::now() + timeout;

    let mut child = cmd.spawn().map_err(RelayError::EngineSpawn)?;

    // Drain both pipes concurrently so a chatty child cannot fill one of
    // them and stall while we wait on exit.
    let mut stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let mut stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let status = match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            stdout_task.abort();
            stderr_task.abort();
            return Err(RelayError::EngineSpawn(e));
        }
        Err(_elapsed) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "Failed to kill timed-out engine process");
            }
            stdout_task.abort();
            stderr_task.abort();
            return Err(RelayError::EngineTimeout {
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }
    };
    let duration_ms = start.elapsed().as_millis() as u64;

    let drained = tokio::time::timeout_at(deadline, async {
        let stdout = (&mut stdout_task).await.unwrap_or_default();
        let stderr = (&mut stderr_task).await.unwrap_or_default();
        (stdout, stderr)
    })
    .await;

    let Ok((stdout_bytes, stderr_bytes)) = drained else {
        tracing::warn!(
            exit_code = status.code().unwrap_or(-1),
            "Engine exited but its output streams stayed open past the deadline"
        );
        stdout_task.abort();
        stderr_task.abort();
        return Err(RelayError::EngineTimeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        });
    };

    Ok(EngineOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        exit_code: status.code().unwrap_or(-1),
        duration_ms,
    })
}

/// Read a stream to EOF, keeping at most [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    let Some(mut h) = handle else {
        return buf;
    };

    let _ = (&mut h)
        .take(MAX_OUTPUT_BYTES as u64)
        .read_to_end(&mut buf)
        .await;
    // Keep draining past the cap.
    let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
