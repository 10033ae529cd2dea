//! Subprocess supervision: bounded capture and deadline enforcement.
//!
//! Both pipelines funnel their children through [`run_supervised`]: the
//! child's stdout and stderr are drained concurrently into size-capped
//! accumulators, and the whole execution races a deadline after which the
//! child is killed and reaped.

use std::time::Duration;

use oriel_error::ServiceError;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

/// Marker appended to a stream that hit its capture cap.
const TRUNCATION_MARKER: &str = "\n... [output truncated]";

/// Captured output and exit status of a supervised subprocess.
#[derive(Debug)]
pub struct Captured {
    /// Accumulated standard output (possibly truncated).
    pub stdout: String,
    /// Accumulated standard error (possibly truncated).
    pub stderr: String,
    /// Exit code; `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl Captured {
    /// Whether the child exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Configure the standard stream setup shared by both pipelines.
pub fn piped(command: &mut Command) -> &mut Command {
    command
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true)
}

/// Drive a spawned child to completion under a deadline.
///
/// Past the deadline the child is killed, reaped, and
/// [`ServiceError::Timeout`] is returned. The response for a request is
/// only produced after the child has fully exited either way.
pub async fn run_supervised(
    mut child: Child,
    timeout: Duration,
    max_stream_size: usize,
) -> Result<Captured, ServiceError> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow::anyhow!("no stdout handle on child"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow::anyhow!("no stderr handle on child"))?;

    let stdout_task = tokio::spawn(read_capped(stdout, max_stream_size));
    let stderr_task = tokio::spawn(read_capped(stderr, max_stream_size));

    let status = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "failed to wait for child: {e}"
            )));
        }
        Err(_elapsed) => {
            // Deadline passed — kill and reap so no orphan survives the request.
            child.start_kill().ok();
            let _ = child.wait().await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(ServiceError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    };

    let stdout = stdout_task
        .await
        .map_err(|e| anyhow::anyhow!("stdout capture task failed: {e}"))?;
    let stderr = stderr_task
        .await
        .map_err(|e| anyhow::anyhow!("stderr capture task failed: {e}"))?;

    Ok(Captured {
        stdout,
        stderr,
        exit_code: status.code(),
    })
}

/// Read a stream to EOF, keeping at most `cap` bytes.
///
/// The stream is drained past the cap so the child never blocks on a full
/// pipe; excess bytes are discarded and a truncation marker is appended.
async fn read_capped<R: tokio::io::AsyncRead + Unpin>(mut stream: R, cap: usize) -> String {
    let mut collected: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8192];

    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if collected.len() < cap {
                    let take = n.min(cap - collected.len());
                    collected.extend_from_slice(&buf[..take]);
                    if take < n {
                        truncated = true;
                    }
                } else {
                    truncated = true;
                }
            }
            Err(_) => break,
        }
    }

    let mut text = String::from_utf8_lossy(&collected).into_owned();
    if truncated {
        text.push_str(TRUNCATION_MARKER);
    }
    text
}
