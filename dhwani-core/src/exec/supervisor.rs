use crate::exec::job::WorkerInvocation;
use anyhow::{Context, Result};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Supervisor knobs, fixed at startup.
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    /// Wait this long after SIGTERM before force-killing.
    pub kill_grace: Duration,
    /// Per-stream capture cap; bytes past it are dropped with a marker.
    pub max_capture_bytes: usize,
}

impl Default for SupervisorOptions {
    fn default() -> Self {
        Self {
            kill_grace: Duration::from_secs(5),
            max_capture_bytes: 64 * 1024,
        }
    }
}

/// Terminal classification of one worker run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Exit 0 and the expected artifact exists non-empty.
    Succeeded,
    /// The process-level deadline expired; the process has been killed and
    /// reaped.
    TimedOut,
    /// Non-zero exit.
    ProcessFailed { exit_code: i32, stderr_tail: String },
    /// Exit 0 but no artifact: a worker defect, not an input problem.
    ArtifactMissing,
}

/// Spawn one worker process and see it through to a terminal outcome.
///
/// The child is placed in its own process group so a timeout kill reaches
/// any grandchildren the script spawned. Whatever happens, no live process
/// outlives this call: the deadline path signals, waits out the grace
/// period, force-kills and reaps; every other path reaps via `wait`, and
/// `kill_on_drop` backstops cancellation of the calling task itself.
pub async fn run(
    invocation: &WorkerInvocation,
    deadline: Duration,
    options: &SupervisorOptions,
) -> Result<Outcome> {
    info!(
        program = %invocation.program,
        working_dir = ?invocation.working_dir,
        ?deadline,
        "Spawning synthesis worker"
    );

    let mut command = Command::new(&invocation.program);
    command
        .args(&invocation.args)
        .current_dir(&invocation.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);

    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn worker {:?}", invocation.program))?;

    let stdout = child.stdout.take().context("worker stdout not piped")?;
    let stderr = child.stderr.take().context("worker stderr not piped")?;
    let cap = options.max_capture_bytes;
    let stdout_task = tokio::spawn(read_capped(stdout, cap));
    let stderr_task = tokio::spawn(read_capped(stderr, cap));

    let status = match tokio::time::timeout(deadline, child.wait()).await {
        Ok(status) => status.context("Failed waiting on worker")?,
        Err(_) => {
            warn!(?deadline, "Worker exceeded deadline, terminating process group");
            terminate(&mut child, options.kill_grace).await;
            // Pipes close once the group is dead, so the capture tasks
            // finish; keep the stderr for the log.
            let stderr_output = stderr_task.await.unwrap_or_default();
            drop(stdout_task);
            if !stderr_output.is_empty() {
                debug!(stderr = %stderr_output, "Stderr of timed-out worker");
            }
            return Ok(Outcome::TimedOut);
        }
    };

    let stdout_output = stdout_task.await.unwrap_or_default();
    let stderr_output = stderr_task.await.unwrap_or_default();
    if !stdout_output.is_empty() {
        debug!(stdout = %stdout_output, "Worker stdout");
    }

    let exit_code = status.code().unwrap_or(-1);
    if !status.success() {
        warn!(exit_code, stderr = %stderr_output, "Worker exited non-zero");
        return Ok(Outcome::ProcessFailed {
            exit_code,
            stderr_tail: tail(&stderr_output, 2048),
        });
    }

    match std::fs::metadata(&invocation.expected_artifact) {
        Ok(meta) if meta.len() > 0 => Ok(Outcome::Succeeded),
        _ => {
            warn!(
                path = ?invocation.expected_artifact,
                "Worker exited 0 but wrote no artifact"
            );
            Ok(Outcome::ArtifactMissing)
        }
    }
}

/// SIGTERM the process group, give it the grace period, then SIGKILL. The
/// child is reaped before this returns.
async fn terminate(child: &mut Child, grace: Duration) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // Negative pid addresses the whole group.
        unsafe {
            libc::kill(-(pid as i32), libc::SIGTERM);
        }
        if tokio::time::timeout(grace, child.wait()).await.is_ok() {
            return;
        }
        warn!(pid, "Worker survived SIGTERM grace period, killing");
    }
    if let Err(e) = child.kill().await {
        warn!(error = ?e, "Failed to kill worker");
    }
}

/// Read a stream to EOF, keeping at most `cap` bytes. The pipe is always
/// drained so the child never blocks on a full buffer; excess bytes are
/// counted and replaced with a marker.
async fn read_capped<R>(mut reader: R, cap: usize) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut dropped: usize = 0;
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                let room = cap.saturating_sub(buf.len());
                let take = n.min(room);
                buf.extend_from_slice(&chunk[..take]);
                dropped += n - take;
            }
            Err(e) => {
                warn!(error = ?e, "Error reading worker output stream");
                break;
            }
        }
    }
    let mut output = String::from_utf8_lossy(&buf).into_owned();
    if dropped > 0 {
        output.push_str(&format!("\n... [output truncated: {dropped} bytes dropped]"));
    }
    output
}

/// Last `max_chars` characters of a capture, for error payloads.
fn tail(output: &str, max_chars: usize) -> String {
    let trimmed = output.trim_end();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max_chars).collect()
}
