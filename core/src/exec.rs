#[cfg(unix)]
use std::os::unix::process::ExitStatusExt;

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use std::time::Instant;

use tokio::io::AsyncRead;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::task::JoinHandle;

use crate::spawn::StdinPolicy;
use crate::spawn::kill_child_process_group;
use crate::spawn::spawn_child_async;

const DEFAULT_TIMEOUT_MS: u64 = 60_000;

// conventional shell: 128 + signal
const EXIT_CODE_SIGNAL_BASE: i32 = 128;

// I/O buffer sizing
const READ_CHUNK_SIZE: usize = 8192; // bytes per read
const OUTPUT_BUFFER_INITIAL_CAPACITY: usize = 8 * 1024; // 8 KiB

/// Grace period for draining stdout/stderr after the child terminates. The
/// pipes can be held open by grandchildren that inherited them, in which case
/// the reader tasks would otherwise block forever.
const IO_DRAIN_TIMEOUT: Duration = Duration::from_millis(2_000);

#[derive(Clone, Debug)]
pub struct ExecParams {
    pub command: Vec<String>,
    pub cwd: PathBuf,
    pub timeout_ms: Option<u64>,
    pub env: HashMap<String, String>,
    pub stdin: Option<String>,
}

impl ExecParams {
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS))
    }
}

/// Terminal classification of a single execution. Exactly one variant applies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExecOutcome {
    Success,
    NonZeroExit(i32),
    TimedOut,
    SpawnFailed(String),
}

impl ExecOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecOutcome::Success)
    }
}

/// What a finished execution looks like to the tool layer. stdout and stderr
/// are always present (possibly empty), including on the timeout path where
/// they hold whatever was captured before the kill.
#[derive(Clone, Debug)]
pub struct ExecToolCallOutput {
    pub outcome: ExecOutcome,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExecToolCallOutput {
    fn spawn_failed(reason: String, duration: Duration) -> Self {
        Self {
            outcome: ExecOutcome::SpawnFailed(reason),
            stdout: String::new(),
            stderr: String::new(),
            duration,
        }
    }
}

/// Runs the command to completion and classifies the result. Never returns an
/// error: every failure mode, including the failure to start the process, is
/// represented in the output's outcome.
pub async fn execute(params: ExecParams) -> ExecToolCallOutput {
    let start = Instant::now();

    let timeout = params.timeout_duration();
    let ExecParams {
        command,
        cwd,
        env,
        stdin,
        ..
    } = params;

    match tokio::fs::metadata(&cwd).await {
        Ok(meta) if meta.is_dir() => {}
        _ => {
            return ExecToolCallOutput::spawn_failed(
                format!("working directory {} is not a directory", cwd.display()),
                start.elapsed(),
            );
        }
    }

    let Some((program, args)) = command.split_first() else {
        return ExecToolCallOutput::spawn_failed("command is empty".to_string(), start.elapsed());
    };

    let stdin_policy = if stdin.is_some() {
        StdinPolicy::Piped
    } else {
        StdinPolicy::Null
    };

    let child = match spawn_child_async(program, args, &cwd, &env, stdin_policy) {
        Ok(child) => child,
        Err(err) => {
            tracing::warn!("failed to spawn {program}: {err}");
            return ExecToolCallOutput::spawn_failed(err.to_string(), start.elapsed());
        }
    };

    let raw = consume_output(child, stdin, timeout).await;
    let duration = start.elapsed();

    match raw {
        Ok(raw) => {
            let outcome = if raw.timed_out {
                ExecOutcome::TimedOut
            } else {
                classify_exit(raw.exit_status)
            };
            ExecToolCallOutput {
                outcome,
                stdout: String::from_utf8_lossy(&raw.stdout).to_string(),
                stderr: String::from_utf8_lossy(&raw.stderr).to_string(),
                duration,
            }
        }
        Err(err) => {
            tracing::error!("exec error: {err}");
            ExecToolCallOutput::spawn_failed(err.to_string(), duration)
        }
    }
}

fn classify_exit(exit_status: ExitStatus) -> ExecOutcome {
    if exit_status.success() {
        return ExecOutcome::Success;
    }

    #[cfg(unix)]
    if let Some(signal) = exit_status.signal() {
        return ExecOutcome::NonZeroExit(EXIT_CODE_SIGNAL_BASE + signal);
    }

    ExecOutcome::NonZeroExit(exit_status.code().unwrap_or(-1))
}

#[derive(Debug)]
struct RawExecOutput {
    exit_status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    timed_out: bool,
}

/// Feeds the stdin payload (if any), accumulates stdout and stderr on
/// independent reader tasks, and enforces the timeout. On expiry the whole
/// process group is killed and the child is reaped before this returns, so a
/// `TimedOut` result never leaves a zombie behind.
async fn consume_output(
    mut child: Child,
    stdin: Option<String>,
    timeout: Duration,
) -> io::Result<RawExecOutput> {
    if let Some(payload) = stdin {
        let mut stdin_pipe = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("stdin pipe was unexpectedly not available"))?;
        // The feed runs concurrently with the wait below: a child that never
        // drains its stdin must not stall the timeout, and one that exits
        // without reading makes the write fail with a broken pipe, which is
        // the child's EOF rather than this call's failure.
        tokio::spawn(async move {
            if let Err(err) = stdin_pipe.write_all(payload.as_bytes()).await {
                tracing::debug!("stdin consumer went away early: {err}");
            }
            let _ = stdin_pipe.shutdown().await;
            // Dropping the handle closes the pipe so the child observes EOF.
        });
    }

    let stdout_reader = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("stdout pipe was unexpectedly not available"))?;
    let stderr_reader = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("stderr pipe was unexpectedly not available"))?;

    let mut stdout_handle = tokio::spawn(read_to_end(BufReader::new(stdout_reader)));
    let mut stderr_handle = tokio::spawn(read_to_end(BufReader::new(stderr_reader)));

    let (exit_status, timed_out) = match tokio::time::timeout(timeout, child.wait()).await {
        Ok(status_result) => (status_result?, false),
        Err(_) => {
            kill_child_process_group(&mut child)?;
            child.start_kill()?;
            // Reap the direct child so no zombie outlives this call.
            let exit_status = child.wait().await?;
            (exit_status, true)
        }
    };

    let stdout = await_reader_with_timeout(&mut stdout_handle, IO_DRAIN_TIMEOUT).await?;
    let stderr = await_reader_with_timeout(&mut stderr_handle, IO_DRAIN_TIMEOUT).await?;

    Ok(RawExecOutput {
        exit_status,
        stdout,
        stderr,
        timed_out,
    })
}

async fn await_reader_with_timeout(
    handle: &mut JoinHandle<io::Result<Vec<u8>>>,
    timeout: Duration,
) -> io::Result<Vec<u8>> {
    match tokio::time::timeout(timeout, &mut *handle).await {
        Ok(join_res) => match join_res {
            Ok(io_res) => io_res,
            Err(join_err) => Err(io::Error::other(join_err)),
        },
        Err(_elapsed) => {
            // Abort the task to avoid hanging on pipes held open by
            // grandchildren.
            handle.abort();
            Ok(Vec::new())
        }
    }
}

async fn read_to_end<R: AsyncRead + Unpin + Send + 'static>(mut reader: R) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(OUTPUT_BUFFER_INITIAL_CAPACITY);
    let mut tmp = [0u8; READ_CHUNK_SIZE];

    loop {
        let n = reader.read(&mut tmp).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&tmp[..n]);
        // Continue reading to EOF to avoid back-pressure
    }

    Ok(buf)
}
