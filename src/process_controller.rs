// Supervised child process with piped stdio

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("process is already running")]
    AlreadyRunning,
    #[error("failed to spawn process: {0}")]
    Io(#[from] std::io::Error),
    #[error("process exited during startup with {status}")]
    ExitedEarly { status: ExitStatus, output: String },
}

/// Wraps one long-running child process: spawn with piped stdio, drain its
/// output into line buffers from background tasks, poll liveness, stop
/// gracefully with a forced kill as fallback.
pub struct ProcessController {
    path: PathBuf,
    settle: Duration,
    child: Option<Child>,
    stdout_lines: Arc<Mutex<Vec<String>>>,
    stderr_lines: Arc<Mutex<Vec<String>>>,
    reader_handles: Vec<JoinHandle<()>>,
}

impl ProcessController {
    /// `settle` is how long `start` waits before declaring the spawn healthy;
    /// a child that exits within it is reported as a failed start.
    pub fn new(path: impl Into<PathBuf>, settle: Duration) -> Self {
        Self {
            path: path.into(),
            settle,
            child: None,
            stdout_lines: Arc::new(Mutex::new(Vec::new())),
            stderr_lines: Arc::new(Mutex::new(Vec::new())),
            reader_handles: Vec::new(),
        }
    }

    pub async fn start(&mut self, args: &[String]) -> Result<(), SpawnError> {
        if self.is_running() {
            return Err(SpawnError::AlreadyRunning);
        }

        let mut command = Command::new(&self.path);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn()?;
        tracing::info!(path = %self.path.display(), pid = child.id(), "child process started");

        // Fresh process, fresh buffers.
        if let Ok(mut lines) = self.stdout_lines.lock() {
            lines.clear();
        }
        if let Ok(mut lines) = self.stderr_lines.lock() {
            lines.clear();
        }
        self.reader_handles.clear();
        if let Some(stdout) = child.stdout.take() {
            self.reader_handles
                .push(spawn_reader(stdout, self.stdout_lines.clone(), "stdout"));
        }
        if let Some(stderr) = child.stderr.take() {
            self.reader_handles
                .push(spawn_reader(stderr, self.stderr_lines.clone(), "stderr"));
        }
        self.child = Some(child);

        // Catch crash-on-launch before reporting success.
        tokio::time::sleep(self.settle).await;
        let early_exit = match self.child.as_mut() {
            Some(child) => child.try_wait()?,
            None => None,
        };
        if let Some(status) = early_exit {
            let output = self.output_snapshot().unwrap_or_default();
            self.child = None;
            return Err(SpawnError::ExitedEarly { status, output });
        }
        Ok(())
    }

    /// Graceful-then-forced stop. Idempotent: returns false when no process
    /// is tracked, true once the child is confirmed dead.
    pub async fn stop(&mut self, grace: Duration) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };

        #[cfg(unix)]
        if let Some(pid) = child.id() {
            // The child runs in its own process group; signal the whole group.
            unsafe {
                libc::kill(-(pid as i32), libc::SIGTERM);
            }
        }
        #[cfg(not(unix))]
        {
            let _ = child.start_kill();
        }

        match tokio::time::timeout(grace, child.wait()).await {
            Ok(Ok(status)) => {
                tracing::info!(%status, "child process stopped");
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "wait on stopping child failed");
            }
            Err(_) => {
                tracing::warn!("grace period elapsed, force killing child process");
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "force kill failed");
                }
            }
        }
        self.reader_handles.clear();
        true
    }

    /// Non-blocking liveness poll; never waits on the reader tasks.
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    pub fn pid(&self) -> Option<u32> {
        self.child.as_ref().and_then(|child| child.id())
    }

    /// Full accumulated stdout, falling back to stderr when stdout is empty.
    /// Buffers are not cleared by this call; they reset on the next start.
    pub fn output_snapshot(&self) -> Option<String> {
        for buffer in [&self.stdout_lines, &self.stderr_lines] {
            let joined = buffer
                .lock()
                .map(|lines| lines.join("\n"))
                .unwrap_or_default();
            if !joined.is_empty() {
                return Some(joined);
            }
        }
        None
    }

    /// Total buffered line count across both streams; monotonic for the
    /// lifetime of one child, used to detect new output between polls.
    pub fn output_len(&self) -> usize {
        [&self.stdout_lines, &self.stderr_lines]
            .iter()
            .map(|buffer| buffer.lock().map(|lines| lines.len()).unwrap_or(0))
            .sum()
    }
}

fn spawn_reader<R>(
    reader: R,
    buffer: Arc<Mutex<Vec<String>>>,
    stream: &'static str,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            tracing::debug!(stream, line = %line, "child output");
            if let Ok(mut buf) = buffer.lock() {
                buf.push(line);
            }
        }
    })
}
