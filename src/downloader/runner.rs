// Subprocess runner: spawn yt-dlp and capture everything it prints

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

/// Captured result of one yt-dlp run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// `None` when the process was killed by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl InvocationResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Seam between the orchestrator and the real process
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the tool with `args` and wait for it to exit with both streams drained.
    async fn run(&self, args: Vec<String>) -> io::Result<InvocationResult>;
}

/// Runs the yt-dlp binary
pub struct YtDlpRunner {
    program: PathBuf,
    attempt_timeout: Option<Duration>,
}

impl YtDlpRunner {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            attempt_timeout: None,
        }
    }

    /// Kill the process if one attempt runs longer than `limit`
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.attempt_timeout = limit;
        self
    }
}

#[async_trait]
impl ToolRunner for YtDlpRunner {
    async fn run(&self, args: Vec<String>) -> io::Result<InvocationResult> {
        tracing::debug!(program = %self.program.display(), args = %args.join(" "), "spawning yt-dlp");

        let mut child = TokioCommand::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdout_pipe = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stdout not captured"))?;
        let mut stderr_pipe = child
            .stderr
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "stderr not captured"))?;

        // Drain both pipes concurrently so a chatty stderr cannot block the child.
        let stdout_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
        });
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
        });

        let status = match self.attempt_timeout {
            None => child.wait().await?,
            Some(limit) => match timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    let _ = child.kill().await;
                    stdout_task.abort();
                    stderr_task.abort();
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("yt-dlp timed out after {}s", limit.as_secs()),
                    ));
                }
            },
        };

        let stdout = stdout_task.await.map_err(io::Error::other)??;
        let stderr = stderr_task.await.map_err(io::Error::other)??;

        Ok(InvocationResult {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}
