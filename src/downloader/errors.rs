// Error types for the fetch/download pipeline

use std::fmt;
use thiserror::Error;

/// Why an attempt was considered worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientCause {
    /// The site challenged the request as automated traffic
    BotChallenge,
    /// yt-dlp exited 0 but the metadata dump did not parse
    UnparsableOutput,
}

impl fmt::Display for TransientCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BotChallenge => write!(f, "bot detection"),
            Self::UnparsableOutput => write!(f, "unparsable metadata output"),
        }
    }
}

/// Why the orchestrator gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCause {
    /// yt-dlp failed with a non-retryable error
    ToolError { exit_code: Option<i32> },
    /// Every attempt hit a transient failure
    AttemptsExhausted { attempts: u32, last: TransientCause },
    /// The process could not be started
    Spawn,
    /// The attempt ran past the configured limit and was killed
    TimedOut,
}

impl fmt::Display for TerminalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ToolError { exit_code: Some(code) } => write!(f, "yt-dlp exited with code {}", code),
            Self::ToolError { exit_code: None } => write!(f, "yt-dlp was terminated by a signal"),
            Self::AttemptsExhausted { attempts, last } => {
                write!(f, "max attempts ({}) reached, last failure: {}", attempts, last)
            }
            Self::Spawn => write!(f, "could not run yt-dlp"),
            Self::TimedOut => write!(f, "yt-dlp attempt timed out"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DownloadError {
    /// Malformed URL or unsupported format/quality token
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-retryable tool failure, or the attempt bound ran out.
    /// Retryable failures never leave the orchestrator loop.
    #[error("extraction failed: {cause}{}", stderr_suffix(.stderr))]
    TerminalExtraction { cause: TerminalCause, stderr: String },

    /// yt-dlp reported success but nothing matching the token is on disk
    #[error("downloaded file not found for '{token}' in {dir}; directory contains: [{}]", .listing.join(", "))]
    ArtifactMissing {
        token: String,
        dir: String,
        listing: Vec<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl DownloadError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// HTTP status the API layer should answer with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            _ => 500,
        }
    }

    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::TerminalExtraction { .. } => "terminal_extraction_failure",
            Self::ArtifactMissing { .. } => "artifact_missing",
            Self::Io(_) => "io_error",
        }
    }
}
