// Failure diagnostics - decides what a finished yt-dlp run means
//
// Only bot challenges and unparsable metadata are worth another attempt;
// anything else yt-dlp complains about (bad URL, removed video, missing
// ffmpeg) will fail the same way next time.

use super::errors::{TerminalCause, TransientCause};
use super::runner::InvocationResult;

/// Markers yt-dlp prints when YouTube challenges the request.
/// Matched case-sensitively against the complete stderr capture.
pub const BOT_SIGNATURES: &[&str] = &["Sign in to confirm", "bot"];

/// Outcome of one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict<T> {
    Success(T),
    Transient(TransientCause),
    Terminal(TerminalCause),
}

pub fn is_bot_challenge(stderr: &str) -> bool {
    BOT_SIGNATURES.iter().any(|sig| stderr.contains(sig))
}

/// Classify a finished run. `parse` turns stdout into the caller's value and
/// returns `None` when the output is unusable.
pub fn classify<T>(result: &InvocationResult, parse: impl FnOnce(&str) -> Option<T>) -> Verdict<T> {
    if result.success() {
        return match parse(&result.stdout) {
            Some(value) => Verdict::Success(value),
            None => Verdict::Transient(TransientCause::UnparsableOutput),
        };
    }

    if is_bot_challenge(&result.stderr) {
        return Verdict::Transient(TransientCause::BotChallenge);
    }

    Verdict::Terminal(TerminalCause::ToolError {
        exit_code: result.exit_code,
    })
}

/// Short one-line digest of stderr for logs
pub fn stderr_preview(stderr: &str) -> String {
    let important: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with("ERROR:") || l.contains("HTTP Error"))
        .take(2)
        .collect();

    if !important.is_empty() {
        return important.join(" | ");
    }

    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("no diagnostics")
        .trim()
        .chars()
        .take(160)
        .collect()
}
