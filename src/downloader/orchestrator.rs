// Retry orchestrator - drives yt-dlp attempts until success or a terminal failure

use std::io;
use std::sync::Arc;
use std::time::Duration;

use super::diagnostics::{classify, stderr_preview, Verdict};
use super::errors::{DownloadError, TerminalCause, TransientCause};
use super::invocation::{InvocationBuilder, InvocationSpec};
use super::profile::ProfileSource;
use super::runner::ToolRunner;

pub const MAX_ATTEMPTS: u32 = 3;

/// Which pipeline is retrying; the download path backs off harder on bot checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Metadata,
    Download,
}

impl Operation {
    fn backoff_factor(&self, cause: TransientCause) -> u32 {
        match (self, cause) {
            (_, TransientCause::UnparsableOutput) => 2,
            (Operation::Metadata, TransientCause::BotChallenge) => 3,
            (Operation::Download, TransientCause::BotChallenge) => 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Length of one backoff step; delays are multiples of this
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before attempt `attempt + 1`: `(attempt + 1) * factor` units
    pub fn delay_for(&self, op: Operation, cause: TransientCause, attempt: u32) -> Duration {
        self.backoff_unit * ((attempt + 1) * op.backoff_factor(cause))
    }
}

/// State of one orchestrated run
#[derive(Debug)]
pub enum AttemptState<T> {
    Attempting(u32),
    Succeeded { value: T, attempts: u32 },
    FailedTerminal(DownloadError),
}

/// Successful run and how many invocations it took
#[derive(Debug, Clone)]
pub struct Completed<T> {
    pub value: T,
    pub attempts: u32,
}

pub struct RetryOrchestrator {
    runner: Arc<dyn ToolRunner>,
    profiles: Arc<dyn ProfileSource>,
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    pub fn new(runner: Arc<dyn ToolRunner>, profiles: Arc<dyn ProfileSource>, policy: RetryPolicy) -> Self {
        Self {
            runner,
            profiles,
            policy,
        }
    }

    /// Run attempts until one succeeds or the run fails terminally.
    ///
    /// `spec_for` builds the invocation for a given attempt index and `parse`
    /// turns a successful stdout into the result. Dropping the returned future
    /// cancels a pending backoff and kills a running child.
    pub async fn run<T, S, P>(&self, op: Operation, spec_for: S, parse: P) -> Result<Completed<T>, DownloadError>
    where
        S: Fn(u32) -> InvocationSpec,
        P: Fn(&str) -> Option<T>,
    {
        let mut state = AttemptState::Attempting(0);

        loop {
            state = match state {
                AttemptState::Attempting(attempt) => self.attempt(op, attempt, spec_for(attempt), &parse).await,
                AttemptState::Succeeded { value, attempts } => return Ok(Completed { value, attempts }),
                AttemptState::FailedTerminal(err) => return Err(err),
            };
        }
    }

    async fn attempt<T, P>(&self, op: Operation, attempt: u32, spec: InvocationSpec, parse: &P) -> AttemptState<T>
    where
        P: Fn(&str) -> Option<T>,
    {
        let profile = self.profiles.sample();
        let args = InvocationBuilder::build(&spec, &profile);

        tracing::info!(
            operation = ?op,
            attempt = attempt + 1,
            max_attempts = self.policy.max_attempts,
            url = %spec.url,
            "running yt-dlp"
        );

        let result = match self.runner.run(args).await {
            Ok(result) => result,
            Err(e) => {
                let cause = if e.kind() == io::ErrorKind::TimedOut {
                    TerminalCause::TimedOut
                } else {
                    TerminalCause::Spawn
                };
                tracing::error!(error = %e, %cause, "yt-dlp attempt aborted");
                return AttemptState::FailedTerminal(DownloadError::TerminalExtraction {
                    cause,
                    stderr: e.to_string(),
                });
            }
        };

        match classify(&result, |stdout| parse(stdout)) {
            Verdict::Success(value) => {
                tracing::info!(operation = ?op, attempt = attempt + 1, "yt-dlp succeeded");
                AttemptState::Succeeded {
                    value,
                    attempts: attempt + 1,
                }
            }
            Verdict::Terminal(cause) => {
                tracing::warn!(
                    operation = ?op,
                    exit_code = ?result.exit_code,
                    stderr = %stderr_preview(&result.stderr),
                    "yt-dlp failed, not retrying"
                );
                AttemptState::FailedTerminal(DownloadError::TerminalExtraction {
                    cause,
                    stderr: result.stderr.trim().to_string(),
                })
            }
            Verdict::Transient(cause) => {
                let next = attempt + 1;
                if next >= self.policy.max_attempts {
                    tracing::warn!(operation = ?op, attempts = next, %cause, "giving up after max attempts");
                    return AttemptState::FailedTerminal(DownloadError::TerminalExtraction {
                        cause: TerminalCause::AttemptsExhausted { attempts: next, last: cause },
                        stderr: result.stderr.trim().to_string(),
                    });
                }

                let delay = self.policy.delay_for(op, cause, attempt);
                tracing::warn!(
                    operation = ?op,
                    attempt = next,
                    %cause,
                    delay_ms = delay.as_millis() as u64,
                    stderr = %stderr_preview(&result.stderr),
                    "transient yt-dlp failure, retrying"
                );
                tokio::time::sleep(delay).await;
                AttemptState::Attempting(next)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::models::MediaRecord;
    use crate::downloader::test_helpers::{bot_failure, fixed_profiles, ok, tool_failure, ScriptedRunner, VALID_DUMP};

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn orchestrator(runner: Arc<ScriptedRunner>) -> RetryOrchestrator {
        orchestrator_with_unit(runner, Duration::from_millis(1))
    }

    fn orchestrator_with_unit(runner: Arc<ScriptedRunner>, unit: Duration) -> RetryOrchestrator {
        RetryOrchestrator::new(
            runner,
            fixed_profiles(),
            RetryPolicy {
                max_attempts: MAX_ATTEMPTS,
                backoff_unit: unit,
            },
        )
    }

    async fn fetch(orch: &RetryOrchestrator) -> Result<Completed<MediaRecord>, DownloadError> {
        orch.run(Operation::Metadata, |n| InvocationSpec::info(URL, n), MediaRecord::from_dump)
            .await
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::default();
        let s = Duration::from_secs;
        assert_eq!(policy.delay_for(Operation::Metadata, TransientCause::UnparsableOutput, 0), s(2));
        assert_eq!(policy.delay_for(Operation::Metadata, TransientCause::UnparsableOutput, 1), s(4));
        assert_eq!(policy.delay_for(Operation::Metadata, TransientCause::BotChallenge, 0), s(3));
        assert_eq!(policy.delay_for(Operation::Metadata, TransientCause::BotChallenge, 1), s(6));
        assert_eq!(policy.delay_for(Operation::Download, TransientCause::BotChallenge, 0), s(5));
        assert_eq!(policy.delay_for(Operation::Download, TransientCause::BotChallenge, 1), s(10));
    }

    #[tokio::test]
    async fn test_bot_bot_then_success_takes_three_invocations() {
        let runner = ScriptedRunner::new(vec![bot_failure(), bot_failure(), ok(VALID_DUMP)]);
        let done = fetch(&orchestrator(runner.clone())).await.unwrap();

        assert_eq!(done.value.title, "Never Gonna Give You Up");
        assert_eq!(done.attempts, 3);
        assert_eq!(runner.calls(), 3);
    }

    #[tokio::test]
    async fn test_bot_three_times_is_terminal_after_three_invocations() {
        let runner = ScriptedRunner::new(vec![bot_failure(), bot_failure(), bot_failure(), ok(VALID_DUMP)]);
        let err = fetch(&orchestrator(runner.clone())).await.unwrap_err();

        assert_eq!(runner.calls(), 3);
        match err {
            DownloadError::TerminalExtraction { cause, stderr } => {
                assert_eq!(
                    cause,
                    TerminalCause::AttemptsExhausted {
                        attempts: 3,
                        last: TransientCause::BotChallenge
                    }
                );
                assert!(stderr.contains("Sign in to confirm"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unparsable_then_valid_uses_second_output() {
        let runner = ScriptedRunner::new(vec![ok("{\"title\": \"Trunc"), ok(VALID_DUMP)]);
        let done = fetch(&orchestrator(runner.clone())).await.unwrap();

        assert_eq!(done.value.title, "Never Gonna Give You Up");
        assert_eq!(done.attempts, 2);
        assert_eq!(runner.calls(), 2);
    }

    #[tokio::test]
    async fn test_other_failure_is_not_retried() {
        let runner = ScriptedRunner::new(vec![tool_failure(1, "  ERROR: Unsupported URL\n"), ok(VALID_DUMP)]);
        let err = fetch(&orchestrator(runner.clone())).await.unwrap_err();

        assert_eq!(runner.calls(), 1);
        match err {
            DownloadError::TerminalExtraction { cause, stderr } => {
                assert_eq!(cause, TerminalCause::ToolError { exit_code: Some(1) });
                assert_eq!(stderr, "ERROR: Unsupported URL");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_terminal() {
        let runner = ScriptedRunner::failing_spawn();
        let err = fetch(&orchestrator(runner.clone())).await.unwrap_err();

        assert_eq!(runner.calls(), 1);
        assert!(matches!(
            err,
            DownloadError::TerminalExtraction {
                cause: TerminalCause::Spawn,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_each_attempt_gets_its_overlay() {
        let runner = ScriptedRunner::new(vec![bot_failure(), bot_failure(), ok(VALID_DUMP)]);
        fetch(&orchestrator(runner.clone())).await.unwrap();

        let seen = runner.invocations();
        assert_eq!(seen.len(), 3);
        assert!(!seen[0].contains(&"--force-ipv4".to_string()));
        assert!(!seen[0].contains(&"--force-ipv6".to_string()));
        assert!(seen[1].contains(&"--force-ipv4".to_string()));
        assert!(seen[2].contains(&"--force-ipv6".to_string()));
        assert!(seen[2].contains(&"youtube:player_client=android".to_string()));
    }

    #[tokio::test]
    async fn test_download_success_needs_no_stdout() {
        let runner = ScriptedRunner::new(vec![ok("")]);
        let done = orchestrator(runner.clone())
            .run(Operation::Download, |n| InvocationSpec::info(URL, n), |_| Some(()))
            .await
            .unwrap();
        assert_eq!(done.attempts, 1);
    }

    #[tokio::test]
    async fn test_unparsable_three_times_is_terminal() {
        let runner = ScriptedRunner::new(vec![ok("{"), ok("{"), ok("{"), ok(VALID_DUMP)]);
        let err = fetch(&orchestrator(runner.clone())).await.unwrap_err();

        assert_eq!(runner.calls(), 3);
        match &err {
            DownloadError::TerminalExtraction { cause, .. } => assert_eq!(
                *cause,
                TerminalCause::AttemptsExhausted {
                    attempts: 3,
                    last: TransientCause::UnparsableOutput
                }
            ),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().ends_with("unparsable metadata output"));
    }

    #[tokio::test]
    async fn test_backoff_waits_per_operation() {
        let unit = Duration::from_millis(20);

        let runner = ScriptedRunner::new(vec![bot_failure(), bot_failure(), ok("")]);
        let started = std::time::Instant::now();
        orchestrator_with_unit(runner.clone(), unit)
            .run(Operation::Download, |n| InvocationSpec::info(URL, n), |_| Some(()))
            .await
            .unwrap();
        // (1 + 2) * 5 units
        assert!(started.elapsed() >= Duration::from_millis(300));
        assert_eq!(runner.calls(), 3);

        let runner = ScriptedRunner::new(vec![bot_failure(), bot_failure(), ok(VALID_DUMP)]);
        let started = std::time::Instant::now();
        fetch(&orchestrator_with_unit(runner.clone(), unit)).await.unwrap();
        // (1 + 2) * 3 units
        assert!(started.elapsed() >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_attempt_timeout_is_reported_as_timeout() {
        let runner = ScriptedRunner::timing_out();
        let err = fetch(&orchestrator(runner.clone())).await.unwrap_err();

        assert_eq!(runner.calls(), 1);
        assert!(matches!(
            err,
            DownloadError::TerminalExtraction {
                cause: TerminalCause::TimedOut,
                ..
            }
        ));
        assert!(err.to_string().contains("timed out"));
        assert!(!err.to_string().contains("could not run"));
    }
}
