// Scripted yt-dlp stand-in for orchestrator, service and API tests

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::profile::{EvasionProfile, FixedProfile, ProfileSource};
use super::runner::{InvocationResult, ToolRunner};

pub const VALID_DUMP: &str = r#"{"id":"dQw4w9WgXcQ","title":"Never Gonna Give You Up","duration":213,"uploader":"Rick Astley","thumbnail":"https://i.ytimg.com/vi/dQw4w9WgXcQ/maxresdefault.jpg","formats":[{"format_id":"18","height":360,"vcodec":"avc1.42001E"},{"format_id":"137","height":1080,"vcodec":"avc1.640028"},{"format_id":"140","vcodec":"none","acodec":"mp4a.40.2"}]}"#;

pub const BOT_STDERR: &str =
    "ERROR: [youtube] dQw4w9WgXcQ: Sign in to confirm you're not a bot. Use --cookies-from-browser or --cookies";

/// One scripted reply
pub struct Step {
    result: InvocationResult,
    /// On success, create `<template with %(ext)s replaced>` like yt-dlp would
    writes_ext: Option<String>,
}

pub fn ok(stdout: &str) -> Step {
    Step {
        result: InvocationResult {
            exit_code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        },
        writes_ext: None,
    }
}

pub fn ok_writing(ext: &str) -> Step {
    Step {
        writes_ext: Some(ext.to_string()),
        ..ok("")
    }
}

pub fn bot_failure() -> Step {
    tool_failure(1, BOT_STDERR)
}

pub fn tool_failure(code: i32, stderr: &str) -> Step {
    Step {
        result: InvocationResult {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        },
        writes_ext: None,
    }
}

pub fn fixed_profiles() -> Arc<dyn ProfileSource> {
    Arc::new(FixedProfile(EvasionProfile::new("test-agent/1.0", 1)))
}

pub struct ScriptedRunner {
    steps: Mutex<VecDeque<Step>>,
    seen: Mutex<Vec<Vec<String>>>,
    spawn_error: Option<io::ErrorKind>,
}

impl ScriptedRunner {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            seen: Mutex::new(Vec::new()),
            spawn_error: None,
        })
    }

    /// Behaves like a missing binary
    pub fn failing_spawn() -> Arc<Self> {
        Self::erroring(io::ErrorKind::NotFound)
    }

    /// Behaves like an attempt killed by the runner's timeout
    pub fn timing_out() -> Arc<Self> {
        Self::erroring(io::ErrorKind::TimedOut)
    }

    fn erroring(kind: io::ErrorKind) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
            spawn_error: Some(kind),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, args: Vec<String>) -> io::Result<InvocationResult> {
        self.seen.lock().unwrap().push(args.clone());

        if let Some(kind) = self.spawn_error {
            return Err(io::Error::new(kind, format!("scripted failure: {:?}", kind)));
        }

        let step = self.steps.lock().unwrap().pop_front();
        let Some(step) = step else {
            return Ok(InvocationResult {
                exit_code: Some(99),
                stdout: String::new(),
                stderr: "ScriptedRunner: no more steps".to_string(),
            });
        };

        let result = step.result;

        if let (true, Some(ext)) = (result.success(), step.writes_ext) {
            let template = args
                .windows(2)
                .find(|w| w[0] == "-o")
                .map(|w| w[1].clone())
                .expect("download invocation without -o");
            std::fs::write(template.replace("%(ext)s", &ext), b"media")?;
        }

        Ok(result)
    }
}
