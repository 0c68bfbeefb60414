use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub path: Option<String>,
    pub version: Option<String>,
    pub is_available: bool,
}

pub struct ToolManager {
    binary: String,
}

impl ToolManager {
    /// `binary` is either a bare name looked up on PATH or an explicit path
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// Path the runner should spawn. Falls back to the configured name so a
    /// missing tool surfaces as a spawn error on first use.
    pub fn resolve(&self) -> PathBuf {
        self.locate().unwrap_or_else(|| PathBuf::from(&self.binary))
    }

    fn locate(&self) -> Option<PathBuf> {
        let configured = Path::new(&self.binary);
        if configured.components().count() > 1 {
            return configured.is_file().then(|| configured.to_path_buf());
        }
        which::which(&self.binary).ok()
    }

    pub async fn get_tool_info(&self) -> ToolInfo {
        let path = self.locate();
        let version = match &path {
            Some(p) => get_version(p).await,
            None => None,
        };

        ToolInfo {
            name: self.binary.clone(),
            is_available: path.is_some() && version.is_some(),
            path: path.map(|p| p.display().to_string()),
            version,
        }
    }
}

async fn get_version(path: &Path) -> Option<String> {
    match Command::new(path).arg("--version").output().await {
        Ok(output) if output.status.success() => {
            let out = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!out.is_empty()).then_some(out)
        }
        Ok(output) => {
            tracing::warn!(path = %path.display(), status = %output.status, "--version failed");
            None
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not run --version");
            None
        }
    }
}
