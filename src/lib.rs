pub mod config;
pub mod downloader;
pub mod server;

use std::sync::Arc;

use config::Config;
use downloader::{MediaService, RandomProfiles, RetryOrchestrator, RetryPolicy, ToolInfo, ToolManager, YtDlpRunner};

/// Wire the runner, profile source and orchestrator described by `config`
pub fn build_service(config: &Config) -> MediaService {
    let program = ToolManager::new(&config.tool.binary).resolve();
    let runner = YtDlpRunner::new(program).with_timeout(config.tool.attempt_timeout());

    let policy = RetryPolicy {
        backoff_unit: config.retry.backoff_unit(),
        ..RetryPolicy::default()
    };

    let orchestrator = RetryOrchestrator::new(Arc::new(runner), Arc::new(RandomProfiles::new()), policy);
    MediaService::new(orchestrator, &config.storage.download_dir)
}

/// Detect the configured tool and log what was found. A missing tool is
/// reported but does not stop startup.
pub async fn check_tool(config: &Config) -> ToolInfo {
    let info = ToolManager::new(&config.tool.binary).get_tool_info().await;

    if info.is_available {
        tracing::info!(
            path = info.path.as_deref().unwrap_or_default(),
            version = info.version.as_deref().unwrap_or_default(),
            "found {}",
            info.name
        );
    } else {
        tracing::warn!("{} not found; requests will fail until it is installed", info.name);
    }

    info
}
