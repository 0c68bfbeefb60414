// Downloader module - yt-dlp invocation, retries and artifact handling

pub mod diagnostics;
pub mod errors;
pub mod format_selector;
pub mod housekeeping;
pub mod invocation;
pub mod locator;
pub mod models;
pub mod orchestrator;
pub mod profile;
pub mod runner;
pub mod service;
pub mod tools;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use errors::DownloadError;
pub use housekeeping::Housekeeper;
pub use models::{DownloadOutcome, DownloadRequest, MediaFormat, MediaRecord, QualityTier};
pub use orchestrator::{RetryOrchestrator, RetryPolicy};
pub use profile::{ProfileSource, RandomProfiles};
pub use runner::{ToolRunner, YtDlpRunner};
pub use service::MediaService;
pub use tools::{ToolInfo, ToolManager};
pub use validate::parse_download_request;
