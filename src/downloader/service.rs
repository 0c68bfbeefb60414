// Metadata fetcher and media downloader on top of the retry orchestrator

use std::path::{Path, PathBuf};

use time::OffsetDateTime;

use super::errors::DownloadError;
use super::invocation::{InvocationSpec, Subcommand};
use super::locator::locate_artifact;
use super::models::{DownloadOutcome, DownloadRequest, MediaRecord};
use super::orchestrator::{Operation, RetryOrchestrator};
use super::validate::validate_url;

const MAX_TITLE_CHARS: usize = 60;

pub struct MediaService {
    orchestrator: RetryOrchestrator,
    download_dir: PathBuf,
}

impl MediaService {
    pub fn new(orchestrator: RetryOrchestrator, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            orchestrator,
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Title, duration, uploader, thumbnail and available qualities for `url`
    pub async fn fetch_info(&self, url: &str) -> Result<MediaRecord, DownloadError> {
        let url = url.trim();
        validate_url(url)?;

        let done = self
            .orchestrator
            .run(Operation::Metadata, |n| InvocationSpec::info(url, n), MediaRecord::from_dump)
            .await?;

        tracing::debug!(title = %done.value.title, attempts = done.attempts, "metadata fetched");
        Ok(done.value)
    }

    /// Fetch metadata for the title, download into the output directory and
    /// locate the file yt-dlp produced.
    pub async fn download(&self, request: &DownloadRequest) -> Result<DownloadOutcome, DownloadError> {
        let record = self.fetch_info(&request.url).await?;

        let token = new_token();
        let base_name = format!("{}_{}", sanitize_title(&record.title), token);
        let output_template = self
            .download_dir
            .join(format!("{}.%(ext)s", base_name))
            .to_string_lossy()
            .into_owned();

        tokio::fs::create_dir_all(&self.download_dir).await?;

        tracing::info!(
            base_name = %base_name,
            format = %request.format,
            quality = ?request.quality.map(|q| q.height()),
            "starting download"
        );

        let done = self
            .orchestrator
            .run(
                Operation::Download,
                |n| InvocationSpec {
                    subcommand: Subcommand::Download {
                        format: request.format,
                        quality: request.quality,
                        output_template: output_template.clone(),
                    },
                    url: request.url.clone(),
                    attempt: n,
                },
                |_| Some(()),
            )
            .await?;

        let requested_ext = request.format.extension();
        let located = locate_artifact(&self.download_dir, &base_name, &token, requested_ext).await?;

        let note = located.format_mismatch.then(|| {
            format!(
                "Requested {} but the delivered file is {}",
                requested_ext, located.artifact.extension
            )
        });

        tracing::info!(
            file = %located.artifact.filename(),
            attempts = done.attempts,
            mismatch = located.format_mismatch,
            "download complete"
        );

        Ok(DownloadOutcome {
            artifact: located.artifact,
            title: record.title,
            format: request.format,
            quality: request.quality,
            note,
        })
    }
}

/// `<unix-millis>_<8 hex chars>`, unique per request
pub fn new_token() -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    format!("{}_{:08x}", millis, rand::random::<u32>())
}

/// Filesystem- and template-safe version of a video title
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        let keep = c.is_ascii_alphanumeric() || c == '-' || c == '_';
        let c = if keep { c } else { '_' };
        if c == '_' && out.ends_with('_') {
            continue;
        }
        out.push(c);
    }

    let trimmed: String = out.trim_matches('_').chars().take(MAX_TITLE_CHARS).collect();
    let trimmed = trimmed.trim_end_matches('_');

    if trimmed.is_empty() {
        "video".to_string()
    } else {
        trimmed.to_string()
    }
}
