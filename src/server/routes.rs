//! `/api` handlers

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde::{Deserialize, Serialize};

use super::AppContext;
use crate::downloader::housekeeping::HousekeepingState;
use crate::downloader::{parse_download_request, DownloadError, MediaFormat, MediaRecord, ToolInfo};

pub fn api_routes() -> Router<AppContext> {
    Router::new()
        .route("/video-info", post(video_info))
        .route("/download", post(download))
        .route("/status", get(status))
}

// Fields are optional so a missing one answers 400 instead of a 422 rejection
#[derive(Debug, Deserialize)]
pub struct VideoInfoBody {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadBody {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub quality: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    pub filename: String,
    pub download_url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
    pub format: MediaFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: &'static str,
    pub tool: ToolInfo,
    pub download_dir: String,
    pub max_age_secs: u64,
    pub housekeeping: HousekeepingState,
}

fn required<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, DownloadError> {
    field
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| DownloadError::invalid(format!("missing '{}'", name)))
}

/// POST /api/video-info
async fn video_info(
    State(ctx): State<AppContext>,
    Json(body): Json<VideoInfoBody>,
) -> Result<Json<MediaRecord>, DownloadError> {
    let url = required(&body.url, "url")?;
    tracing::info!(url, "video info requested");

    let record = ctx.service.fetch_info(url).await?;
    Ok(Json(record))
}

/// POST /api/download
async fn download(
    State(ctx): State<AppContext>,
    Json(body): Json<DownloadBody>,
) -> Result<Json<DownloadResponse>, DownloadError> {
    let url = required(&body.url, "url")?;
    let format = required(&body.format, "format")?;
    let request = parse_download_request(url, format, body.quality.as_deref())?;

    tracing::info!(url = %request.url, format = %request.format, "download requested");

    let outcome = ctx.service.download(&request).await?;
    let filename = outcome.artifact.filename();

    Ok(Json(DownloadResponse {
        success: true,
        download_url: format!("/downloads/{}", filename),
        filename,
        title: outcome.title,
        quality: outcome.quality.map(|q| q.label()),
        format: outcome.format,
        note: outcome.note,
    }))
}

/// GET /api/status
async fn status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        tool: (*ctx.tool).clone(),
        download_dir: ctx.service.download_dir().display().to_string(),
        max_age_secs: ctx.config.storage.max_age_secs,
        housekeeping: ctx.housekeeper.snapshot(),
    })
}
