// Request validation: only well-formed YouTube video links get near yt-dlp

use regex::Regex;

use super::errors::DownloadError;
use super::models::{DownloadRequest, MediaFormat, QualityTier};

lazy_static::lazy_static! {
    // Each pattern captures the video id in group 1.
    static ref URL_SHAPES: [Regex; 3] = [
        // watch page: youtube.com/watch?v=ID (v may follow other params)
        Regex::new(
            r"^(?:https?://)?(?:www\.|m\.)?youtube\.com/watch\?(?:[^#\s]*&)?v=([A-Za-z0-9_-]+)(?:[&#]\S*)?$"
        ).unwrap(),
        // embedded player and legacy links: youtube.com/embed/ID, youtube.com/v/ID
        Regex::new(
            r"^(?:https?://)?(?:www\.|m\.)?youtube\.com/(?:embed|v)/([A-Za-z0-9_-]+)(?:[?&#]\S*)?$"
        ).unwrap(),
        // short link: youtu.be/ID
        Regex::new(r"^(?:https?://)?youtu\.be/([A-Za-z0-9_-]+)(?:[?#]\S*)?$").unwrap(),
    ];
}

/// Check a candidate URL, returning the video id it references.
pub fn validate_url(candidate: &str) -> Result<String, DownloadError> {
    let trimmed = candidate.trim();

    URL_SHAPES
        .iter()
        .find_map(|re| re.captures(trimmed))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| DownloadError::invalid(format!("not a supported YouTube URL: '{}'", trimmed)))
}

/// Validate the raw fields of a download request.
pub fn parse_download_request(
    url: &str,
    format: &str,
    quality: Option<&str>,
) -> Result<DownloadRequest, DownloadError> {
    validate_url(url)?;

    let format = MediaFormat::parse(format)
        .ok_or_else(|| DownloadError::invalid(format!("unsupported format '{}', expected mp4 or mp3", format)))?;

    let quality = match quality {
        Some(raw) => QualityTier::parse(raw).map_err(DownloadError::InvalidInput)?,
        None => None,
    };

    Ok(DownloadRequest {
        url: url.trim().to_string(),
        format,
        quality,
    })
}
