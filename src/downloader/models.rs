// Common data models for the fetch/download pipeline

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;

/// Video information extracted from a yt-dlp metadata dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub title: String,
    /// Duration in seconds
    pub duration: u64,
    pub uploader: String,
    pub thumbnail: String,
    /// Distinct video heights, highest first ("1080p", "720p", ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_qualities: Option<Vec<String>>,
}

impl MediaRecord {
    /// Parse the single JSON line printed by `--dump-json`.
    ///
    /// Returns `None` for anything that is not an object with a string title;
    /// yt-dlp sometimes prints truncated output when throttled.
    pub fn from_dump(stdout: &str) -> Option<Self> {
        let json: serde_json::Value = serde_json::from_str(stdout.trim()).ok()?;
        let title = json.get("title")?.as_str()?.to_string();

        let duration = json["duration"].as_f64().unwrap_or(0.0).max(0.0).round() as u64;

        Some(Self {
            title,
            duration,
            uploader: json["uploader"].as_str().unwrap_or("Unknown").to_string(),
            thumbnail: json["thumbnail"].as_str().unwrap_or("").to_string(),
            available_qualities: quality_labels(&json),
        })
    }
}

fn quality_labels(json: &serde_json::Value) -> Option<Vec<String>> {
    let formats = json["formats"].as_array()?;

    let heights: BTreeSet<u64> = formats
        .iter()
        .filter(|f| f["vcodec"].as_str().map_or(true, |v| v != "none"))
        .filter_map(|f| f["height"].as_u64())
        .filter(|h| *h > 0)
        .collect();

    if heights.is_empty() {
        return None;
    }

    Some(heights.iter().rev().map(|h| format!("{}p", h)).collect())
}

/// Output container requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Mp4,
    Mp3,
}

impl MediaFormat {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "mp4" => Some(Self::Mp4),
            "mp3" => Some(Self::Mp3),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Mp3 => "mp3",
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, Self::Mp3)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Height cap for a video download
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QualityTier(u32);

impl QualityTier {
    const MAX_HEIGHT: u32 = 4320;

    /// Accepts "720p", "720" or "1080P". "best" and empty mean no cap.
    pub fn parse(raw: &str) -> Result<Option<Self>, String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("best") {
            return Ok(None);
        }

        let digits = trimmed
            .strip_suffix('p')
            .or_else(|| trimmed.strip_suffix('P'))
            .unwrap_or(trimmed);

        match digits.parse::<u32>() {
            Ok(h) if h > 0 && h <= Self::MAX_HEIGHT => Ok(Some(Self(h))),
            _ => Err(format!("unsupported quality '{}'", raw)),
        }
    }

    pub fn height(&self) -> u32 {
        self.0
    }

    pub fn label(&self) -> String {
        format!("{}p", self.0)
    }
}

/// Validated download request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format: MediaFormat,
    pub quality: Option<QualityTier>,
}

/// File produced by a successful download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    /// `<sanitized-title>_<token>`, chosen before yt-dlp runs
    pub base_name: String,
    /// `<unix-millis>_<hex-suffix>`, unique per request
    pub token: String,
    pub path: PathBuf,
    /// Extension yt-dlp actually wrote
    pub extension: String,
}

impl DownloadArtifact {
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Everything the API layer needs to answer a download request
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub artifact: DownloadArtifact,
    pub title: String,
    pub format: MediaFormat,
    pub quality: Option<QualityTier>,
    /// Set when yt-dlp delivered a different container than requested
    pub note: Option<String>,
}
