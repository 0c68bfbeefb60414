//! Conversion from downloader errors to JSON error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::downloader::DownloadError;

/// Error body returned by every API endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Short summary of what went wrong
    pub error: String,
    /// Full message, including the last yt-dlp stderr for extraction failures
    pub details: String,
}

impl From<&DownloadError> for ApiError {
    fn from(err: &DownloadError) -> Self {
        let error = match err {
            DownloadError::InvalidInput(_) => "Invalid request",
            DownloadError::TerminalExtraction { .. } => "Extraction failed",
            DownloadError::ArtifactMissing { .. } => "Downloaded file not found",
            DownloadError::Io(_) => "Internal error",
        };

        Self {
            error: error.to_string(),
            details: err.to_string(),
        }
    }
}

impl IntoResponse for DownloadError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "rejected request");
        }

        (status, Json(ApiError::from(&self))).into_response()
    }
}
