// FormatSelector - yt-dlp format flags for a download request
//
// Video: capped mp4+m4a pair -> uncapped best pair -> best single stream.
// Audio: best audio stream extracted to mp3 at top quality, with cover art
// and tags embedded.

use super::models::{MediaFormat, QualityTier};

pub struct FormatSelector;

impl FormatSelector {
    /// Format expression passed to `-f`
    pub fn format_spec(format: MediaFormat, quality: Option<QualityTier>) -> String {
        if format.is_audio() {
            return "bestaudio/best".to_string();
        }

        match quality {
            Some(tier) => format!(
                "bestvideo[height<={h}][ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best",
                h = tier.height()
            ),
            None => "bestvideo[ext=mp4]+bestaudio[ext=m4a]/bestvideo+bestaudio/best".to_string(),
        }
    }

    /// All format-related flags for a download
    pub fn format_args(format: MediaFormat, quality: Option<QualityTier>) -> Vec<String> {
        let mut args = vec!["-f".to_string(), Self::format_spec(format, quality)];

        match format {
            MediaFormat::Mp3 => args.extend(
                [
                    "-x",
                    "--audio-format",
                    "mp3",
                    "--audio-quality",
                    "0",
                    "--embed-thumbnail",
                    "--add-metadata",
                ]
                .map(String::from),
            ),
            MediaFormat::Mp4 => {
                args.push("--merge-output-format".to_string());
                args.push("mp4".to_string());
            }
        }

        args
    }
}
