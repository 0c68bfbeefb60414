// Result locator - find the file yt-dlp actually wrote
//
// yt-dlp fills in `%(ext)s` itself and may merge into a different container
// than asked for, so the final name is only known after the run.

use std::path::Path;

use super::errors::DownloadError;
use super::models::DownloadArtifact;

/// Leftovers yt-dlp writes while a download is in flight
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp"];

/// Where the artifact was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located {
    pub artifact: DownloadArtifact,
    /// `true` when the delivered extension differs from the request
    pub format_mismatch: bool,
}

/// Scan `dir` for the output of a download named `base_name`.
///
/// Prefers `<base_name>.<requested_ext>`, then any name containing `base_name`
/// with that extension; otherwise accepts any file
/// carrying `token` and flags the mismatch.
pub async fn locate_artifact(
    dir: &Path,
    base_name: &str,
    token: &str,
    requested_ext: &str,
) -> Result<Located, DownloadError> {
    let mut names = list_dir(dir).await?;
    names.sort();

    let exact = format!("{}.{}", base_name, requested_ext);
    let wanted_suffix = format!(".{}", requested_ext);

    if let Some(name) = names.iter().find(|n| **n == exact).or_else(|| {
        names
            .iter()
            .find(|n| n.contains(base_name) && n.ends_with(&wanted_suffix))
    }) {
        return Ok(Located {
            artifact: artifact(dir, name, base_name, token),
            format_mismatch: false,
        });
    }

    if let Some(name) = names
        .iter()
        .find(|n| n.contains(token) && !PARTIAL_SUFFIXES.iter().any(|s| n.ends_with(s)))
    {
        tracing::warn!(file = %name, requested = requested_ext, "yt-dlp delivered a different format");
        return Ok(Located {
            artifact: artifact(dir, name, base_name, token),
            format_mismatch: true,
        });
    }

    tracing::error!(dir = %dir.display(), token, files = names.len(), "downloaded file not found");
    Err(DownloadError::ArtifactMissing {
        token: token.to_string(),
        dir: dir.display().to_string(),
        listing: names,
    })
}

async fn list_dir(dir: &Path) -> Result<Vec<String>, DownloadError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await.map(|t| t.is_file()).unwrap_or(false) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    Ok(names)
}

fn artifact(dir: &Path, name: &str, base_name: &str, token: &str) -> DownloadArtifact {
    let path = dir.join(name);
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    DownloadArtifact {
        base_name: base_name.to_string(),
        token: token.to_string(),
        path,
        extension,
    }
}
