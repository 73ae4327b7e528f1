//! External downloader integration (yt-dlp).
//!
//! URL-sourced intake: a video URL is downloaded into a staging
//! directory, moved into the intake directory under a unique name, and
//! paired with a `<file>.source.json` provenance sidecar that the
//! ingest pipeline folds into the catalog record's `sourceRef`.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use chrono::Utc;

use crate::catalog::SourceRef;
use crate::error::{CoreError, CoreResult};
use crate::external::run_command_with_timeout;
use crate::utils::move_into_unique;

/// Suffix appended to an intake file name to form its provenance sidecar.
pub const SOURCE_SIDECAR_SUFFIX: &str = ".source.json";

/// A downloaded file sitting in the intake directory.
#[derive(Debug)]
pub struct FetchedFile {
    pub path: PathBuf,
    pub source: SourceRef,
}

/// Identifies the hosting platform of a URL. Unknown platforms are not
/// downloadable.
pub fn detect_platform(url: &str) -> Option<&'static str> {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        Some("youtube")
    } else if url.contains("twitter.com") || url.contains("x.com") {
        Some("twitter")
    } else {
        None
    }
}

/// Builds the sidecar path for an intake file.
pub fn sidecar_path(media_path: &Path) -> PathBuf {
    let mut name = media_path.as_os_str().to_owned();
    name.push(SOURCE_SIDECAR_SUFFIX);
    PathBuf::from(name)
}

/// Downloads `url` via yt-dlp and lands it in the intake directory with
/// a provenance sidecar next to it.
pub fn fetch_url(url: &str, intake_dir: &Path, timeout: Duration) -> CoreResult<FetchedFile> {
    let platform = detect_platform(url)
        .ok_or_else(|| CoreError::Download(format!("unsupported URL: {url}")))?;

    let staging = tempfile::Builder::new()
        .prefix(".shorereel-fetch-")
        .tempdir_in(intake_dir)?;
    let template = staging.path().join("%(title)s-%(id)s.%(ext)s");

    let mut cmd = Command::new("yt-dlp");
    if platform == "twitter" {
        if let Ok(cookies) = std::env::var("TWITTER_COOKIES_FILE") {
            cmd.args(["--cookies", &cookies]);
        }
    }
    cmd.args([
        "--format",
        "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best",
        "--merge-output-format",
        "mp4",
        "--output",
    ])
    .arg(&template)
    .args(["--no-playlist", "--no-warnings", "--print", "after_move:filepath"])
    .arg(url);

    let output = run_command_with_timeout("yt-dlp", &mut cmd, timeout)?;

    // yt-dlp prints the final file path as the last stdout line.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let downloaded = stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(PathBuf::from)
        .filter(|p| p.exists())
        .ok_or_else(|| CoreError::Download(format!("downloaded file not found for {url}")))?;

    let final_path = move_into_unique(&downloaded, intake_dir)?;

    let source = SourceRef {
        url: url.to_string(),
        platform: platform.to_string(),
        downloaded_at: Utc::now(),
    };
    let sidecar = sidecar_path(&final_path);
    std::fs::write(&sidecar, serde_json::to_string_pretty(&source)?)?;

    log::info!(
        "Downloaded {} -> {}",
        url,
        final_path.display()
    );
    Ok(FetchedFile {
        path: final_path,
        source,
    })
}

/// Reads and removes the provenance sidecar for an intake file, if one
/// exists. A malformed sidecar is dropped with a warning rather than
/// failing the file.
pub fn take_source_sidecar(media_path: &Path) -> Option<SourceRef> {
    let sidecar = sidecar_path(media_path);
    if !sidecar.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(&sidecar)
        .ok()
        .and_then(|raw| serde_json::from_str::<SourceRef>(&raw).ok());
    if parsed.is_none() {
        log::warn!("Ignoring malformed sidecar {}", sidecar.display());
    }
    if let Err(e) = std::fs::remove_file(&sidecar) {
        log::warn!("Failed to remove sidecar {}: {}", sidecar.display(), e);
    }
    parsed
}
