//! Configuration structures and constants for the shorereel-core library.
//!
//! Holds the filesystem layout of a media library (intake directory,
//! holding areas, preview output, catalog document) plus the timeouts
//! imposed on external tools and provider HTTP calls.

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};

// Default constants

/// Default timeout for a single ffprobe invocation.
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 60;

/// Default timeout for a single ffmpeg derivative invocation.
/// Preview generation re-encodes the whole file, so this is generous.
pub const DEFAULT_TRANSCODE_TIMEOUT_SECS: u64 = 600;

/// Default timeout for a single yt-dlp download.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 1800;

/// Default timeout for one provider HTTP call. Uploads push the whole
/// file in one request and get their own, larger budget.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default timeout for the single bulk upload PUT.
pub const DEFAULT_UPLOAD_TIMEOUT_SECS: u64 = 3600;

/// Width of the generated fast-start preview, in pixels.
pub const PREVIEW_WIDTH: u32 = 640;

/// Placeholder micro-thumbnail geometry (matches the catalog consumers).
pub const PLACEHOLDER_WIDTH: u32 = 20;
pub const PLACEHOLDER_HEIGHT: u32 = 13;

/// Main configuration structure for the shorereel-core library.
///
/// Typically created by the CLI from a single `--library` root via
/// [`CoreConfig::for_library`] and passed to the ingest and reconcile
/// entry points.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Directory scanned for freshly dropped video files
    pub intake_dir: PathBuf,

    /// Holding area for successfully ingested files
    pub processed_dir: PathBuf,

    /// Holding area for files whose content hash was already cataloged
    pub duplicates_dir: PathBuf,

    /// Holding area for files that failed a pipeline step
    pub failed_dir: PathBuf,

    /// Output directory for generated preview files (named by content hash)
    pub previews_dir: PathBuf,

    /// Path of the catalog JSON document
    pub catalog_path: PathBuf,

    /// Timeout for one ffprobe invocation, in seconds
    pub probe_timeout_secs: u64,

    /// Timeout for one ffmpeg derivative invocation, in seconds
    pub transcode_timeout_secs: u64,

    /// Timeout for one yt-dlp download, in seconds
    pub download_timeout_secs: u64,

    /// Timeout for one provider status/session HTTP call, in seconds
    pub http_timeout_secs: u64,

    /// Timeout for the bulk upload transfer, in seconds
    pub upload_timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::for_library(PathBuf::from("."))
    }
}

impl CoreConfig {
    /// Derives the standard library layout from a single root directory:
    /// intake at the root, holding areas and previews below it, and the
    /// catalog document alongside them.
    pub fn for_library(root: PathBuf) -> Self {
        Self {
            processed_dir: root.join("processed"),
            duplicates_dir: root.join("duplicates"),
            failed_dir: root.join("failed"),
            previews_dir: root.join("previews"),
            catalog_path: root.join("catalog.json"),
            intake_dir: root,
            probe_timeout_secs: DEFAULT_PROBE_TIMEOUT_SECS,
            transcode_timeout_secs: DEFAULT_TRANSCODE_TIMEOUT_SECS,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            upload_timeout_secs: DEFAULT_UPLOAD_TIMEOUT_SECS,
        }
    }

    /// Validates the configuration and creates the holding areas.
    ///
    /// The intake directory must already exist; the holding areas and
    /// preview directory are created on demand.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.intake_dir.is_dir() {
            return Err(CoreError::Config(format!(
                "intake directory '{}' does not exist",
                self.intake_dir.display()
            )));
        }
        for timeout in [
            self.probe_timeout_secs,
            self.transcode_timeout_secs,
            self.http_timeout_secs,
            self.upload_timeout_secs,
        ] {
            if timeout == 0 {
                return Err(CoreError::Config("timeouts must be non-zero".to_string()));
            }
        }
        for dir in [
            &self.processed_dir,
            &self.duplicates_dir,
            &self.failed_dir,
            &self.previews_dir,
        ] {
            std::fs::create_dir_all(dir)?;
        }
        if let Some(parent) = self.catalog_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
