//! ffmpeg integration for visual derivatives.
//!
//! Two independent operations back the catalog's visual fields: a
//! first-frame micro-thumbnail inlined as a base64 data URL, and a
//! reduced-resolution fast-start preview file. Neither depends on the
//! other's output.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::config::{PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH, PREVIEW_WIDTH};
use crate::error::CoreResult;
use crate::external::run_command_with_timeout;

/// Trait seam for derivative generation, mockable in pipeline tests.
pub trait DerivativeEngine {
    /// Samples the first frame, downscales it to a micro-thumbnail and
    /// returns it as a `data:image/jpeg;base64,...` URL.
    fn extract_placeholder(&self, path: &Path) -> CoreResult<String>;

    /// Writes a reduced-resolution, fast-start preview of `path` to
    /// `out_path`, overwriting any previous artifact at that location.
    fn generate_preview(&self, path: &Path, out_path: &Path) -> CoreResult<()>;
}

/// Production derivative engine backed by the external `ffmpeg` binary.
#[derive(Debug, Clone)]
pub struct FfmpegDerivatives {
    timeout: Duration,
}

impl FfmpegDerivatives {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DerivativeEngine for FfmpegDerivatives {
    fn extract_placeholder(&self, path: &Path) -> CoreResult<String> {
        log::debug!("Extracting placeholder frame from: {}", path.display());

        // The frame goes through a temp file that is removed when the
        // guard drops; only the encoded data URL survives.
        let frame = tempfile::Builder::new()
            .prefix("shorereel-placeholder-")
            .suffix(".jpg")
            .tempfile()?;

        let filter = format!(
            "select=eq(n\\,0),scale={}:{}",
            PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT
        );
        run_command_with_timeout(
            "ffmpeg",
            Command::new("ffmpeg")
                .arg("-y")
                .arg("-i")
                .arg(path)
                .args(["-vf", &filter, "-frames:v", "1", "-f", "image2", "-q:v", "5"])
                .arg(frame.path()),
            self.timeout,
        )?;

        let bytes = std::fs::read(frame.path())?;
        Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(bytes)))
    }

    fn generate_preview(&self, path: &Path, out_path: &Path) -> CoreResult<()> {
        log::debug!(
            "Generating preview: {} -> {}",
            path.display(),
            out_path.display()
        );

        // -movflags +faststart puts the index at the front of the file
        // so progressive playback can begin immediately; -y makes
        // regeneration for the same content hash an idempotent overwrite.
        let scale = format!("scale={}:-2", PREVIEW_WIDTH);
        run_command_with_timeout(
            "ffmpeg",
            Command::new("ffmpeg")
                .arg("-y")
                .arg("-i")
                .arg(path)
                .args([
                    "-vf",
                    &scale,
                    "-c:v",
                    "libx264",
                    "-preset",
                    "veryfast",
                    "-crf",
                    "28",
                    "-an",
                    "-movflags",
                    "+faststart",
                ])
                .arg(out_path),
            self.timeout,
        )?;
        Ok(())
    }
}
