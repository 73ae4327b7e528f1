//! ffprobe integration for media metadata extraction.
//!
//! `ffprobe -v quiet -print_format json -show_format -show_streams`
//! gives us everything the catalog needs in one shot. Anything missing
//! or unparseable is a hard failure for that file; partial metadata is
//! never returned.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use serde::Deserialize;

use crate::catalog::MediaAttributes;
use crate::error::{CoreError, CoreResult};
use crate::external::run_command_with_timeout;

/// Trait seam for metadata extraction, so the orchestrator can be
/// exercised without a real ffprobe on the machine.
pub trait MediaProber {
    fn probe(&self, path: &Path) -> CoreResult<MediaAttributes>;
}

/// Production prober backed by the external `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    timeout: Duration,
}

impl FfprobeProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl MediaProber for FfprobeProber {
    fn probe(&self, path: &Path) -> CoreResult<MediaAttributes> {
        log::debug!("Running ffprobe on: {}", path.display());
        let output = run_command_with_timeout(
            "ffprobe",
            Command::new("ffprobe")
                .args([
                    "-v",
                    "quiet",
                    "-print_format",
                    "json",
                    "-show_format",
                    "-show_streams",
                ])
                .arg(path),
            self.timeout,
        )?;

        let probe: ProbeOutput = serde_json::from_slice(&output.stdout).map_err(|e| {
            CoreError::ProbeParse(format!(
                "ffprobe output for {} did not deserialize: {e}",
                path.display()
            ))
        })?;
        parse_probe_output(&probe, path)
    }
}

/// ffprobe JSON output, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    format: ProbeFormat,
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
    size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

fn parse_probe_output(probe: &ProbeOutput, path: &Path) -> CoreResult<MediaAttributes> {
    let duration_seconds = probe
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| {
            CoreError::ProbeParse(format!(
                "failed to parse duration for {}",
                path.display()
            ))
        })?;

    let size_bytes = probe
        .format
        .size
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| {
            CoreError::ProbeParse(format!("failed to parse size for {}", path.display()))
        })?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| {
            CoreError::ProbeParse(format!("no video stream found in {}", path.display()))
        })?;

    let (width, height) = match (video_stream.width, video_stream.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(CoreError::ProbeParse(format!(
                "video stream missing dimensions in {}",
                path.display()
            )))
        }
    };

    Ok(MediaAttributes {
        duration_seconds,
        width,
        height,
        size_bytes,
    })
}
