//! Implementation of the `fetch` subcommand.
//!
//! Downloads each URL into the library's intake directory with a
//! provenance sidecar, then (unless `--no-ingest`) runs the ingest
//! pipeline over just the downloaded files.

use std::path::PathBuf;
use std::time::Duration;

use log::{error, info};

use shorereel_core::{
    check_dependency, fetch_url, run_ingest, FfmpegDerivatives, FfprobeProber, IngestReport,
    VideoHost,
};

use crate::cli::FetchArgs;
use crate::commands::{build_config, mirror_host, primary_host};
use crate::error::CliResult;

pub fn run(args: &FetchArgs) -> CliResult<IngestReport> {
    check_dependency("yt-dlp")?;
    if !args.no_ingest {
        check_dependency("ffprobe")?;
        check_dependency("ffmpeg")?;
    }
    let config = build_config(&args.library, None)?;

    let timeout = Duration::from_secs(config.download_timeout_secs);
    let mut downloaded: Vec<PathBuf> = Vec::new();
    let mut failures = 0usize;
    for url in &args.urls {
        match fetch_url(url, &config.intake_dir, timeout) {
            Ok(fetched) => downloaded.push(fetched.path),
            Err(e) => {
                error!("Failed to fetch {}: {}", url, e);
                failures += 1;
            }
        }
    }
    info!(
        "Fetched {} of {} URL(s)",
        downloaded.len(),
        args.urls.len()
    );

    if args.no_ingest || downloaded.is_empty() {
        return Ok(IngestReport {
            failed: failures,
            ..IngestReport::default()
        });
    }

    let primary = primary_host(&config)?;
    let mirror = mirror_host(&config)?;
    let prober = FfprobeProber::new(Duration::from_secs(config.probe_timeout_secs));
    let derivatives = FfmpegDerivatives::new(Duration::from_secs(config.transcode_timeout_secs));

    let mut report = run_ingest(
        &prober,
        &derivatives,
        &primary,
        mirror.as_ref().map(|m| m as &dyn VideoHost),
        &config,
        &downloaded,
        false,
    )?;
    report.failed += failures;
    Ok(report)
}
