//! Implementation of the `ingest` subcommand.
//!
//! Validates the environment (external tools, provider credentials,
//! library layout) up front, discovers intake files, and hands the
//! batch to the core pipeline.

use std::time::Duration;

use log::{info, warn};

use shorereel_core::{
    check_dependency, find_intake_files, run_ingest, FfmpegDerivatives, FfprobeProber,
    IngestReport, VideoHost,
};

use crate::cli::IngestArgs;
use crate::commands::{mirror_host, primary_host};
use crate::error::CliResult;

pub fn run(args: &IngestArgs) -> CliResult<IngestReport> {
    // Everything that can abort the run fails here, before any file is
    // touched.
    check_dependency("ffprobe")?;
    check_dependency("ffmpeg")?;
    let config = args.to_config()?;
    let primary = primary_host(&config)?;
    let mirror = mirror_host(&config)?;

    let files = find_intake_files(&config.intake_dir)?;
    if files.is_empty() {
        info!("No intake files in {}", config.intake_dir.display());
        return Ok(IngestReport::default());
    }

    let prober = FfprobeProber::new(Duration::from_secs(config.probe_timeout_secs));
    let derivatives = FfmpegDerivatives::new(Duration::from_secs(config.transcode_timeout_secs));

    let report = run_ingest(
        &prober,
        &derivatives,
        &primary,
        mirror.as_ref().map(|m| m as &dyn VideoHost),
        &config,
        &files,
        args.dry_run,
    )?;

    if report.failed > 0 {
        warn!(
            "{} file(s) failed; see {}",
            report.failed,
            config.failed_dir.display()
        );
    }
    Ok(report)
}
