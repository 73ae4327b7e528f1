//! The ingestion pipeline orchestrator.
//!
//! Walks a batch of intake files through fingerprint -> dedup check ->
//! metadata -> derivatives -> publish -> catalog append, then gives
//! each file a terminal local disposition (processed / duplicate /
//! failed) applied as a single relocation into the matching holding
//! area. Files are independent: one file's failure never aborts the
//! batch.

use std::path::{Path, PathBuf};

use log::{error, info, warn};

use crate::catalog::{AssetRecord, Catalog, CatalogLock, DedupLedger};
use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::external::ytdlp::take_source_sidecar;
use crate::external::{DerivativeEngine, MediaProber};
use crate::fingerprint::fingerprint_file;
use crate::publish::{publish_file, VideoHost};
use crate::utils::{derive_title, move_into_unique};

/// Terminal local classification of one intake file after one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Processed,
    Duplicate,
    Failed,
}

/// Aggregate counts for one orchestration run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub processed: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl IngestReport {
    pub fn total(&self) -> usize {
        self.processed + self.duplicates + self.failed
    }

    fn count(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Processed => self.processed += 1,
            Disposition::Duplicate => self.duplicates += 1,
            Disposition::Failed => self.failed += 1,
        }
    }
}

/// Processes a batch of intake files.
///
/// Generic over the metadata and derivative seams so the pipeline can
/// be exercised without ffprobe/ffmpeg installed. Holds the catalog
/// lock for the whole run; the catalog is saved after every appended
/// record so a mid-batch crash loses no completed upload.
///
/// With `dry_run` set, files are fingerprinted, dedup-checked and
/// probed but nothing is uploaded, moved, or written to the catalog.
pub fn run_ingest<P: MediaProber, D: DerivativeEngine>(
    prober: &P,
    derivatives: &D,
    primary: &dyn VideoHost,
    mirror: Option<&dyn VideoHost>,
    config: &CoreConfig,
    files: &[PathBuf],
    dry_run: bool,
) -> CoreResult<IngestReport> {
    let _lock = CatalogLock::acquire(&config.catalog_path)?;
    let mut catalog = Catalog::open(&config.catalog_path)?;
    let mut ledger = DedupLedger::from_catalog(&catalog);
    let mut report = IngestReport::default();

    info!(
        "Ingest run over {} file(s){}",
        files.len(),
        if dry_run { " (dry run)" } else { "" }
    );

    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        info!("Processing: {}", filename);

        let disposition = process_one(
            prober,
            derivatives,
            primary,
            mirror,
            config,
            &mut catalog,
            &mut ledger,
            path,
            dry_run,
        );
        report.count(disposition);
    }

    info!(
        "Ingest summary: {} processed, {} duplicate(s), {} failed",
        report.processed, report.duplicates, report.failed
    );
    Ok(report)
}

/// Runs one file through the pipeline and applies its disposition.
/// Never returns an error: every per-file failure is folded into the
/// `Failed` disposition.
#[allow(clippy::too_many_arguments)]
fn process_one<P: MediaProber, D: DerivativeEngine>(
    prober: &P,
    derivatives: &D,
    primary: &dyn VideoHost,
    mirror: Option<&dyn VideoHost>,
    config: &CoreConfig,
    catalog: &mut Catalog,
    ledger: &mut DedupLedger,
    path: &Path,
    dry_run: bool,
) -> Disposition {
    let content_hash = match fingerprint_file(path) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to fingerprint {}: {}", path.display(), e);
            if !dry_run {
                relocate(path, &config.failed_dir);
            }
            return Disposition::Failed;
        }
    };

    if ledger.contains(&content_hash) {
        info!("Duplicate content, skipping: {}", path.display());
        if !dry_run {
            relocate(path, &config.duplicates_dir);
        }
        return Disposition::Duplicate;
    }

    if dry_run {
        return match prober.probe(path) {
            Ok(attrs) => {
                info!(
                    "[dry run] would publish {} ({}x{}, {:.1}s)",
                    path.display(),
                    attrs.width,
                    attrs.height,
                    attrs.duration_seconds
                );
                Disposition::Processed
            }
            Err(e) => {
                warn!("[dry run] probe failed for {}: {}", path.display(), e);
                Disposition::Failed
            }
        };
    }

    match ingest_unique(
        prober,
        derivatives,
        primary,
        mirror,
        config,
        path,
        &content_hash,
    ) {
        Ok(record) => {
            let appended = catalog.append(record).and_then(|()| catalog.save());
            if let Err(e) = appended {
                // The upload happened but the record could not be kept;
                // quarantine the file so the operator notices.
                error!("Failed to catalog {}: {}", path.display(), e);
                relocate(path, &config.failed_dir);
                return Disposition::Failed;
            }
            ledger.insert(content_hash);
            relocate(path, &config.processed_dir);
            Disposition::Processed
        }
        Err(e) => {
            error!("Failed: {} ({})", path.display(), e);
            relocate(path, &config.failed_dir);
            Disposition::Failed
        }
    }
}

/// The success path for a deduped-unique file: probe, derivatives,
/// publish, record assembly. Any error here is terminal for the file.
fn ingest_unique<P: MediaProber, D: DerivativeEngine>(
    prober: &P,
    derivatives: &D,
    primary: &dyn VideoHost,
    mirror: Option<&dyn VideoHost>,
    config: &CoreConfig,
    path: &Path,
    content_hash: &str,
) -> CoreResult<AssetRecord> {
    let attrs = prober.probe(path)?;

    // Placeholder and preview are independent of each other; both must
    // succeed before the file is publishable.
    let placeholder = derivatives.extract_placeholder(path)?;
    let preview_name = format!("{content_hash}.mp4");
    derivatives.generate_preview(path, &config.previews_dir.join(&preview_name))?;

    let outcome = publish_file(primary, mirror, path)?;

    let mut record = AssetRecord::new(
        content_hash.to_string(),
        derive_title(path),
        placeholder,
        attrs,
    );
    record.preview_ref = Some(preview_name);
    record.provider_refs = outcome.provider_refs;
    // Provenance sidecar is consumed only once the publish succeeded;
    // on failure it travels with the file into the holding area.
    record.source_ref = take_source_sidecar(path);
    if outcome.primary_asset_id.is_some() {
        record.mark_preparing();
    }
    Ok(record)
}

/// Applies the disposition side effect: one relocation of the media
/// file (and its provenance sidecar, if still present) into a holding
/// area. Relocation failures are logged, not propagated; the
/// classification already happened.
fn relocate(path: &Path, dir: &Path) {
    match move_into_unique(path, dir) {
        Ok(dest) => {
            let sidecar = crate::external::ytdlp::sidecar_path(path);
            if sidecar.exists() {
                let sidecar_dest = crate::external::ytdlp::sidecar_path(&dest);
                if let Err(e) = std::fs::rename(&sidecar, &sidecar_dest) {
                    warn!("Failed to move sidecar {}: {}", sidecar.display(), e);
                }
            }
        }
        Err(e) => warn!(
            "Failed to move {} into {}: {}",
            path.display(),
            dir.display(),
            e
        ),
    }
}
