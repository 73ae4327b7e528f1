//! # shorereel-core
//!
//! Core library for the shorereel media ingestion pipeline. It turns a
//! directory of dropped (or downloaded) video files into published,
//! deduplicated catalog records:
//!
//! 1. discover intake files and fingerprint their content (SHA-256),
//! 2. skip anything whose content is already cataloged,
//! 3. extract metadata and derivatives (micro-thumbnail placeholder,
//!    fast-start preview) with ffprobe/ffmpeg,
//! 4. publish the source bytes to a video-hosting provider (plus an
//!    optional best-effort mirror),
//! 5. append a record to the durable JSON catalog and relocate the file
//!    into its holding area.
//!
//! A separate reconciler advances cataloged records through the
//! provider's asynchronous transcode lifecycle until each is `ready`
//! or `errored`.
//!
//! ## Module organization
//!
//! - [`config`]: library layout and timeout configuration
//! - [`error`]: the [`CoreError`] type used throughout
//! - [`discovery`]: intake directory scanning
//! - [`fingerprint`]: content hashing
//! - [`catalog`]: the durable record store, dedup ledger, and lock
//! - [`external`]: ffprobe/ffmpeg/yt-dlp process integration
//! - [`publish`]: the [`VideoHost`] provider seam and Mux implementation
//! - [`ingest`]: the per-batch pipeline orchestrator
//! - [`reconcile`]: the re-entrant status reconciler
//!
//! All external collaborators sit behind traits ([`MediaProber`],
//! [`DerivativeEngine`], [`VideoHost`]) so the pipeline can be tested
//! without ffmpeg, ffprobe, or network access.

pub mod catalog;
pub mod config;
pub mod discovery;
pub mod error;
pub mod external;
pub mod fingerprint;
pub mod ingest;
pub mod publish;
pub mod reconcile;
pub mod utils;

pub use catalog::{
    AssetRecord, Catalog, CatalogLock, DedupLedger, MediaAttributes, ProviderRef, RemoteState,
    SourceRef,
};
pub use config::CoreConfig;
pub use discovery::find_intake_files;
pub use error::{CoreError, CoreResult};
pub use external::{
    check_dependency, detect_platform, fetch_url, DerivativeEngine, FetchedFile,
    FfmpegDerivatives, FfprobeProber, MediaProber,
};
pub use ingest::{run_ingest, Disposition, IngestReport};
pub use publish::{MuxHost, PublishOutcome, RemoteStatus, UploadSession, VideoHost};
pub use reconcile::{reconcile, reconcile_pass, ReconcileOptions, ReconcileOutcome};
