//! The ingestion catalog: one durable record per published asset.
//!
//! The catalog is a single JSON document (`{ "videos": [...] }`) shared
//! between the ingest pipeline, the status reconciler, and the
//! presentation layer that only reads it. Records are append/merge-only:
//! a record is appended once per distinct content hash and afterwards
//! only its remote lifecycle fields ever change. Nothing is deleted;
//! an asset whose remote transcode failed stays behind as an `errored`
//! record for audit.
//!
//! Field names are serialized in camelCase because that is the contract
//! the presentation layer reads.

use std::collections::{BTreeMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Provider-side asynchronous transcode lifecycle of an asset.
///
/// Moves forward only: `uploading -> preparing -> ready`, with
/// `errored` absorbing from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteState {
    Uploading,
    Preparing,
    Ready,
    Errored,
}

impl RemoteState {
    /// `ready` and `errored` are terminal; the reconciler never touches
    /// a record once it reaches either.
    pub fn is_terminal(self) -> bool {
        matches!(self, RemoteState::Ready | RemoteState::Errored)
    }
}

/// Intrinsic media properties captured once at ingest time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttributes {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// One provider's opaque identifiers for an asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRef {
    /// Upload-session id handed out when the upload was created.
    pub upload_id: String,
    /// Provider asset id, absent until the provider assigns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
}

/// Provenance for files that arrived via the external downloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub url: String,
    pub platform: String,
    pub downloaded_at: DateTime<Utc>,
}

/// One cataloged media item and its publication/transcode lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Stable internal id (v4 UUID), minted at creation. Provider asset
    /// ids live only inside `provider_refs`.
    pub id: String,
    /// Hex SHA-256 of the source bytes; the dedup key. Immutable.
    pub content_hash: String,
    /// Display title derived once from the source file name.
    pub title: String,
    /// Provider name -> that provider's identifiers.
    pub provider_refs: BTreeMap<String, ProviderRef>,
    /// End-user-playable stream id; set iff `remote_state` is ready.
    pub playback_ref: Option<String>,
    /// Inline base64 micro-thumbnail data URL. Immutable.
    pub placeholder: String,
    /// Relative path of the local fast-start preview, if generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_ref: Option<String>,
    /// Origin URL/platform when the file came from the downloader.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<SourceRef>,
    pub media_attributes: MediaAttributes,
    pub remote_state: RemoteState,
    pub created_at: DateTime<Utc>,
}

impl AssetRecord {
    /// Creates a fresh record in the `uploading` state.
    pub fn new(
        content_hash: String,
        title: String,
        placeholder: String,
        media_attributes: MediaAttributes,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content_hash,
            title,
            provider_refs: BTreeMap::new(),
            playback_ref: None,
            placeholder,
            preview_ref: None,
            source_ref: None,
            media_attributes,
            remote_state: RemoteState::Uploading,
            created_at: Utc::now(),
        }
    }

    /// Advances `uploading -> preparing`. Returns false (and leaves the
    /// record untouched) for any other starting state.
    pub fn mark_preparing(&mut self) -> bool {
        if self.remote_state == RemoteState::Uploading {
            self.remote_state = RemoteState::Preparing;
            true
        } else {
            self.remote_state == RemoteState::Preparing
        }
    }

    /// Advances to `ready` and sets the playback reference. Only legal
    /// from a non-terminal state; terminal states never regress.
    pub fn mark_ready(&mut self, playback_ref: String) -> bool {
        if self.remote_state.is_terminal() {
            return false;
        }
        self.remote_state = RemoteState::Ready;
        self.playback_ref = Some(playback_ref);
        true
    }

    /// Moves a non-terminal record into the absorbing `errored` state.
    pub fn mark_errored(&mut self) -> bool {
        if self.remote_state.is_terminal() {
            return false;
        }
        self.remote_state = RemoteState::Errored;
        true
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogDoc {
    videos: Vec<AssetRecord>,
}

/// The durable record-per-asset store backing the whole pipeline.
#[derive(Debug)]
pub struct Catalog {
    path: PathBuf,
    doc: CatalogDoc,
}

impl Catalog {
    /// Opens the catalog at `path`. A missing file yields an empty
    /// catalog; a present but unreadable one is a configuration-level
    /// failure.
    pub fn open(path: &Path) -> CoreResult<Self> {
        let doc = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw).map_err(|e| {
                CoreError::Catalog(format!("failed to parse '{}': {e}", path.display()))
            })?
        } else {
            CatalogDoc::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            doc,
        })
    }

    /// Persists the full document atomically: written to a temp file in
    /// the same directory, then renamed over the old catalog so readers
    /// never observe a truncated document.
    pub fn save(&self) -> CoreResult<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, &self.doc)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path).map_err(|e| CoreError::Io(e.error))?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[AssetRecord] {
        &self.doc.videos
    }

    pub fn len(&self) -> usize {
        self.doc.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc.videos.is_empty()
    }

    /// Appends a new record, enforcing content-hash uniqueness. This is
    /// the only way records enter the catalog.
    pub fn append(&mut self, record: AssetRecord) -> CoreResult<()> {
        if self
            .doc
            .videos
            .iter()
            .any(|r| r.content_hash == record.content_hash)
        {
            return Err(CoreError::Catalog(format!(
                "record with content hash {} already exists",
                record.content_hash
            )));
        }
        self.doc.videos.push(record);
        Ok(())
    }

    /// Mutable access to records still awaiting a terminal remote state.
    pub fn pending_mut(&mut self) -> impl Iterator<Item = &mut AssetRecord> {
        self.doc
            .videos
            .iter_mut()
            .filter(|r| !r.remote_state.is_terminal())
    }

    /// Count of records not yet in a terminal remote state.
    pub fn pending_count(&self) -> usize {
        self.doc
            .videos
            .iter()
            .filter(|r| !r.remote_state.is_terminal())
            .count()
    }
}

/// O(1) content-hash membership view over the catalog, used to
/// short-circuit repeat ingestion before any provider is contacted.
#[derive(Debug, Default)]
pub struct DedupLedger {
    hashes: HashSet<String>,
}

impl DedupLedger {
    pub fn from_catalog(catalog: &Catalog) -> Self {
        Self {
            hashes: catalog
                .records()
                .iter()
                .map(|r| r.content_hash.clone())
                .collect(),
        }
    }

    pub fn contains(&self, content_hash: &str) -> bool {
        self.hashes.contains(content_hash)
    }

    /// Records a hash appended during the current run so identical
    /// files within one batch dedup against each other.
    pub fn insert(&mut self, content_hash: String) {
        self.hashes.insert(content_hash);
    }
}

/// Exclusive lock over a catalog document.
///
/// Both the ingest and reconcile commands read-modify-write the whole
/// document, so only one of them may run at a time. The lock is a
/// `create_new` sentinel file next to the catalog, removed on drop.
#[derive(Debug)]
pub struct CatalogLock {
    lock_path: PathBuf,
}

impl CatalogLock {
    pub fn acquire(catalog_path: &Path) -> CoreResult<Self> {
        let mut name = catalog_path.as_os_str().to_owned();
        name.push(".lock");
        let lock_path = PathBuf::from(name);

        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(mut file) => {
                // PID inside the lock file helps manual cleanup after a crash.
                let _ = write!(file, "{}", std::process::id());
                Ok(Self { lock_path })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(CoreError::LockHeld(lock_path))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for CatalogLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            log::warn!(
                "Failed to remove catalog lock {}: {}",
                self.lock_path.display(),
                e
            );
        }
    }
}
