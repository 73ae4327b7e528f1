//! Remote publishing: polymorphic upload of source files to
//! video-hosting providers.
//!
//! The pipeline talks to providers only through the [`VideoHost`]
//! capability trait. The primary provider is required; a mirror
//! provider is best-effort, and its failure merely omits that
//! provider's reference from the catalog record.

use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::ProviderRef;
use crate::error::CoreResult;

pub mod mux;

pub use mux::MuxHost;

/// A freshly created upload session at a provider.
#[derive(Debug, Clone)]
pub struct UploadSession {
    /// Provider's opaque upload-session id.
    pub session_id: String,
    /// One-shot URL the file bytes are PUT to.
    pub upload_url: String,
    /// Asset id, when the provider assigns one synchronously.
    pub asset_id: Option<String>,
}

/// Provider-reported transcode status of an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Preparing,
    Ready { playback_id: String },
    Errored,
}

/// Capability surface of a remote video-hosting provider.
pub trait VideoHost {
    /// Stable provider name; the key under `providerRefs`.
    fn name(&self) -> &str;

    /// Creates an upload session for one new asset.
    fn create_upload(&self) -> CoreResult<UploadSession>;

    /// Pushes the full source file in a single bulk transfer. There is
    /// no resumability at this layer; a transport failure is terminal
    /// for this provider for this file.
    fn push_bytes(&self, upload_url: &str, bytes: &[u8]) -> CoreResult<()>;

    /// Asks whether the provider has assigned an asset id to an upload
    /// session yet. `Ok(None)` means "not yet", which is not an error.
    fn resolve_upload(&self, session_id: &str) -> CoreResult<Option<String>>;

    /// Queries the transcode status of a known asset.
    fn asset_status(&self, asset_id: &str) -> CoreResult<RemoteStatus>;
}

/// Result of publishing one file to the configured providers.
#[derive(Debug)]
pub struct PublishOutcome {
    /// Provider name -> identifiers, merged into the catalog record.
    pub provider_refs: BTreeMap<String, ProviderRef>,
    /// Asset id from the primary provider, when assigned synchronously.
    pub primary_asset_id: Option<String>,
}

/// Uploads `path` to the primary provider and, best-effort, to the
/// mirror. Primary failure propagates; mirror failure is logged and
/// its reference omitted.
pub fn publish_file(
    primary: &dyn VideoHost,
    mirror: Option<&dyn VideoHost>,
    path: &Path,
) -> CoreResult<PublishOutcome> {
    let bytes = std::fs::read(path)?;

    let session = primary.create_upload()?;
    primary.push_bytes(&session.upload_url, &bytes)?;
    log::info!(
        "Uploaded {} to {} (upload {})",
        path.display(),
        primary.name(),
        session.session_id
    );

    let mut provider_refs = BTreeMap::new();
    provider_refs.insert(
        primary.name().to_string(),
        ProviderRef {
            upload_id: session.session_id,
            asset_id: session.asset_id.clone(),
        },
    );

    if let Some(mirror) = mirror {
        match mirror
            .create_upload()
            .and_then(|s| mirror.push_bytes(&s.upload_url, &bytes).map(|()| s))
        {
            Ok(s) => {
                log::info!(
                    "Mirrored {} to {} (upload {})",
                    path.display(),
                    mirror.name(),
                    s.session_id
                );
                provider_refs.insert(
                    mirror.name().to_string(),
                    ProviderRef {
                        upload_id: s.session_id,
                        asset_id: s.asset_id,
                    },
                );
            }
            Err(e) => {
                log::warn!(
                    "Mirror provider {} failed for {}: {}; continuing without it",
                    mirror.name(),
                    path.display(),
                    e
                );
            }
        }
    }

    Ok(PublishOutcome {
        primary_asset_id: session.asset_id,
        provider_refs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::provider_error;

    struct StaticHost {
        name: &'static str,
        fail_upload: bool,
        asset_id: Option<&'static str>,
    }

    impl VideoHost for StaticHost {
        fn name(&self) -> &str {
            self.name
        }

        fn create_upload(&self) -> CoreResult<UploadSession> {
            if self.fail_upload {
                return Err(provider_error(self.name, "upload refused"));
            }
            Ok(UploadSession {
                session_id: format!("{}-upload", self.name),
                upload_url: "https://upload.example/slot".to_string(),
                asset_id: self.asset_id.map(String::from),
            })
        }

        fn push_bytes(&self, _upload_url: &str, _bytes: &[u8]) -> CoreResult<()> {
            Ok(())
        }

        fn resolve_upload(&self, _session_id: &str) -> CoreResult<Option<String>> {
            Ok(None)
        }

        fn asset_status(&self, _asset_id: &str) -> CoreResult<RemoteStatus> {
            Ok(RemoteStatus::Preparing)
        }
    }

    fn temp_source() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"video bytes").unwrap();
        (dir, path)
    }

    #[test]
    fn primary_and_mirror_refs_are_combined() {
        let (_dir, path) = temp_source();
        let primary = StaticHost { name: "mux", fail_upload: false, asset_id: Some("asset-1") };
        let mirror = StaticHost { name: "mirror", fail_upload: false, asset_id: None };

        let outcome = publish_file(&primary, Some(&mirror), &path).unwrap();
        assert_eq!(outcome.primary_asset_id.as_deref(), Some("asset-1"));
        assert_eq!(outcome.provider_refs.len(), 2);
        assert_eq!(outcome.provider_refs["mux"].asset_id.as_deref(), Some("asset-1"));
        assert_eq!(outcome.provider_refs["mirror"].upload_id, "mirror-upload");
    }

    #[test]
    fn mirror_failure_degrades_gracefully() {
        let (_dir, path) = temp_source();
        let primary = StaticHost { name: "mux", fail_upload: false, asset_id: None };
        let mirror = StaticHost { name: "mirror", fail_upload: true, asset_id: None };

        let outcome = publish_file(&primary, Some(&mirror), &path).unwrap();
        assert_eq!(outcome.provider_refs.len(), 1);
        assert!(outcome.provider_refs.contains_key("mux"));
    }

    #[test]
    fn primary_failure_is_terminal() {
        let (_dir, path) = temp_source();
        let primary = StaticHost { name: "mux", fail_upload: true, asset_id: None };
        assert!(publish_file(&primary, None, &path).is_err());
    }
}
