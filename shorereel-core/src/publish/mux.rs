//! Mux Direct Uploads implementation of the [`VideoHost`] capability.
//!
//! Wire format: `POST /video/v1/uploads` creates a direct-upload
//! session whose URL receives the file bytes in one PUT;
//! `GET /video/v1/uploads/{id}` reveals the asset id once Mux assigns
//! it; `GET /video/v1/assets/{id}` reports transcode status and
//! playback ids. All management calls use HTTP basic auth with the
//! access-token pair.
//!
//! The base URL and host name are configurable so a second instance of
//! this type can serve as the best-effort mirror provider against any
//! API-compatible endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::error::{provider_error, CoreResult};
use crate::publish::{RemoteStatus, UploadSession, VideoHost};

/// Default Mux API endpoint.
pub const MUX_API_BASE: &str = "https://api.mux.com";

#[derive(Debug, Clone)]
pub struct MuxHost {
    name: String,
    base_url: String,
    token_id: String,
    token_secret: String,
    /// Client for session/status calls (short per-call timeout).
    client: Client,
    /// Client for the bulk upload PUT (its own, larger budget).
    upload_client: Client,
}

impl MuxHost {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        token_id: impl Into<String>,
        token_secret: impl Into<String>,
        http_timeout: Duration,
        upload_timeout: Duration,
    ) -> CoreResult<Self> {
        let client = Client::builder().timeout(http_timeout).build()?;
        let upload_client = Client::builder().timeout(upload_timeout).build()?;
        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token_id: token_id.into(),
            token_secret: token_secret.into(),
            client,
            upload_client,
        })
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct CreateUploadRequest {
    new_asset_settings: NewAssetSettings,
}

#[derive(Debug, Serialize)]
struct NewAssetSettings {
    playback_policy: Vec<String>,
    video_quality: String,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UploadData {
    id: String,
    url: Option<String>,
    asset_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssetData {
    status: String,
    #[serde(default)]
    playback_ids: Vec<PlaybackId>,
}

#[derive(Debug, Deserialize)]
struct PlaybackId {
    id: String,
}

fn status_from_asset(asset: &AssetData) -> RemoteStatus {
    match asset.status.as_str() {
        "ready" => match asset.playback_ids.first() {
            Some(playback) => RemoteStatus::Ready {
                playback_id: playback.id.clone(),
            },
            // Ready without a playback id is not yet playable; keep
            // polling rather than cataloging a ready asset with no stream.
            None => RemoteStatus::Preparing,
        },
        "errored" => RemoteStatus::Errored,
        _ => RemoteStatus::Preparing,
    }
}

impl VideoHost for MuxHost {
    fn name(&self) -> &str {
        &self.name
    }

    fn create_upload(&self) -> CoreResult<UploadSession> {
        let body = CreateUploadRequest {
            new_asset_settings: NewAssetSettings {
                playback_policy: vec!["public".to_string()],
                video_quality: "plus".to_string(),
            },
        };
        let resp = self
            .client
            .post(format!("{}/video/v1/uploads", self.base_url))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&body)
            .send()?;
        if !resp.status().is_success() {
            return Err(provider_error(
                &self.name,
                format!("upload creation returned {}", resp.status()),
            ));
        }

        let envelope: DataEnvelope<UploadData> = resp.json()?;
        let upload_url = envelope.data.url.ok_or_else(|| {
            provider_error(&self.name, "upload session is missing its upload URL")
        })?;
        Ok(UploadSession {
            session_id: envelope.data.id,
            upload_url,
            asset_id: envelope.data.asset_id,
        })
    }

    fn push_bytes(&self, upload_url: &str, bytes: &[u8]) -> CoreResult<()> {
        let resp = self
            .upload_client
            .put(upload_url)
            .header("Content-Type", "video/mp4")
            .body(bytes.to_vec())
            .send()?;
        if !resp.status().is_success() {
            return Err(provider_error(
                &self.name,
                format!("byte upload returned {}", resp.status()),
            ));
        }
        Ok(())
    }

    fn resolve_upload(&self, session_id: &str) -> CoreResult<Option<String>> {
        let resp = self
            .client
            .get(format!("{}/video/v1/uploads/{}", self.base_url, session_id))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()?;
        if !resp.status().is_success() {
            return Err(provider_error(
                &self.name,
                format!("upload lookup returned {}", resp.status()),
            ));
        }
        let envelope: DataEnvelope<UploadData> = resp.json()?;
        Ok(envelope.data.asset_id)
    }

    fn asset_status(&self, asset_id: &str) -> CoreResult<RemoteStatus> {
        let resp = self
            .client
            .get(format!("{}/video/v1/assets/{}", self.base_url, asset_id))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .send()?;
        if !resp.status().is_success() {
            return Err(provider_error(
                &self.name,
                format!("asset lookup returned {}", resp.status()),
            ));
        }
        let envelope: DataEnvelope<AssetData> = resp.json()?;
        Ok(status_from_asset(&envelope.data))
    }
}
