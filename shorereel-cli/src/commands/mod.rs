//! Command implementations for the CLI.
//!
//! Each submodule implements one subcommand. Shared here: building the
//! library configuration from arguments and resolving provider
//! credentials from the environment.

use std::path::PathBuf;
use std::time::Duration;

use shorereel_core::publish::mux::MUX_API_BASE;
use shorereel_core::{CoreConfig, CoreError, MuxHost};

use crate::cli::{IngestArgs, ReconcileArgs};
use crate::error::CliResult;

pub mod fetch;
pub mod ingest;
pub mod reconcile;

/// Builds the library configuration from a root plus optional catalog
/// override, and validates it (the intake directory must exist;
/// holding areas are created on demand).
pub fn build_config(library: &PathBuf, catalog: Option<&PathBuf>) -> CliResult<CoreConfig> {
    let mut config = CoreConfig::for_library(library.clone());
    if let Some(path) = catalog {
        config.catalog_path = path.clone();
    }
    config.validate()?;
    Ok(config)
}

impl IngestArgs {
    pub fn to_config(&self) -> CliResult<CoreConfig> {
        build_config(&self.library, self.catalog.as_ref())
    }
}

impl ReconcileArgs {
    pub fn to_config(&self) -> CliResult<CoreConfig> {
        build_config(&self.library, self.catalog.as_ref())
    }
}

fn require_env(name: &str) -> CliResult<String> {
    std::env::var(name)
        .map_err(|_| CoreError::Config(format!("environment variable {name} is not set")))
}

/// The required primary provider, from `MUX_TOKEN_ID`/`MUX_TOKEN_SECRET`.
pub fn primary_host(config: &CoreConfig) -> CliResult<MuxHost> {
    let token_id = require_env("MUX_TOKEN_ID")?;
    let token_secret = require_env("MUX_TOKEN_SECRET")?;
    MuxHost::new(
        "mux",
        MUX_API_BASE,
        token_id,
        token_secret,
        Duration::from_secs(config.http_timeout_secs),
        Duration::from_secs(config.upload_timeout_secs),
    )
}

/// The optional best-effort mirror. Configured entirely by environment:
/// absent `SHOREREEL_MIRROR_URL` means no mirror; once the URL is set,
/// the mirror token pair is required.
pub fn mirror_host(config: &CoreConfig) -> CliResult<Option<MuxHost>> {
    let Ok(base_url) = std::env::var("SHOREREEL_MIRROR_URL") else {
        return Ok(None);
    };
    let token_id = require_env("SHOREREEL_MIRROR_TOKEN_ID")?;
    let token_secret = require_env("SHOREREEL_MIRROR_TOKEN_SECRET")?;
    let host = MuxHost::new(
        "mirror",
        base_url,
        token_id,
        token_secret,
        Duration::from_secs(config.http_timeout_secs),
        Duration::from_secs(config.upload_timeout_secs),
    )?;
    Ok(Some(host))
}
