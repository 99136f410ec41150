//! NAS transport backends.
//!
//! Directory existence checks and listings against the release share.
//! The transport is selected once at startup and stays sticky for the
//! process lifetime; there is no per-call fallback.

pub mod local;
pub mod smb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{AppError, Result};

/// A directory entry returned by a NAS listing.
#[derive(Debug, Clone)]
pub struct NasEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// NAS transport trait
#[async_trait]
pub trait NasTransport: Send + Sync {
    /// Check whether a directory exists on the share
    async fn dir_exists(&self, path: &str) -> Result<bool>;

    /// List the files in a directory (subdirectories excluded)
    async fn list_dir(&self, path: &str) -> Result<Vec<NasEntry>>;
}

/// Select the NAS transport from configuration.
///
/// `local` mode substitutes a directory tree for the share, preserving the
/// same interface (used outside production). `smb` mode drives the
/// smbclient CLI; a session probe runs once here so that connectivity
/// problems surface at startup rather than on the first lookup.
pub async fn select_transport(config: &Config) -> Result<Arc<dyn NasTransport>> {
    match config.nas_mode.as_str() {
        "local" => {
            tracing::info!(root = %config.nas_local_root, "Using local filesystem NAS transport");
            Ok(Arc::new(local::LocalFsTransport::new(
                config.nas_local_root.clone(),
            )))
        }
        "smb" => {
            let transport = smb::SmbCliTransport::from_config(config)?;
            match transport.probe().await {
                Ok(()) => tracing::info!(
                    host = transport.host(),
                    share = transport.share(),
                    "SMB session probe succeeded"
                ),
                Err(e) => tracing::warn!(
                    host = transport.host(),
                    share = transport.share(),
                    error = %e,
                    "SMB session probe failed; lookups will retry per call"
                ),
            }
            Ok(Arc::new(transport))
        }
        other => Err(AppError::Config(format!(
            "Unknown NAS_MODE '{}', expected 'local' or 'smb'",
            other
        ))),
    }
}
