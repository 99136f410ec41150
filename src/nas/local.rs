//! Local filesystem NAS transport.
//!
//! Maps share paths under a local root directory. Non-production
//! substitute with the same interface as the SMB transport.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tokio::fs;

use super::{NasEntry, NasTransport};
use crate::error::Result;

/// Filesystem-backed NAS transport
pub struct LocalFsTransport {
    root: PathBuf,
}

impl LocalFsTransport {
    /// Create a transport rooted at a local directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a share path to a local path under the root
    fn to_local(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl NasTransport for LocalFsTransport {
    async fn dir_exists(&self, path: &str) -> Result<bool> {
        match fs::metadata(self.to_local(path)).await {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_dir(&self, path: &str) -> Result<Vec<NasEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(self.to_local(path)).await?;

        while let Some(entry) = dir.next_entry().await? {
            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().ok().map(DateTime::<Utc>::from);
            entries.push(NasEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: meta.len(),
                modified,
            });
        }

        // Directory listings from the share are name-ordered; match that.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dir_exists_and_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("release/product/mr3.0.0/250310/26");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("V3.0.0_250310_0843.tar.gz"), b"bundle").unwrap();
        std::fs::write(dir.join("notes.txt"), b"notes").unwrap();

        let transport = LocalFsTransport::new(tmp.path());

        assert!(transport
            .dir_exists("/release/product/mr3.0.0/250310/26")
            .await
            .unwrap());
        assert!(!transport
            .dir_exists("/release/product/mr3.0.0/250311/26")
            .await
            .unwrap());

        let entries = transport
            .list_dir("/release/product/mr3.0.0/250310/26")
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "V3.0.0_250310_0843.tar.gz");
        assert_eq!(entries[0].size, 6);
    }

    #[tokio::test]
    async fn subdirectories_are_excluded_from_listing() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("release/product/mr3.0.0/250310/26");
        std::fs::create_dir_all(dir.join("logs")).unwrap();
        std::fs::write(dir.join("be3.0.0_250310_26.tar.gz"), b"x").unwrap();

        let transport = LocalFsTransport::new(tmp.path());
        let entries = transport
            .list_dir("/release/product/mr3.0.0/250310/26")
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "be3.0.0_250310_26.tar.gz");
    }
}
