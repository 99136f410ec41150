//! Candidate directory verification against the NAS.
//!
//! Walks candidates in order, short-circuiting on the first directory
//! that exists and contains at least one recognized artifact file. Every
//! transport operation runs under the shared retry policy and a per-op
//! timeout so a single slow candidate cannot eat the whole resolve budget.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{AppError, Result};
use crate::models::{classify, ArtifactFile, ComponentType, PathCandidate};
use crate::nas::NasTransport;
use crate::retry::{with_retry, RetryPolicy};

/// A verified candidate with its file listing.
#[derive(Debug, Clone)]
pub struct VerifiedPath {
    pub candidate: PathCandidate,
    pub files: Vec<ArtifactFile>,
    /// The primary/main artifact filename, when one was recognized
    pub download_file: Option<String>,
}

pub struct ArtifactVerifier {
    transport: Arc<dyn NasTransport>,
    retry: RetryPolicy,
    op_timeout: Duration,
}

impl ArtifactVerifier {
    pub fn new(transport: Arc<dyn NasTransport>, retry: RetryPolicy, op_timeout: Duration) -> Self {
        Self {
            transport,
            retry,
            op_timeout,
        }
    }

    /// Verify candidates in order; return the first that holds recognized
    /// artifact files.
    pub async fn verify_first(
        &self,
        candidates: &[PathCandidate],
        version: &str,
    ) -> Result<VerifiedPath> {
        self.verify(candidates, version, None).await
    }

    /// Legacy-fallback variant: the listing must contain at least one of
    /// the exact filenames scraped from the CI console log.
    pub async fn verify_first_containing(
        &self,
        candidates: &[PathCandidate],
        version: &str,
        required: &[String],
    ) -> Result<VerifiedPath> {
        self.verify(candidates, version, Some(required)).await
    }

    async fn verify(
        &self,
        candidates: &[PathCandidate],
        version: &str,
        required: Option<&[String]>,
    ) -> Result<VerifiedPath> {
        let mut diagnostics = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            let started = Instant::now();
            match self.check_candidate(candidate, version, required).await {
                Ok(Some(verified)) => {
                    tracing::info!(
                        path = %candidate.nas_path,
                        files = verified.files.len(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Candidate verified"
                    );
                    return Ok(verified);
                }
                Ok(None) => {
                    tracing::debug!(
                        path = %candidate.nas_path,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Candidate not found"
                    );
                    diagnostics.push(format!("{} (not found)", candidate.nas_path));
                }
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.nas_path,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        error = %e,
                        "Candidate check failed"
                    );
                    diagnostics.push(format!("{} (error: {})", candidate.nas_path, e));
                }
            }
        }

        Err(AppError::NotFound(format!(
            "No candidate directory verified for version {}; tried: [{}]",
            version,
            diagnostics.join(", ")
        )))
    }

    /// Check a single candidate. `Ok(None)` means "keep looking": the
    /// directory is absent, or exists without recognized files.
    async fn check_candidate(
        &self,
        candidate: &PathCandidate,
        version: &str,
        required: Option<&[String]>,
    ) -> Result<Option<VerifiedPath>> {
        let path = candidate.nas_path.as_str();

        let exists = with_retry(&self.retry, "nas.dir_exists", || {
            self.bounded(self.transport.dir_exists(path))
        })
        .await?;
        if !exists {
            return Ok(None);
        }

        let entries = with_retry(&self.retry, "nas.list_dir", || {
            self.bounded(self.transport.list_dir(path))
        })
        .await?;

        let files: Vec<ArtifactFile> = entries
            .into_iter()
            .map(|e| ArtifactFile {
                component: classify(&e.name, version),
                filename: e.name,
                size: e.size,
                last_modified: e.modified,
            })
            .collect();

        let eligible: Vec<&ArtifactFile> = match required {
            Some(names) => files
                .iter()
                .filter(|f| names.iter().any(|n| n == &f.filename))
                .collect(),
            None => files.iter().filter(|f| f.component.is_recognized()).collect(),
        };

        if eligible.is_empty() {
            // Exists but holds nothing we recognize; treat as not found.
            return Ok(None);
        }

        let download_file = eligible
            .iter()
            .find(|f| f.component == ComponentType::Main)
            .or_else(|| eligible.first())
            .map(|f| f.filename.clone());

        Ok(Some(VerifiedPath {
            candidate: candidate.clone(),
            files,
            download_file,
        }))
    }

    /// Bound a single transport attempt; elapse classifies as transient
    /// so the retry policy re-attempts it.
    async fn bounded<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.op_timeout, fut)
            .await
            .map_err(|_| {
                AppError::Transient(format!(
                    "NAS operation timed out after {}ms",
                    self.op_timeout.as_millis()
                ))
            })?
    }
}
