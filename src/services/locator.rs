//! Artifact path resolution orchestrator.
//!
//! Cache-aside fallback chain: PathStore -> BuildClock + candidates +
//! verification -> PathStore write-back, with a console-log scraping
//! fallback when the primary discovery chain fails or overruns its
//! ceiling. Stages run strictly in sequence; concurrent callers for the
//! same key may duplicate discovery work and converge via upsert.

use chrono::Utc;
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{classify, ArtifactPathRecord, NewArtifactPath};
use crate::services::build_clock::BuildClock;
use crate::services::candidates::{CandidateGenerator, DateHint};
use crate::services::failure_monitor::FailureMonitor;
use crate::services::path_store::PathStore;
use crate::services::verifier::{ArtifactVerifier, VerifiedPath};

static TARBALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9][\w.\-]*\.tar\.gz").expect("tarball regex"));

static DATE_SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d{6})_").expect("date segment regex"));

pub struct Locator {
    store: Arc<dyn PathStore>,
    clock: Arc<dyn BuildClock>,
    generator: CandidateGenerator,
    verifier: ArtifactVerifier,
    monitor: Arc<FailureMonitor>,
    ceiling: Duration,
}

impl Locator {
    pub fn new(
        store: Arc<dyn PathStore>,
        clock: Arc<dyn BuildClock>,
        generator: CandidateGenerator,
        verifier: ArtifactVerifier,
        monitor: Arc<FailureMonitor>,
        ceiling: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            generator,
            verifier,
            monitor,
            ceiling,
        }
    }

    /// Resolve the NAS path for a build. Every outcome, including
    /// internally absorbed stage failures, is reported to the failure
    /// monitor so alerting reflects end-to-end health.
    pub async fn resolve(
        &self,
        project_name: &str,
        version: &str,
        build_number: i32,
    ) -> Result<ArtifactPathRecord> {
        let result = self.resolve_inner(project_name, version, build_number).await;

        match &result {
            Ok(_) => self.monitor.record_success(),
            Err(e) => {
                self.monitor
                    .record_failure(&format!(
                        "{}/{}#{}: {}",
                        project_name, version, build_number, e
                    ))
                    .await
            }
        }

        result
    }

    async fn resolve_inner(
        &self,
        project_name: &str,
        version: &str,
        build_number: i32,
    ) -> Result<ArtifactPathRecord> {
        // Validation stage: reject before any cache or network round-trip.
        if project_name.is_empty() || version.is_empty() {
            return Err(AppError::Validation(
                "Project name and version are required".to_string(),
            ));
        }
        if build_number < 0 {
            return Err(AppError::Validation(
                "Build number must be non-negative".to_string(),
            ));
        }

        // Cache stage; a read failure must not mask an artifact that is
        // present and verifiable on the NAS.
        match self.store.find(project_name, version, build_number).await {
            Ok(Some(record)) => {
                tracing::debug!(
                    project = project_name,
                    version,
                    build = build_number,
                    nas_path = %record.nas_path,
                    "Cache hit"
                );
                return Ok(record);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(
                    project = project_name,
                    build = build_number,
                    error = %e,
                    "Cache lookup failed, continuing with discovery"
                );
            }
        }

        // Discovery + verification under the hard ceiling. A breach falls
        // through to the legacy path instead of hanging.
        let primary = match tokio::time::timeout(
            self.ceiling,
            self.discover(project_name, version, build_number),
        )
        .await
        {
            Ok(Ok(verified)) => Ok(verified),
            Ok(Err(e)) => {
                tracing::warn!(
                    project = project_name,
                    build = build_number,
                    error = %e,
                    "Primary discovery failed, trying console-log fallback"
                );
                Err(e.to_string())
            }
            Err(_) => {
                tracing::warn!(
                    project = project_name,
                    build = build_number,
                    ceiling_ms = self.ceiling.as_millis() as u64,
                    "Resolve ceiling breached, trying console-log fallback"
                );
                Err(format!("ceiling of {}ms breached", self.ceiling.as_millis()))
            }
        };

        let verified = match primary {
            Ok(verified) => verified,
            Err(primary_error) => {
                self.legacy_fallback(project_name, version, build_number, &primary_error)
                    .await?
            }
        };

        // Persistence stage: a write failure must not fail the call.
        let input = NewArtifactPath {
            project_name: project_name.to_string(),
            version: version.to_string(),
            build_number,
            nas_path: verified.candidate.nas_path.clone(),
            download_file: verified.download_file.clone(),
            all_files: verified.files.iter().map(|f| f.filename.clone()).collect(),
            build_date: verified.candidate.date,
        };

        match self.store.upsert(&input).await {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(
                    project = project_name,
                    build = build_number,
                    error = %e,
                    "Failed to persist resolved path; returning unsaved record"
                );
                Ok(Self::unsaved_record(input))
            }
        }
    }

    /// Discovery + candidate + verification stages.
    async fn discover(
        &self,
        project_name: &str,
        version: &str,
        build_number: i32,
    ) -> Result<VerifiedPath> {
        let hint = match self.clock.build_timestamp(project_name, build_number).await {
            Ok(ts) => {
                tracing::debug!(
                    project = project_name,
                    build = build_number,
                    timestamp = %ts,
                    "CI build timestamp resolved"
                );
                DateHint::Exact(ts)
            }
            Err(e) => {
                // Hint unavailable is non-fatal; widen to a date window.
                tracing::warn!(
                    project = project_name,
                    build = build_number,
                    error = %e,
                    "CI timestamp unavailable, using date-window guess"
                );
                DateHint::Window(Utc::now().date_naive())
            }
        };

        let candidates = self.generator.generate(version, build_number, &hint);
        self.verifier.verify_first(&candidates, version).await
    }

    /// Secondary discovery: scrape the build console log for artifact
    /// filenames, derive their date folders, and re-verify requiring
    /// those exact names.
    async fn legacy_fallback(
        &self,
        project_name: &str,
        version: &str,
        build_number: i32,
        primary_error: &str,
    ) -> Result<VerifiedPath> {
        let console = self
            .clock
            .console_log(project_name, build_number)
            .await
            .map_err(|e| {
                AppError::NotFound(format!(
                    "Primary discovery failed ({}); console log unavailable: {}",
                    primary_error, e
                ))
            })?;

        let filenames = scrape_artifact_filenames(&console, version);
        if filenames.is_empty() {
            return Err(AppError::NotFound(format!(
                "Primary discovery failed ({}); console log names no recognizable artifacts",
                primary_error
            )));
        }

        let dates = dates_from_filenames(&filenames);
        let candidates = if dates.is_empty() {
            self.generator.generate(
                version,
                build_number,
                &DateHint::Window(Utc::now().date_naive()),
            )
        } else {
            self.generator.for_dates(version, build_number, &dates)
        };

        self.verifier
            .verify_first_containing(&candidates, version, &filenames)
            .await
            .map_err(|e| {
                AppError::NotFound(format!(
                    "Primary discovery failed ({}); console-log fallback failed: {}",
                    primary_error, e
                ))
            })
    }

    /// Record returned when verification succeeded but the write-back
    /// did not. Timestamps are synthesized; the next successful resolve
    /// persists the real row.
    fn unsaved_record(input: NewArtifactPath) -> ArtifactPathRecord {
        let now = Utc::now();
        ArtifactPathRecord {
            id: Uuid::new_v4(),
            project_name: input.project_name,
            version: input.version,
            build_number: input.build_number,
            nas_path: input.nas_path,
            download_file: input.download_file,
            all_files: sqlx::types::Json(input.all_files),
            build_date: input.build_date,
            verified_at: now,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Pull recognizable artifact filenames for this version out of a build
/// console log, first-seen order, de-duplicated.
pub fn scrape_artifact_filenames(console: &str, version: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in TARBALL_RE.find_iter(console) {
        let name = m.as_str();
        if classify(name, version).is_recognized() && !seen.iter().any(|s| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// Derive publish dates from `_(YYMMDD)_` segments in scraped filenames.
pub fn dates_from_filenames(filenames: &[String]) -> Vec<chrono::NaiveDate> {
    let mut dates = Vec::new();
    for name in filenames {
        for caps in DATE_SEGMENT_RE.captures_iter(name) {
            if let Ok(date) = chrono::NaiveDate::parse_from_str(&caps[1], "%y%m%d") {
                if !dates.contains(&date) {
                    dates.push(date);
                }
            }
        }
    }
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const CONSOLE: &str = "\
[INFO] Packaging release bundle
[INFO] Uploading V3.0.0_250310_0843.tar.gz to //nas/release
[INFO] Uploading be3.0.0_250310_26.tar.gz to //nas/release
[INFO] Uploading V3.0.0_250310_0843.tar.gz finished
[INFO] Wrote build.log and coverage.tar.gz
Finished: SUCCESS
";

    #[test]
    fn scrapes_recognized_filenames_once_each() {
        let names = scrape_artifact_filenames(CONSOLE, "3.0.0");
        assert_eq!(
            names,
            vec![
                "V3.0.0_250310_0843.tar.gz".to_string(),
                "be3.0.0_250310_26.tar.gz".to_string(),
            ]
        );
    }

    #[test]
    fn unrecognized_tarballs_are_ignored() {
        let names = scrape_artifact_filenames("saved coverage.tar.gz only", "3.0.0");
        assert!(names.is_empty());
    }

    #[test]
    fn derives_dates_from_filename_segments() {
        let names = vec![
            "V3.0.0_250310_0843.tar.gz".to_string(),
            "be3.0.0_250311_26.tar.gz".to_string(),
            "fe3.0.0_250310_26.tar.gz".to_string(),
        ];
        let dates = dates_from_filenames(&names);
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
            ]
        );
    }

    #[test]
    fn filenames_without_date_segment_yield_no_dates() {
        let names = vec!["mr3.0.0.tar.gz".to_string()];
        assert!(dates_from_filenames(&names).is_empty());
    }
}
