//! Persistent cache of resolved artifact paths.
//!
//! One row per (project, version, build); upserts converge concurrent
//! discoveries onto the table's uniqueness constraint. Connection-class
//! errors go through the shared retry policy; validation and constraint
//! errors fail on the first attempt.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::error::{AppError, Result};
use crate::models::{ArtifactPathRecord, NewArtifactPath};
use crate::retry::{with_retry, RetryPolicy};

const RECORD_COLUMNS: &str = "id, project_name, version, build_number, nas_path, download_file, \
     all_files, build_date, verified_at, created_at, updated_at";

/// Store of cached path records.
#[async_trait]
pub trait PathStore: Send + Sync {
    /// Look up a record by its unique key
    async fn find(
        &self,
        project_name: &str,
        version: &str,
        build_number: i32,
    ) -> Result<Option<ArtifactPathRecord>>;

    /// Insert or refresh a record; refresh updates all fields and
    /// `verified_at`
    async fn upsert(&self, input: &NewArtifactPath) -> Result<ArtifactPathRecord>;

    /// Most-recently-verified records
    async fn list_recent(&self, limit: i64) -> Result<Vec<ArtifactPathRecord>>;

    /// Retention sweep; returns the number of rows removed
    async fn delete_older_than(&self, age: chrono::Duration) -> Result<u64>;
}

/// Postgres-backed path store
pub struct PgPathStore {
    db: PgPool,
    retry: RetryPolicy,
}

impl PgPathStore {
    pub fn new(db: PgPool, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }
}

#[async_trait]
impl PathStore for PgPathStore {
    async fn find(
        &self,
        project_name: &str,
        version: &str,
        build_number: i32,
    ) -> Result<Option<ArtifactPathRecord>> {
        if build_number < 0 {
            return Err(AppError::Validation(
                "Build number must be non-negative".to_string(),
            ));
        }

        with_retry(&self.retry, "db.find_path", || async {
            sqlx::query_as::<_, ArtifactPathRecord>(&format!(
                "SELECT {RECORD_COLUMNS} FROM artifact_paths \
                 WHERE project_name = $1 AND version = $2 AND build_number = $3"
            ))
            .bind(project_name)
            .bind(version)
            .bind(build_number)
            .fetch_optional(&self.db)
            .await
            .map_err(AppError::from_sqlx)
        })
        .await
    }

    async fn upsert(&self, input: &NewArtifactPath) -> Result<ArtifactPathRecord> {
        // Fail fast on bad input before any round-trip; never retried.
        input.validate()?;

        with_retry(&self.retry, "db.upsert_path", || async {
            sqlx::query_as::<_, ArtifactPathRecord>(&format!(
                r#"
                INSERT INTO artifact_paths
                    (project_name, version, build_number, nas_path, download_file,
                     all_files, build_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (project_name, version, build_number) DO UPDATE SET
                    nas_path = EXCLUDED.nas_path,
                    download_file = EXCLUDED.download_file,
                    all_files = EXCLUDED.all_files,
                    build_date = EXCLUDED.build_date,
                    verified_at = NOW(),
                    updated_at = NOW()
                RETURNING {RECORD_COLUMNS}
                "#
            ))
            .bind(&input.project_name)
            .bind(&input.version)
            .bind(input.build_number)
            .bind(&input.nas_path)
            .bind(&input.download_file)
            .bind(Json(input.all_files.clone()))
            .bind(input.build_date)
            .fetch_one(&self.db)
            .await
            .map_err(AppError::from_sqlx)
        })
        .await
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<ArtifactPathRecord>> {
        with_retry(&self.retry, "db.list_recent", || async {
            sqlx::query_as::<_, ArtifactPathRecord>(&format!(
                "SELECT {RECORD_COLUMNS} FROM artifact_paths \
                 ORDER BY verified_at DESC LIMIT $1"
            ))
            .bind(limit)
            .fetch_all(&self.db)
            .await
            .map_err(AppError::from_sqlx)
        })
        .await
    }

    async fn delete_older_than(&self, age: chrono::Duration) -> Result<u64> {
        let cutoff = Utc::now() - age;

        with_retry(&self.retry, "db.retention_sweep", || async {
            let result = sqlx::query("DELETE FROM artifact_paths WHERE verified_at < $1")
                .bind(cutoff)
                .execute(&self.db)
                .await
                .map_err(AppError::from_sqlx)?;
            Ok(result.rows_affected())
        })
        .await
    }
}
