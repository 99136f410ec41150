//! Cached artifact path model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Maximum project name length accepted for storage.
pub const MAX_PROJECT_NAME_LEN: usize = 100;
/// Maximum version string length accepted for storage.
pub const MAX_VERSION_LEN: usize = 20;
/// Upper bound on the serialized file list.
pub const MAX_FILE_LIST_BYTES: usize = 1024 * 1024;

/// A cached (project, version, build) -> NAS path record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ArtifactPathRecord {
    pub id: Uuid,
    pub project_name: String,
    pub version: String,
    pub build_number: i32,
    pub nas_path: String,
    pub download_file: Option<String>,
    pub all_files: Json<Vec<String>>,
    pub build_date: NaiveDate,
    pub verified_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting or refreshing a cached path record.
#[derive(Debug, Clone, Deserialize)]
pub struct NewArtifactPath {
    pub project_name: String,
    pub version: String,
    pub build_number: i32,
    pub nas_path: String,
    pub download_file: Option<String>,
    pub all_files: Vec<String>,
    pub build_date: NaiveDate,
}

impl NewArtifactPath {
    /// Validate field bounds before any write. Violations fail fast and
    /// are never retried.
    pub fn validate(&self) -> Result<()> {
        if self.project_name.is_empty() {
            return Err(AppError::Validation("Project name is required".to_string()));
        }
        if self.project_name.len() > MAX_PROJECT_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Project name exceeds {} characters",
                MAX_PROJECT_NAME_LEN
            )));
        }
        if self.version.is_empty() {
            return Err(AppError::Validation("Version is required".to_string()));
        }
        if self.version.len() > MAX_VERSION_LEN {
            return Err(AppError::Validation(format!(
                "Version exceeds {} characters",
                MAX_VERSION_LEN
            )));
        }
        if self.build_number < 0 {
            return Err(AppError::Validation(
                "Build number must be non-negative".to_string(),
            ));
        }
        if self.nas_path.is_empty() {
            return Err(AppError::Validation("NAS path is required".to_string()));
        }

        // Oversized file lists are rejected outright, not truncated.
        let serialized = serde_json::to_string(&self.all_files)?;
        if serialized.len() > MAX_FILE_LIST_BYTES {
            return Err(AppError::Validation(format!(
                "Serialized file list exceeds {} bytes",
                MAX_FILE_LIST_BYTES
            )));
        }

        Ok(())
    }
}
