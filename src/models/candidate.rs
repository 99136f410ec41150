//! Candidate NAS directory paths.

use chrono::NaiveDate;
use serde::Serialize;

/// A guessed NAS directory that may hold the artifacts for a build.
/// Transient; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathCandidate {
    /// NAS-native directory path, `<base>/<versionFolder>/<YYMMDD>/<build>`
    pub nas_path: String,
    /// Fixed 6-digit YYMMDD folder name
    pub date_folder: String,
    /// Build number component of the path
    pub build_number: i32,
    /// The date the folder name encodes
    pub date: NaiveDate,
}
