//! Artifact file classification.
//!
//! Files are classified by filename prefix against the release version;
//! content is never inspected.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Role of a file within a published build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
    /// Main release bundle, `V<version>_...`
    Main,
    /// Morrow bundle, `mr<version>...`
    Morrow,
    /// Backend bundle, `be<version>...`
    Backend,
    /// Frontend bundle, `fe<version>...`
    Frontend,
    /// Fullstack bundle, `fs<version>...`
    Fullstack,
    /// Present in the directory but not a recognized component
    Other,
}

impl ComponentType {
    /// Whether this file counts toward verifying a candidate directory.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, ComponentType::Other)
    }
}

/// A file found in a candidate directory.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactFile {
    pub filename: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
    pub component: ComponentType,
}

/// Classify a filename by its prefix for the given version.
pub fn classify(filename: &str, version: &str) -> ComponentType {
    if filename.starts_with(&format!("V{version}_")) {
        ComponentType::Main
    } else if filename.starts_with(&format!("mr{version}")) {
        ComponentType::Morrow
    } else if filename.starts_with(&format!("be{version}")) {
        ComponentType::Backend
    } else if filename.starts_with(&format!("fe{version}")) {
        ComponentType::Frontend
    } else if filename.starts_with(&format!("fs{version}")) {
        ComponentType::Fullstack
    } else {
        ComponentType::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_main_bundle() {
        assert_eq!(
            classify("V3.0.0_250310_26.tar.gz", "3.0.0"),
            ComponentType::Main
        );
    }

    #[test]
    fn classifies_morrow_bundle() {
        assert_eq!(
            classify("mr3.0.0_250310_26.tar.gz", "3.0.0"),
            ComponentType::Morrow
        );
    }

    #[test]
    fn classifies_backend_bundle() {
        assert_eq!(
            classify("be3.0.0_250310_26.tar.gz", "3.0.0"),
            ComponentType::Backend
        );
    }

    #[test]
    fn classifies_frontend_bundle() {
        assert_eq!(
            classify("fe3.0.0_250310_26.tar.gz", "3.0.0"),
            ComponentType::Frontend
        );
    }

    #[test]
    fn classifies_fullstack_bundle() {
        assert_eq!(
            classify("fs3.0.0_250310_26.tar.gz", "3.0.0"),
            ComponentType::Fullstack
        );
    }

    #[test]
    fn unrecognized_file_is_other() {
        assert_eq!(classify("randomfile.txt", "3.0.0"), ComponentType::Other);
        assert!(!classify("randomfile.txt", "3.0.0").is_recognized());
    }

    #[test]
    fn version_mismatch_is_other() {
        // A main bundle for a different release must not verify this one.
        assert_eq!(
            classify("V2.9.0_250310_26.tar.gz", "3.0.0"),
            ComponentType::Other
        );
    }

    #[test]
    fn main_requires_underscore_after_version() {
        // "V3.0.0beta..." is not the main bundle for 3.0.0
        assert_eq!(
            classify("V3.0.0beta_250310.tar.gz", "3.0.0"),
            ComponentType::Other
        );
    }
}
