//! Domain models.

pub mod artifact_file;
pub mod artifact_path;
pub mod candidate;

pub use artifact_file::{classify, ArtifactFile, ComponentType};
pub use artifact_path::{ArtifactPathRecord, NewArtifactPath};
pub use candidate::PathCandidate;
