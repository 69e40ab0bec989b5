//! Orchestrator error taxonomy.
//!
//! These are the run-fatal conditions: anything that prevents establishing
//! a valid run context. Individual package failures are not errors; they
//! are absorbed into the per-package results.

use std::path::PathBuf;

/// Fatal orchestration errors. Raised before any package starts; a run
/// that hits one produces no partial results.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("build manifest unreadable: {path:?}")]
    ManifestUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("build manifest for release {release} is empty")]
    EmptyManifest { release: String },

    #[error("build tool not found: {program}")]
    BuildToolMissing {
        program: String,
        #[source]
        source: which::Error,
    },
}

/// Result type for orchestration operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest_display() {
        let err = OrchestratorError::EmptyManifest {
            release: "3.16-bioc".to_string(),
        };
        assert!(err.to_string().contains("3.16-bioc"));
    }

    #[test]
    fn test_manifest_unreadable_display() {
        let err = OrchestratorError::ManifestUnreadable {
            path: PathBuf::from("/tmp/missing.txt"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("missing.txt"));
    }
}
