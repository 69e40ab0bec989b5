//! Mirror publishing.
//!
//! Transfers a node's local output directory onto a remote destination
//! with mirror semantics: every local file is uploaded under its relative
//! path, and remote files with no local counterpart are DELETED. The
//! deletion is deliberate and destructive; operators opt in through the
//! confirmation gate or an explicit `--yes`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::confirm::Confirmer;
use crate::transport::{relative_path, Transport};

/// What a publish run did, and what it left undone.
///
/// A complete run has an empty `pending` set; anything else is surfaced
/// as [`PublishError::Incomplete`] for operator remediation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    /// Relative paths uploaded to the destination.
    pub transferred: Vec<String>,

    /// Remote-only relative paths removed by the mirror.
    pub deleted: Vec<String>,

    /// Relative paths not yet attempted when the run ended early.
    pub pending: Vec<String>,
}

impl PublishReport {
    /// Whether every planned transfer and deletion happened.
    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Publishing errors.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The operator declined the confirmation gate. Clean no-op.
    #[error("publish declined by operator")]
    Declined,

    /// The transfer ended early (transport fault or cancellation). The
    /// report says which paths made it and which did not; unaffected
    /// previously-published paths are untouched.
    #[error("mirror transfer incomplete ({cause}): {} transferred, {} pending",
            report.transferred.len(), report.pending.len())]
    Incomplete {
        report: PublishReport,
        cause: String,
    },

    #[error("local artifact directory missing: {path:?}")]
    LocalDirMissing { path: PathBuf },
}

/// Cooperative cancellation handle for a publish in flight.
///
/// Checked between files: cancelling mid-run yields an `Incomplete`
/// report, never a silent success.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One-destination artifact publisher.
pub struct Publisher<T: Transport, C: Confirmer> {
    transport: T,
    confirmer: C,
    cancel: CancelFlag,
}

impl<T: Transport, C: Confirmer> Publisher<T, C> {
    pub fn new(transport: T, confirmer: C) -> Self {
        Self {
            transport,
            confirmer,
            cancel: CancelFlag::new(),
        }
    }

    /// Handle for cancelling a publish from another thread.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mirror `local_dir` onto the destination.
    ///
    /// With `confirm` set, the confirmer must answer affirmatively before
    /// the transport is touched at all; declining aborts with
    /// [`PublishError::Declined`] and performs no transfer. One blocking
    /// call per run, no internal parallelism.
    pub fn publish(&self, local_dir: &Path, confirm: bool) -> Result<PublishReport, PublishError> {
        if !local_dir.is_dir() {
            return Err(PublishError::LocalDirMissing {
                path: local_dir.to_path_buf(),
            });
        }

        let local_files = collect_local_files(local_dir).map_err(|e| PublishError::Incomplete {
            report: PublishReport::default(),
            cause: format!("reading local directory: {e}"),
        })?;

        if confirm {
            let prompt = format!(
                "Mirror {} file(s) from {} to {} (remote-only files will be DELETED). Is that OK?",
                local_files.len(),
                local_dir.display(),
                self.transport.describe()
            );
            if !self.confirmer.confirm(&prompt) {
                info!("publish declined, nothing transferred");
                return Err(PublishError::Declined);
            }
        }

        let remote_files = self.transport.list().map_err(|e| PublishError::Incomplete {
            report: PublishReport {
                pending: local_files.clone(),
                ..PublishReport::default()
            },
            cause: format!("listing destination: {e}"),
        })?;

        let mut to_delete: Vec<String> = remote_files
            .into_iter()
            .filter(|rel| !local_files.contains(rel))
            .collect();
        to_delete.sort();

        info!(
            uploads = local_files.len(),
            deletions = to_delete.len(),
            destination = %self.transport.describe(),
            "starting mirror publish"
        );

        let mut report = PublishReport::default();

        for (idx, rel) in local_files.iter().enumerate() {
            if let Some(cause) = self.interrupted() {
                report.pending = pending_after(&local_files[idx..], &to_delete);
                return Err(PublishError::Incomplete { report, cause });
            }
            let source = join_rel(local_dir, rel);
            if let Err(e) = self.transport.upload(rel, &source) {
                warn!(path = %rel, error = %e, "upload failed");
                report.pending = pending_after(&local_files[idx..], &to_delete);
                return Err(PublishError::Incomplete {
                    report,
                    cause: format!("uploading {rel}: {e}"),
                });
            }
            report.transferred.push(rel.clone());
        }

        for (idx, rel) in to_delete.iter().enumerate() {
            if let Some(cause) = self.interrupted() {
                report.pending = to_delete[idx..].to_vec();
                return Err(PublishError::Incomplete { report, cause });
            }
            if let Err(e) = self.transport.delete(rel) {
                warn!(path = %rel, error = %e, "delete failed");
                report.pending = to_delete[idx..].to_vec();
                return Err(PublishError::Incomplete {
                    report,
                    cause: format!("deleting {rel}: {e}"),
                });
            }
            report.deleted.push(rel.clone());
        }

        info!(
            transferred = report.transferred.len(),
            deleted = report.deleted.len(),
            "mirror publish complete"
        );
        Ok(report)
    }

    fn interrupted(&self) -> Option<String> {
        if self.cancel.is_cancelled() {
            Some("cancelled by caller".to_string())
        } else {
            None
        }
    }
}

/// Sorted relative paths of every file under `local_dir`.
fn collect_local_files(local_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(local_dir) {
        let entry = entry.map_err(std::io::Error::other)?;
        if entry.file_type().is_file() {
            if let Some(rel) = relative_path(local_dir, entry.path()) {
                files.push(rel);
            }
        }
    }
    files.sort();
    Ok(files)
}

fn join_rel(root: &Path, rel: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    path.extend(rel.split('/'));
    path
}

fn pending_after(remaining_uploads: &[String], deletions: &[String]) -> Vec<String> {
    remaining_uploads
        .iter()
        .chain(deletions.iter())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::AssumeYes;
    use crate::transport::FsTransport;

    #[test]
    fn test_publish_without_gate_mirrors_tree() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(local.path().join("src")).unwrap();
        std::fs::write(local.path().join("src/a.tar.gz"), b"a").unwrap();

        let publisher = Publisher::new(FsTransport::new(remote.path()), AssumeYes);
        let report = publisher.publish(local.path(), false).unwrap();

        assert_eq!(report.transferred, vec!["src/a.tar.gz"]);
        assert!(report.is_complete());
        assert!(remote.path().join("src/a.tar.gz").is_file());
    }

    #[test]
    fn test_missing_local_dir() {
        let remote = tempfile::tempdir().unwrap();
        let publisher = Publisher::new(FsTransport::new(remote.path()), AssumeYes);

        let err = publisher
            .publish(Path::new("/nonexistent/artifacts"), false)
            .unwrap_err();
        assert!(matches!(err, PublishError::LocalDirMissing { .. }));
    }

    #[test]
    fn test_cancelled_run_reports_incomplete() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();
        std::fs::write(local.path().join("a.bin"), b"a").unwrap();

        let publisher = Publisher::new(FsTransport::new(remote.path()), AssumeYes);
        publisher.cancel_flag().cancel();

        let err = publisher.publish(local.path(), false).unwrap_err();
        match err {
            PublishError::Incomplete { report, cause } => {
                assert!(report.transferred.is_empty());
                assert_eq!(report.pending, vec!["a.bin"]);
                assert!(cause.contains("cancelled"));
            }
            other => panic!("expected Incomplete, got {other:?}"),
        }
    }
}
