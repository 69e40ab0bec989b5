//! Transfer channel abstraction.
//!
//! The remote repository host is reached through the [`Transport`] trait:
//! list, upload, delete, addressed by slash-separated relative paths.
//! Credentials and the actual channel (SSH, rsync daemon, ...) live behind
//! the implementation; this crate ships a filesystem-backed transport and
//! tests use recording fakes.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A destination that files can be mirrored onto.
///
/// Relative paths always use `/` as the separator, regardless of host OS.
pub trait Transport: Send + Sync {
    /// All file paths currently present at the destination.
    fn list(&self) -> io::Result<Vec<String>>;

    /// Copy `local` to the destination under `rel`.
    fn upload(&self, rel: &str, local: &Path) -> io::Result<()>;

    /// Remove `rel` from the destination. Missing files are not an error.
    fn delete(&self, rel: &str) -> io::Result<()>;

    /// Human-readable destination label for prompts and logs.
    fn describe(&self) -> String;
}

/// Filesystem-backed transport rooted at a directory.
///
/// Serves as the local-repository implementation and as the reference
/// semantics for remote transports.
#[derive(Debug, Clone)]
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, rel: &str) -> PathBuf {
        let mut path = self.root.clone();
        path.extend(rel.split('/'));
        path
    }
}

impl Transport for FsTransport {
    fn list(&self) -> io::Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.map_err(io::Error::other)?;
            if entry.file_type().is_file() {
                if let Some(rel) = relative_path(&self.root, entry.path()) {
                    paths.push(rel);
                }
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn upload(&self, rel: &str, local: &Path) -> io::Result<()> {
        let dest = self.full_path(rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(local, dest)?;
        Ok(())
    }

    fn delete(&self, rel: &str) -> io::Result<()> {
        match std::fs::remove_file(self.full_path(rel)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Slash-separated path of `path` relative to `root`.
pub(crate) fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_transport_roundtrip() {
        let local = tempfile::tempdir().unwrap();
        let remote = tempfile::tempdir().unwrap();

        let src = local.path().join("a.bin");
        std::fs::write(&src, b"artifact").unwrap();

        let transport = FsTransport::new(remote.path());
        transport.upload("3.16/src/a.bin", &src).unwrap();

        assert_eq!(transport.list().unwrap(), vec!["3.16/src/a.bin"]);
        assert_eq!(
            std::fs::read(remote.path().join("3.16/src/a.bin")).unwrap(),
            b"artifact"
        );

        transport.delete("3.16/src/a.bin").unwrap();
        assert!(transport.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let remote = tempfile::tempdir().unwrap();
        let transport = FsTransport::new(remote.path());
        assert!(transport.delete("never/was/there.bin").is_ok());
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let transport = FsTransport::new("/nonexistent/remote/root");
        assert!(transport.list().unwrap().is_empty());
    }

    #[test]
    fn test_relative_path_uses_slashes() {
        let root = Path::new("/repo");
        let rel = relative_path(root, Path::new("/repo/a/b/c.tar.gz")).unwrap();
        assert_eq!(rel, "a/b/c.tar.gz");
    }
}
