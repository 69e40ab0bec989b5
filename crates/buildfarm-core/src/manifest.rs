//! Build manifests.
//!
//! A manifest is the ordered set of packages to build for one run, keyed
//! by a release label (e.g. "3.16-bioc"). It is produced by an external
//! feed and consumed read-only by the orchestrator. File I/O is left to
//! the caller; this module only parses and fingerprints.

use sha2::{Digest, Sha256};

/// Ordered, de-duplicated package list for one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildManifest {
    release: String,
    packages: Vec<String>,
}

impl BuildManifest {
    /// Build a manifest from an ordered package list. Later duplicates are
    /// dropped, preserving first-seen order.
    pub fn new(release: impl Into<String>, packages: impl IntoIterator<Item = String>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let packages = packages
            .into_iter()
            .filter(|p| seen.insert(p.clone()))
            .collect();
        Self {
            release: release.into(),
            packages,
        }
    }

    /// Parse the flat manifest format: one package per line, `#` comments
    /// and blank lines ignored.
    pub fn parse(release: impl Into<String>, text: &str) -> Self {
        let packages = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string);
        Self::new(release, packages)
    }

    /// Release label this manifest belongs to.
    pub fn release(&self) -> &str {
        &self.release
    }

    /// Packages in manifest order.
    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Deterministic SHA-256 digest over the ordered package names, used
    /// to link a run report back to its exact input.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.release.as_bytes());
        hasher.update(b"\0");
        for package in &self.packages {
            hasher.update(package.as_bytes());
            hasher.update(b"\0");
        }
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let manifest = BuildManifest::parse("3.16-bioc", "# feed snapshot\npkgA\n\npkgB\n");
        assert_eq!(manifest.packages(), &["pkgA", "pkgB"]);
        assert_eq!(manifest.release(), "3.16-bioc");
    }

    #[test]
    fn test_duplicates_dropped_order_preserved() {
        let manifest = BuildManifest::parse("3.16-bioc", "pkgB\npkgA\npkgB\n");
        assert_eq!(manifest.packages(), &["pkgB", "pkgA"]);
    }

    #[test]
    fn test_digest_deterministic() {
        let a = BuildManifest::parse("3.16-bioc", "pkgA\npkgB\n");
        let b = BuildManifest::parse("3.16-bioc", "pkgA\npkgB\n");
        assert_eq!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_order_sensitive() {
        let a = BuildManifest::parse("3.16-bioc", "pkgA\npkgB\n");
        let b = BuildManifest::parse("3.16-bioc", "pkgB\npkgA\n");
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_digest_release_sensitive() {
        let a = BuildManifest::parse("3.16-bioc", "pkgA\n");
        let b = BuildManifest::parse("3.17-bioc", "pkgA\n");
        assert_ne!(a.digest(), b.digest());
    }
}
