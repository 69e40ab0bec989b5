//! Node data model.
//!
//! [`NodeConfig`] is the immutable, fully-resolved description of one build
//! node. It is constructed exactly once per run by the resolver and passed
//! explicitly to every component; nothing downstream reads the ambient
//! process environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Operating system family of a build node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    Unix,
    Windows,
}

impl OsFamily {
    /// Family of the machine this process is running on.
    pub fn current() -> Self {
        if cfg!(windows) {
            OsFamily::Windows
        } else {
            OsFamily::Unix
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OsFamily::Unix => "unix",
            OsFamily::Windows => "windows",
        }
    }
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully-resolved configuration for one build node.
///
/// `hostname` uniquely identifies the node; comparisons are
/// case-insensitive (see [`NodeConfig::hostname_key`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Unique node identifier.
    pub hostname: String,

    /// Operating system family.
    pub os_family: OsFamily,

    /// Account the builds run under. Empty when unspecified.
    pub user: String,

    /// Top of the node's working directory tree.
    pub work_topdir: PathBuf,

    /// Path to the language runtime under test.
    pub r_home: PathBuf,

    /// Parallel build workers.
    pub nb_cpu: usize,

    /// Parallel check workers. Defaults to `nb_cpu`.
    pub check_cpu: usize,

    /// Coordinator address. Empty when unspecified.
    pub central_host: String,

    /// Remote-shell invocation template. Absent on the coordinator itself.
    pub rsh_cmd: Option<String>,

    /// Verbose diagnostics toggle.
    pub debug: bool,
}

impl NodeConfig {
    /// Canonical (lowercased) hostname used for uniqueness and lookups.
    pub fn hostname_key(&self) -> String {
        self.hostname.to_ascii_lowercase()
    }
}

/// Package artifact type produced by a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkgType {
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "win.binary")]
    WinBinary,
    #[serde(rename = "mac.binary")]
    MacBinary,
}

impl PkgType {
    /// File extension of artifacts of this type.
    pub fn file_ext(&self) -> &'static str {
        match self {
            PkgType::Source => "tar.gz",
            PkgType::WinBinary => "zip",
            PkgType::MacBinary => "tgz",
        }
    }

    /// The type's spelling in registry files.
    pub fn as_str(&self) -> &'static str {
        match self {
            PkgType::Source => "source",
            PkgType::WinBinary => "win.binary",
            PkgType::MacBinary => "mac.binary",
        }
    }
}

impl std::fmt::Display for PkgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static platform description of a registered node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// CPU architecture (e.g. "x86_64", "arm64").
    pub arch: String,

    /// Platform label (e.g. "Linux (Ubuntu 24.04)").
    pub platform: String,

    /// Artifact type this node produces.
    pub pkg_type: PkgType,

    /// Character encoding used by the node's toolchain output.
    pub encoding: String,
}

/// Registry record: a hostname coupled with its platform description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub hostname: String,
    #[serde(flatten)]
    pub spec: NodeSpec,
}

impl NodeEntry {
    /// Canonical (lowercased) hostname used for uniqueness and lookups.
    pub fn hostname_key(&self) -> String {
        self.hostname.to_ascii_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pkg_type_file_ext() {
        assert_eq!(PkgType::Source.file_ext(), "tar.gz");
        assert_eq!(PkgType::WinBinary.file_ext(), "zip");
        assert_eq!(PkgType::MacBinary.file_ext(), "tgz");
    }

    #[test]
    fn test_node_entry_roundtrip() {
        let json = r#"{
            "hostname": "palomino3",
            "arch": "x86_64",
            "platform": "Windows Server 2022",
            "pkg_type": "win.binary",
            "encoding": "utf-8"
        }"#;

        let entry: NodeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.hostname, "palomino3");
        assert_eq!(entry.spec.pkg_type, PkgType::WinBinary);
        assert_eq!(entry.spec.pkg_type.file_ext(), "zip");
        assert_eq!(entry.hostname_key(), "palomino3");
    }

    #[test]
    fn test_hostname_key_lowercases() {
        let config = NodeConfig {
            hostname: "Nebbiolo1".to_string(),
            os_family: OsFamily::Unix,
            user: "biocbuild".to_string(),
            work_topdir: PathBuf::from("/home/biocbuild/bbs"),
            r_home: PathBuf::from("/usr/local/R"),
            nb_cpu: 4,
            check_cpu: 4,
            central_host: String::new(),
            rsh_cmd: None,
            debug: false,
        };
        assert_eq!(config.hostname_key(), "nebbiolo1");
    }

    #[test]
    fn test_os_family_serde_spelling() {
        assert_eq!(
            serde_json::to_string(&OsFamily::Windows).unwrap(),
            "\"windows\""
        );
    }
}
