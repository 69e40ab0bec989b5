//! Configuration layers.
//!
//! A layer is one source of `KEY=value` settings (typically a file next to
//! a node's working directory, or a shared defaults file further up).
//! Parsing validates keys against the typed schema; file I/O is left to
//! the caller or to [`ConfigLayer::from_file`].

use std::collections::BTreeMap;
use std::path::Path;

use tracing::warn;

use crate::error::{ConfigError, Result};

/// The recognized configuration schema.
///
/// Anything outside this set is reported as unknown rather than silently
/// accepted, so misspelled keys cannot drift through a fleet of node files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Hostname,
    OsFamily,
    User,
    WorkTopdir,
    RHome,
    NbCpu,
    CheckCpu,
    CentralHost,
    RshCmd,
    Debug,
}

impl Key {
    /// All schema keys, in documentation order.
    pub const ALL: [Key; 10] = [
        Key::Hostname,
        Key::OsFamily,
        Key::User,
        Key::WorkTopdir,
        Key::RHome,
        Key::NbCpu,
        Key::CheckCpu,
        Key::CentralHost,
        Key::RshCmd,
        Key::Debug,
    ];

    /// The key's spelling in layer files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Key::Hostname => "hostname",
            Key::OsFamily => "os_family",
            Key::User => "user",
            Key::WorkTopdir => "work_topdir",
            Key::RHome => "r_home",
            Key::NbCpu => "nb_cpu",
            Key::CheckCpu => "check_cpu",
            Key::CentralHost => "central_host",
            Key::RshCmd => "rsh_cmd",
            Key::Debug => "debug",
        }
    }

    /// Look up a schema key by its file spelling (case-insensitive).
    pub fn from_name(name: &str) -> Option<Key> {
        let lower = name.to_ascii_lowercase();
        Key::ALL.iter().copied().find(|k| k.as_str() == lower)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed configuration layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    /// Label used in diagnostics (file name, or a caller-chosen tag).
    name: String,
    values: BTreeMap<Key, String>,
    unknown_keys: Vec<String>,
}

impl ConfigLayer {
    /// Create an empty layer with the given diagnostic label.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
            unknown_keys: Vec::new(),
        }
    }

    /// Parse a layer from `KEY=value` text.
    ///
    /// Blank lines and `#` comments are ignored. Values keep everything
    /// after the first `=` verbatim (trimmed), so remote-shell command
    /// templates containing `=` survive. Unknown keys are logged at WARN
    /// and kept on the layer for callers that want to reject them.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        let mut layer = ConfigLayer::new(name);

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::MalformedLine {
                    layer: layer.name.clone(),
                    line: idx + 1,
                    text: line.to_string(),
                });
            };

            let key = key.trim();
            let value = value.trim();
            match Key::from_name(key) {
                Some(k) => {
                    layer.values.insert(k, value.to_string());
                }
                None => {
                    warn!(layer = %layer.name, key = %key, "ignoring unknown configuration key");
                    layer.unknown_keys.push(key.to_string());
                }
            }
        }

        Ok(layer)
    }

    /// Read and parse a layer file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path.display().to_string(), &text)
    }

    /// Set a key on this layer (builder style).
    pub fn with(mut self, key: Key, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// The value for a key, if this layer sets it. Empty values count as
    /// unset, matching the original scripts where an exported empty
    /// variable fell through to the shared defaults.
    pub fn get(&self, key: Key) -> Option<&str> {
        self.values
            .get(&key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Diagnostic label for this layer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keys that were present in the source but are not part of the schema.
    pub fn unknown_keys(&self) -> &[String] {
        &self.unknown_keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_layer() {
        let layer = ConfigLayer::parse(
            "node.conf",
            "hostname=nebbiolo1\nwork_topdir=/home/biocbuild/bbs\nnb_cpu=16\n",
        )
        .unwrap();

        assert_eq!(layer.get(Key::Hostname), Some("nebbiolo1"));
        assert_eq!(layer.get(Key::WorkTopdir), Some("/home/biocbuild/bbs"));
        assert_eq!(layer.get(Key::NbCpu), Some("16"));
        assert!(layer.unknown_keys().is_empty());
    }

    #[test]
    fn test_parse_ignores_comments_and_blanks() {
        let layer = ConfigLayer::parse(
            "shared.conf",
            "# shared settings\n\n  central_host = master.internal  \n",
        )
        .unwrap();
        assert_eq!(layer.get(Key::CentralHost), Some("master.internal"));
    }

    #[test]
    fn test_parse_keeps_equals_in_values() {
        let layer =
            ConfigLayer::parse("node.conf", "rsh_cmd=ssh -o ConnectTimeout=10\n").unwrap();
        assert_eq!(layer.get(Key::RshCmd), Some("ssh -o ConnectTimeout=10"));
    }

    #[test]
    fn test_parse_collects_unknown_keys() {
        let layer =
            ConfigLayer::parse("node.conf", "hostname=a\nhost_name=typo\n").unwrap();
        assert_eq!(layer.unknown_keys(), &["host_name".to_string()]);
        assert_eq!(layer.get(Key::Hostname), Some("a"));
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = ConfigLayer::parse("node.conf", "hostname\n").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn test_keys_match_case_insensitively() {
        let layer = ConfigLayer::parse("node.conf", "HOSTNAME=riesling\n").unwrap();
        assert_eq!(layer.get(Key::Hostname), Some("riesling"));
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let layer = ConfigLayer::parse("node.conf", "user=\n").unwrap();
        assert_eq!(layer.get(Key::User), None);
    }
}
