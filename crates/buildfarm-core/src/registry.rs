//! Node registry.
//!
//! Two views of "which nodes exist": [`resolve_self`] answers for the
//! machine the process runs on (layered config merge), and [`list_nodes`]
//! answers for the coordinator, from a JSON registry file listing every
//! participating node.

use std::collections::HashSet;
use std::path::Path;

use tracing::info;

use crate::error::{ConfigError, Result};
use crate::layer::ConfigLayer;
use crate::node::{NodeConfig, NodeEntry};
use crate::resolver;

/// Resolve the configuration of this machine from an explicit layer stack.
///
/// Fails with [`ConfigError`] if a required key (`hostname`,
/// `work_topdir`, `r_home`) is missing from every layer or `os_family`
/// cannot be determined. Deterministic for a fixed stack; no side effects
/// beyond reading the already-parsed layers.
pub fn resolve_self(layers: &[ConfigLayer]) -> Result<NodeConfig> {
    resolver::resolve(layers)
}

/// Load all participating nodes from the coordinator's registry file.
///
/// The registry is a JSON array of node entries. Hostnames must be unique
/// case-insensitively (lookups in the old system were keyed by lowercased
/// hostname); a duplicate is a configuration fault, not a warning.
pub fn list_nodes(path: &Path) -> Result<Vec<NodeEntry>> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let entries: Vec<NodeEntry> =
        serde_json::from_str(&text).map_err(|source| ConfigError::Registry {
            path: path.to_path_buf(),
            source,
        })?;

    let mut seen = HashSet::new();
    for entry in &entries {
        if !seen.insert(entry.hostname_key()) {
            return Err(ConfigError::DuplicateNode {
                hostname: entry.hostname.clone(),
            });
        }
    }

    info!(count = entries.len(), registry = %path.display(), "loaded node registry");
    Ok(entries)
}
