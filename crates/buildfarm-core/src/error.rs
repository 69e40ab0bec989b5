//! Configuration error taxonomy.
//!
//! Every variant here is fatal: a run context cannot be established from a
//! broken configuration, so these surface before any build or publish
//! action starts.

use std::path::PathBuf;

/// Errors produced while parsing or resolving node configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required configuration key: {key}")]
    MissingRequiredKey { key: &'static str },

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot determine os_family: {value:?} (expected \"unix\" or \"windows\")")]
    UnknownOsFamily { value: String },

    #[error("malformed line {line} in layer {layer:?}: {text:?}")]
    MalformedLine {
        layer: String,
        line: usize,
        text: String,
    },

    #[error("duplicate node hostname in registry: {hostname}")]
    DuplicateNode { hostname: String },

    #[error("failed to read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid node registry document {path:?}")]
    Registry {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
