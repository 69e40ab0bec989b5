//! Layered configuration resolution.
//!
//! The resolver replaces the `cd .. ; source shared config` dance the old
//! per-node scripts repeated: the caller passes an explicit ordered stack
//! of layers, most specific first, and for each key the first-seen value
//! wins. Resolution is deterministic and idempotent for a fixed stack.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{ConfigError, Result};
use crate::layer::{ConfigLayer, Key};
use crate::node::{NodeConfig, OsFamily};

/// Keys that must be set in at least one layer.
pub const REQUIRED_KEYS: [Key; 3] = [Key::Hostname, Key::WorkTopdir, Key::RHome];

/// Resolve a layer stack into a [`NodeConfig`].
///
/// `layers` is ordered most specific first; a key set in an earlier layer
/// shadows the same key in every later layer. Missing optional keys take
/// documented defaults: `nb_cpu = 1`, `check_cpu = nb_cpu`,
/// `debug = false`, `os_family` = family of the running host, `user` and
/// `central_host` empty, `rsh_cmd` absent.
pub fn resolve(layers: &[ConfigLayer]) -> Result<NodeConfig> {
    for layer in layers {
        for key in layer.unknown_keys() {
            warn!(layer = %layer.name(), key = %key, "unknown key in configuration stack");
        }
    }

    let hostname = required(layers, Key::Hostname)?.to_string();
    let work_topdir = PathBuf::from(required(layers, Key::WorkTopdir)?);
    let r_home = PathBuf::from(required(layers, Key::RHome)?);

    let os_family = match first(layers, Key::OsFamily) {
        Some("unix") => OsFamily::Unix,
        Some("windows") => OsFamily::Windows,
        Some(other) => {
            return Err(ConfigError::UnknownOsFamily {
                value: other.to_string(),
            })
        }
        None => OsFamily::current(),
    };

    let nb_cpu = match first(layers, Key::NbCpu) {
        Some(v) => parse_workers(Key::NbCpu, v)?,
        None => 1,
    };
    let check_cpu = match first(layers, Key::CheckCpu) {
        Some(v) => parse_workers(Key::CheckCpu, v)?,
        None => nb_cpu,
    };

    let physical = num_cpus::get();
    if nb_cpu > physical || check_cpu > physical {
        warn!(
            nb_cpu,
            check_cpu,
            physical,
            "configured worker count exceeds physical core count"
        );
    }

    let debug = match first(layers, Key::Debug) {
        Some(v) => parse_bool(Key::Debug, v)?,
        None => false,
    };

    let config = NodeConfig {
        hostname,
        os_family,
        user: first(layers, Key::User).unwrap_or_default().to_string(),
        work_topdir,
        r_home,
        nb_cpu,
        check_cpu,
        central_host: first(layers, Key::CentralHost)
            .unwrap_or_default()
            .to_string(),
        rsh_cmd: first(layers, Key::RshCmd).map(str::to_string),
        debug,
    };

    debug!(hostname = %config.hostname, nb_cpu, check_cpu, "resolved node configuration");
    Ok(config)
}

/// First-seen value for a key across the stack (child overrides parent).
fn first(layers: &[ConfigLayer], key: Key) -> Option<&str> {
    layers.iter().find_map(|layer| layer.get(key))
}

fn required(layers: &[ConfigLayer], key: Key) -> Result<&str> {
    first(layers, key).ok_or(ConfigError::MissingRequiredKey {
        key: key.as_str(),
    })
}

fn parse_workers(key: Key, value: &str) -> Result<usize> {
    let n: usize = value
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.as_str(),
            value: value.to_string(),
            reason: "not an integer".to_string(),
        })?;
    if n < 1 {
        return Err(ConfigError::InvalidValue {
            key: key.as_str(),
            value: value.to_string(),
            reason: "must be >= 1".to_string(),
        });
    }
    Ok(n)
}

fn parse_bool(key: Key, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.as_str(),
            value: value.to_string(),
            reason: "not a boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_layer() -> ConfigLayer {
        ConfigLayer::new("node")
            .with(Key::Hostname, "nebbiolo1")
            .with(Key::WorkTopdir, "/home/biocbuild/bbs")
            .with(Key::RHome, "/usr/local/R")
    }

    #[test]
    fn test_child_layer_wins() {
        let child = base_layer().with(Key::NbCpu, "7");
        let parent = ConfigLayer::new("shared")
            .with(Key::NbCpu, "4")
            .with(Key::CentralHost, "master.internal");

        let config = resolve(&[child, parent]).unwrap();
        assert_eq!(config.nb_cpu, 7);
        assert_eq!(config.central_host, "master.internal");
    }

    #[test]
    fn test_concrete_precedence_scenario() {
        // Layers [{nb_cpu: 7}, {nb_cpu: 4, check_cpu: 8}] resolve to
        // nb_cpu=7, check_cpu=8.
        let child = base_layer().with(Key::NbCpu, "7");
        let parent = ConfigLayer::new("shared")
            .with(Key::NbCpu, "4")
            .with(Key::CheckCpu, "8");

        let config = resolve(&[child, parent]).unwrap();
        assert_eq!(config.nb_cpu, 7);
        assert_eq!(config.check_cpu, 8);
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let stack = vec![
            base_layer().with(Key::Debug, "1").with(Key::NbCpu, "3"),
            ConfigLayer::new("shared")
                .with(Key::CheckCpu, "2")
                .with(Key::User, "biocbuild"),
        ];

        let once = resolve(&stack).unwrap();
        let twice = resolve(&stack).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_check_cpu_defaults_to_nb_cpu() {
        let config = resolve(&[base_layer().with(Key::NbCpu, "6")]).unwrap();
        assert_eq!(config.check_cpu, 6);
    }

    #[test]
    fn test_defaults_for_optional_keys() {
        let config = resolve(&[base_layer()]).unwrap();
        assert_eq!(config.nb_cpu, 1);
        assert_eq!(config.check_cpu, 1);
        assert!(!config.debug);
        assert!(config.user.is_empty());
        assert!(config.rsh_cmd.is_none());
        assert_eq!(config.os_family, OsFamily::current());
    }

    #[test]
    fn test_missing_required_key_fails() {
        let layer = ConfigLayer::new("node").with(Key::Hostname, "a");
        let err = resolve(&[layer]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingRequiredKey { key: "work_topdir" }
        ));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let err = resolve(&[base_layer().with(Key::NbCpu, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "nb_cpu", .. }));
    }

    #[test]
    fn test_bad_os_family_rejected() {
        let err = resolve(&[base_layer().with(Key::OsFamily, "beos")]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOsFamily { .. }));
    }

    #[test]
    fn test_explicit_os_family_wins_over_inference() {
        let config = resolve(&[base_layer().with(Key::OsFamily, "windows")]).unwrap();
        assert_eq!(config.os_family, OsFamily::Windows);
    }

    #[test]
    fn test_debug_bool_spellings() {
        for (text, expected) in [("1", true), ("yes", true), ("FALSE", false), ("0", false)] {
            let config = resolve(&[base_layer().with(Key::Debug, text)]).unwrap();
            assert_eq!(config.debug, expected, "debug={text}");
        }
    }
}
