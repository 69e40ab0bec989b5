//! Buildfarm Core
//!
//! Node configuration resolution and the data model shared across the
//! buildfarm coordinator:
//! - Typed configuration layers and the layered resolver
//! - The node registry (self-resolution and the coordinator node list)
//! - Build manifests

pub mod error;
pub mod layer;
pub mod manifest;
pub mod node;
pub mod registry;
pub mod resolver;
pub mod telemetry;

pub use error::ConfigError;
pub use layer::{ConfigLayer, Key};
pub use manifest::BuildManifest;
pub use node::{NodeConfig, NodeEntry, NodeSpec, OsFamily, PkgType};
pub use registry::{list_nodes, resolve_self};
pub use resolver::{resolve, REQUIRED_KEYS};
pub use telemetry::init_tracing;

/// Buildfarm version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
