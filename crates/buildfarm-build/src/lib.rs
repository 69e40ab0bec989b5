//! Buildfarm Build - package build orchestration
//!
//! Given a resolved node configuration and a build manifest, drives the
//! external package-build tool once per package:
//! - Worker pool bounded by the node's `nb_cpu`
//! - Per-package timeout and output capture
//! - Partial-failure isolation (one result per package, always)

pub mod error;
pub mod orchestrator;
pub mod report;
pub mod runner;
pub mod tool;

// Re-export key types
pub use error::OrchestratorError;
pub use orchestrator::{load_manifest, run};
pub use report::RunReport;
pub use runner::{build_package, BuildStatus, FailureReason, PackageBuildResult};
pub use tool::{BuildTool, DEFAULT_TIMEOUT_SECS};
