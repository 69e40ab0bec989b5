//! Single-package build execution.

use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::debug;

use crate::tool::BuildTool;

/// Maximum number of trailing output lines kept as the log excerpt.
const EXCERPT_LINES: usize = 50;

/// Why a package build failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum FailureReason {
    /// Tool exited with a non-zero status.
    NonZeroExit(i32),
    /// Per-package timeout elapsed.
    Timeout,
    /// The subprocess could not be started or waited on.
    Spawn(String),
}

/// Outcome of one package build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum BuildStatus {
    Success,
    Failed(FailureReason),
    Skipped,
}

/// One package's result within a run. Created as the package completes,
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageBuildResult {
    /// Package name from the manifest.
    pub package: String,

    /// Build outcome.
    pub status: BuildStatus,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Bounded tail of combined stdout/stderr.
    pub log_excerpt: String,
}

impl PackageBuildResult {
    /// Whether the build succeeded.
    pub fn succeeded(&self) -> bool {
        self.status == BuildStatus::Success
    }

    /// Result for a package the operator asked to skip.
    pub fn skipped(package: &str) -> Self {
        Self {
            package: package.to_string(),
            status: BuildStatus::Skipped,
            duration_ms: 0,
            log_excerpt: String::new(),
        }
    }
}

/// Build one package with the given tool, capturing output and bounding
/// the run with the tool's timeout.
///
/// Infallible by contract: every failure mode of the opaque tool call
/// (non-zero exit, timeout, spawn error) is absorbed into the returned
/// result so that one package can never abort the run.
pub async fn build_package(tool: &BuildTool, workdir: &Path, package: &str) -> PackageBuildResult {
    let start = Instant::now();
    debug!(package = %package, program = %tool.program, "starting package build");

    let spawned = Command::new(&tool.program)
        .args(tool.command_for(package))
        .current_dir(workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match spawned {
        Ok(child) => child,
        Err(e) => {
            return PackageBuildResult {
                package: package.to_string(),
                status: BuildStatus::Failed(FailureReason::Spawn(e.to_string())),
                duration_ms: start.elapsed().as_millis() as u64,
                log_excerpt: e.to_string(),
            };
        }
    };

    let waited = if tool.timeout_secs > 0 {
        match tokio::time::timeout(
            Duration::from_secs(tool.timeout_secs),
            child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                return PackageBuildResult {
                    package: package.to_string(),
                    status: BuildStatus::Failed(FailureReason::Timeout),
                    duration_ms: start.elapsed().as_millis() as u64,
                    log_excerpt: format!(
                        "build of {} timed out after {} seconds",
                        package, tool.timeout_secs
                    ),
                };
            }
        }
    } else {
        child.wait_with_output().await
    };

    let duration_ms = start.elapsed().as_millis() as u64;

    let output = match waited {
        Ok(output) => output,
        Err(e) => {
            return PackageBuildResult {
                package: package.to_string(),
                status: BuildStatus::Failed(FailureReason::Spawn(e.to_string())),
                duration_ms,
                log_excerpt: e.to_string(),
            };
        }
    };

    let excerpt = tail_excerpt(
        &String::from_utf8_lossy(&output.stdout),
        &String::from_utf8_lossy(&output.stderr),
    );

    let status = if output.status.success() {
        BuildStatus::Success
    } else {
        BuildStatus::Failed(FailureReason::NonZeroExit(
            output.status.code().unwrap_or(-1),
        ))
    };

    PackageBuildResult {
        package: package.to_string(),
        status,
        duration_ms,
        log_excerpt: excerpt,
    }
}

/// Last `EXCERPT_LINES` lines of the combined output.
fn tail_excerpt(stdout: &str, stderr: &str) -> String {
    let combined: Vec<&str> = stdout
        .lines()
        .chain(stderr.lines())
        .collect();
    let skip = combined.len().saturating_sub(EXCERPT_LINES);
    combined[skip..].join("\n")
}
