//! Build orchestration.
//!
//! Drives the external package-build tool over a manifest with a worker
//! pool bounded by the node's `nb_cpu`. Packages are independent: there is
//! no inter-package dependency ordering here (that is the external tool's
//! concern), no ordering guarantee between results, and one package's
//! failure never aborts the run. Workers hand their results back through
//! the bounded stream; the parent collects after the stream drains, so no
//! shared mutable state exists between workers.

use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use chrono::Utc;
use futures::{stream, StreamExt};
use tracing::info;
use uuid::Uuid;

use buildfarm_core::{BuildManifest, NodeConfig};

use crate::error::{OrchestratorError, Result};
use crate::report::RunReport;
use crate::runner::{build_package, PackageBuildResult};
use crate::tool::BuildTool;

/// Read a manifest file for the given release label.
///
/// An unreadable manifest is fatal; nothing has started yet.
pub fn load_manifest(path: &Path, release: &str) -> Result<BuildManifest> {
    let text = std::fs::read_to_string(path).map_err(|source| {
        OrchestratorError::ManifestUnreadable {
            path: path.to_path_buf(),
            source,
        }
    })?;
    Ok(BuildManifest::parse(release, &text))
}

/// Run every package in the manifest on this node.
///
/// Pre-flight failures (tool not locatable, empty manifest) abort before
/// any package starts and produce no partial results. After pre-flight,
/// the run always yields one result per manifest package.
pub async fn run(
    manifest: &BuildManifest,
    node: &NodeConfig,
    tool: &BuildTool,
    skip: &[String],
) -> Result<RunReport> {
    let tool_path = tool.locate()?;
    if manifest.is_empty() {
        return Err(OrchestratorError::EmptyManifest {
            release: manifest.release().to_string(),
        });
    }

    let run_id = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    let start = Instant::now();

    info!(
        run_id = %run_id,
        release = %manifest.release(),
        packages = manifest.len(),
        workers = node.nb_cpu,
        tool = %tool_path.display(),
        "starting build run"
    );

    let skip: HashSet<&str> = skip.iter().map(String::as_str).collect();
    let skip = &skip;
    let workdir = node.work_topdir.as_path();

    let results: Vec<PackageBuildResult> = stream::iter(manifest.packages())
        .map(|package| async move {
            if skip.contains(package.as_str()) {
                info!(package = %package, "skipping by operator request");
                PackageBuildResult::skipped(package)
            } else {
                build_package(tool, workdir, package).await
            }
        })
        .buffer_unordered(node.nb_cpu)
        .collect()
        .await;

    let report = RunReport {
        run_id,
        release: manifest.release().to_string(),
        manifest_digest: manifest.digest(),
        node: node.hostname.clone(),
        started_at,
        duration_ms: start.elapsed().as_millis() as u64,
        results,
    };

    info!(
        run_id = %report.run_id,
        status = report.overall_status(),
        ok = report.success_count(),
        failed = report.failed_count(),
        "build run finished"
    );

    Ok(report)
}
