//! Run report aggregation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::runner::{BuildStatus, FailureReason, PackageBuildResult};

/// Aggregated outcome of one orchestrator run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Release label the manifest belonged to.
    pub release: String,

    /// Digest of the manifest that drove this run.
    pub manifest_digest: String,

    /// Hostname of the node that ran the builds.
    pub node: String,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// Total wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// One result per manifest package, in completion order.
    pub results: Vec<PackageBuildResult>,
}

impl RunReport {
    /// Number of packages that built successfully.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded()).count()
    }

    /// Number of packages that failed.
    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.status, BuildStatus::Failed(_)))
            .count()
    }

    /// Number of packages skipped by operator request.
    pub fn skipped_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == BuildStatus::Skipped)
            .count()
    }

    /// Whether the run had no failures.
    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }

    /// Overall status label, by severity: a hard failure outweighs a
    /// timeout, which outweighs success.
    pub fn overall_status(&self) -> &'static str {
        let mut saw_timeout = false;
        for result in &self.results {
            match &result.status {
                BuildStatus::Failed(FailureReason::Timeout) => saw_timeout = true,
                BuildStatus::Failed(_) => return "ERROR",
                _ => {}
            }
        }
        if saw_timeout {
            "TIMEOUT"
        } else {
            "OK"
        }
    }

    /// Human-readable report text.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Run {} ({})\n", self.run_id, self.release));
        out.push_str(&format!("Node: {}\n", self.node));
        out.push_str(&format!(
            "Status: {} ({} ok / {} failed / {} skipped)\n",
            self.overall_status(),
            self.success_count(),
            self.failed_count(),
            self.skipped_count()
        ));
        out.push_str(&format!("Duration: {}ms\n\n", self.duration_ms));

        for result in &self.results {
            let marker = match &result.status {
                BuildStatus::Success => "OK     ",
                BuildStatus::Failed(FailureReason::Timeout) => "TIMEOUT",
                BuildStatus::Failed(_) => "ERROR  ",
                BuildStatus::Skipped => "skipped",
            };
            out.push_str(&format!(
                "  {} {} ({}ms)\n",
                marker, result.package, result.duration_ms
            ));
        }

        out
    }
}
