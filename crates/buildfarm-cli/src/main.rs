//! Buildfarm - build farm coordinator CLI
//!
//! The `buildfarm` command drives a single build node through its part of
//! a release build:
//!
//! - `resolve-config`: Resolve layered node configuration files
//! - `nodes`: List the farm's node registry
//! - `run-build`: Build every package in a manifest on this node
//! - `publish`: Mirror finished artifacts onto the central repository

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use buildfarm_build::{load_manifest, run, BuildTool, RunReport, DEFAULT_TIMEOUT_SECS};
use buildfarm_core::{list_nodes, resolve_self, ConfigLayer, NodeConfig};
use buildfarm_publish::{AssumeYes, FsTransport, PublishError, Publisher, StdinConfirmer};

#[derive(Parser)]
#[command(name = "buildfarm")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build farm coordinator for package release builds", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve this node's configuration from layered config files
    ///
    /// Layers are given most-specific first; the first layer that sets a
    /// key wins.
    ResolveConfig {
        /// Configuration layer file (repeatable, most specific first)
        #[arg(short, long = "layer", required = true)]
        layers: Vec<PathBuf>,
    },

    /// List the nodes in the farm registry
    Nodes {
        /// Path to the node registry JSON file
        #[arg(short, long)]
        registry: PathBuf,
    },

    /// Build every package in a manifest on this node
    RunBuild {
        /// Path to the package manifest (one package per line)
        manifest: PathBuf,

        /// Configuration layer file (repeatable, most specific first)
        #[arg(short, long = "layer", required = true)]
        layers: Vec<PathBuf>,

        /// Release the manifest belongs to
        #[arg(short, long, default_value = "devel")]
        release: String,

        /// Build tool program (the package name is appended last)
        #[arg(long, default_value = "R")]
        tool: String,

        /// Leading argument for the build tool (repeatable, e.g. CMD build)
        #[arg(long = "tool-arg")]
        tool_args: Vec<String>,

        /// Per-package timeout in seconds (0 disables the timeout)
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
        timeout_secs: u64,

        /// Package to skip without building (repeatable)
        #[arg(long = "skip")]
        skip: Vec<String>,

        /// Write the run report as JSON to this path
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Mirror a local artifact directory onto a destination directory
    ///
    /// Destination files with no local counterpart are DELETED.
    Publish {
        /// Local directory holding the finished artifacts
        local_dir: PathBuf,

        /// Destination directory to mirror onto
        remote_dir: PathBuf,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    buildfarm_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::ResolveConfig { layers } => cmd_resolve_config(&layers),
        Commands::Nodes { registry } => cmd_nodes(&registry),
        Commands::RunBuild {
            manifest,
            layers,
            release,
            tool,
            tool_args,
            timeout_secs,
            skip,
            report,
        } => {
            cmd_run_build(
                &manifest,
                &layers,
                &release,
                &tool,
                &tool_args,
                timeout_secs,
                &skip,
                report.as_deref(),
            )
            .await
        }
        Commands::Publish {
            local_dir,
            remote_dir,
            yes,
        } => cmd_publish(&local_dir, &remote_dir, yes),
    }
}

/// Parse the layer files in order, most specific first.
fn load_layers(paths: &[PathBuf]) -> Result<Vec<ConfigLayer>> {
    paths
        .iter()
        .map(|path| {
            ConfigLayer::from_file(path)
                .with_context(|| format!("failed to load config layer {:?}", path))
        })
        .collect()
}

fn resolve_node(layer_paths: &[PathBuf]) -> Result<NodeConfig> {
    let layers = load_layers(layer_paths)?;
    resolve_self(&layers).context("failed to resolve node configuration")
}

/// Resolve and print this node's configuration
fn cmd_resolve_config(layer_paths: &[PathBuf]) -> Result<()> {
    let node = resolve_node(layer_paths)?;
    println!("{}", serde_json::to_string_pretty(&node)?);
    Ok(())
}

/// List the farm's node registry
fn cmd_nodes(registry: &Path) -> Result<()> {
    let nodes =
        list_nodes(registry).with_context(|| format!("failed to read registry {:?}", registry))?;

    if nodes.is_empty() {
        println!("No nodes registered in {:?}", registry);
        return Ok(());
    }

    for node in nodes {
        println!(
            "{:<20} {:<10} {:<24} {}",
            node.hostname,
            node.spec.arch,
            node.spec.platform,
            node.spec.pkg_type.as_str()
        );
    }

    Ok(())
}

/// Build every package in the manifest and report per-package outcomes
#[allow(clippy::too_many_arguments)]
async fn cmd_run_build(
    manifest_path: &Path,
    layer_paths: &[PathBuf],
    release: &str,
    tool: &str,
    tool_args: &[String],
    timeout_secs: u64,
    skip: &[String],
    report_path: Option<&Path>,
) -> Result<()> {
    let node = resolve_node(layer_paths)?;
    let manifest = load_manifest(manifest_path, release)?;

    let mut build_tool = BuildTool::new(tool).timeout_secs(timeout_secs);
    for arg in tool_args {
        build_tool = build_tool.arg(arg);
    }

    info!(
        release = %release,
        packages = manifest.packages().len(),
        node = %node.hostname,
        workers = node.nb_cpu,
        "starting build run"
    );

    let report = run(&manifest, &node, &build_tool, skip).await?;

    println!("{}", report.render_text());

    if let Some(path) = report_path {
        write_report(&report, path)?;
        println!("Report written to {:?}", path);
    }

    if report.is_clean() {
        Ok(())
    } else {
        anyhow::bail!(
            "build run finished with status {}: {} of {} packages failed",
            report.overall_status(),
            report.failed_count(),
            report.results.len()
        )
    }
}

fn write_report(report: &RunReport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json).with_context(|| format!("failed to write report to {:?}", path))
}

/// Mirror local artifacts onto the destination directory
fn cmd_publish(local_dir: &Path, remote_dir: &Path, yes: bool) -> Result<()> {
    let transport = FsTransport::new(remote_dir);

    let result = if yes {
        Publisher::new(transport, AssumeYes).publish(local_dir, false)
    } else {
        Publisher::new(transport, StdinConfirmer).publish(local_dir, true)
    };

    match result {
        Ok(report) => {
            println!(
                "Published {} file(s), deleted {} stale file(s) at {:?}",
                report.transferred.len(),
                report.deleted.len(),
                remote_dir
            );
            Ok(())
        }
        Err(PublishError::Declined) => {
            anyhow::bail!("publish declined, nothing transferred")
        }
        Err(PublishError::Incomplete { report, cause }) => {
            println!(
                "Transferred {} file(s), {} still pending:",
                report.transferred.len(),
                report.pending.len()
            );
            for rel in &report.pending {
                println!("  - {}", rel);
            }
            anyhow::bail!("publish incomplete: {}", cause)
        }
        Err(err) => Err(err.into()),
    }
}
