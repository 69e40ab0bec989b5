//! Build tool description.
//!
//! The external package-build tool is opaque: one subprocess per package,
//! exit status plus captured output, no structured protocol. This module
//! only describes how to invoke it and verifies it can be found at all.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{OrchestratorError, Result};

/// Default per-package timeout in seconds. Deployment policy can override
/// this per tool.
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Invocation template for the external package-build tool.
///
/// The package name is appended as the final argument, e.g.
/// `R CMD INSTALL <package>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildTool {
    /// Executable name or path.
    pub program: String,

    /// Fixed arguments placed before the package name.
    pub args: Vec<String>,

    /// Per-package timeout in seconds. Zero disables the bound.
    pub timeout_secs: u64,
}

impl BuildTool {
    /// Describe a tool with no fixed arguments and the default timeout.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Append a fixed argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Override the per-package timeout.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Full argument vector for building one package.
    pub fn command_for(&self, package: &str) -> Vec<String> {
        let mut cmd = self.args.clone();
        cmd.push(package.to_string());
        cmd
    }

    /// Locate the executable on the search path. A tool that cannot be
    /// found is a fatal pre-flight failure, not a per-package one.
    pub fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|source| OrchestratorError::BuildToolMissing {
            program: self.program.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_for_appends_package() {
        let tool = BuildTool::new("R").arg("CMD").arg("INSTALL");
        assert_eq!(tool.command_for("limma"), vec!["CMD", "INSTALL", "limma"]);
    }

    #[test]
    fn test_default_timeout() {
        let tool = BuildTool::new("R");
        assert_eq!(tool.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_locate_missing_tool() {
        let tool = BuildTool::new("no-such-build-tool-anywhere");
        let err = tool.locate().unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::BuildToolMissing { .. }
        ));
    }

    #[test]
    fn test_locate_common_tool() {
        // `sh` exists on every unix build host this crate targets.
        let tool = BuildTool::new("sh");
        assert!(tool.locate().is_ok());
    }
}
