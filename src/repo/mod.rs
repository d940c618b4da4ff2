//! Versioned access to the source tree
//!
//! This module handles Git repository operations including:
//! - Reading file snapshots as they existed at a named revision
//! - Revision string normalization
//! - Commit message and patch retrieval
//! - Checking that the required tools are installed

mod commit;
mod config;
pub mod revision;
mod snapshot;

pub use commit::{extract_commit_message, extract_patch, split_commit_output, CommitDetails, CommitInspector};
pub use config::{AnalyzerConfig, SnapshotBackend, TrackerConfig, CONFIG_DIR};
pub use snapshot::{GitCliSnapshots, GitObjectSnapshots, SnapshotSource};

use crate::error::LookupError;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Default budget for a single git invocation
pub const DEFAULT_GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Run git inside `root` and wait for it, killing the child if the timeout fires
pub(crate) async fn run_git(
    root: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<Output, LookupError> {
    let operation = format!("git {}", args.first().copied().unwrap_or_default());

    let mut command = Command::new("git");
    command
        .args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(output) => Ok(output?),
        Err(_) => Err(LookupError::Timeout { operation, timeout }),
    }
}

/// Verify that git is installed, returning its version line
pub async fn check_git(timeout: Duration) -> Result<String, LookupError> {
    let cwd = std::env::current_dir()?;
    let output = run_git(&cwd, &["--version"], timeout).await?;

    if !output.status.success() {
        return Err(LookupError::external(
            "git --version",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim(),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_check_git_reports_version() {
        let version = check_git(DEFAULT_GIT_TIMEOUT).await.unwrap();
        assert!(version.starts_with("git version"));
    }

    #[tokio::test]
    async fn test_run_git_outside_repository_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let output = run_git(dir.path(), &["rev-parse", "HEAD"], DEFAULT_GIT_TIMEOUT)
            .await
            .unwrap();
        assert!(!output.status.success());
    }
}
