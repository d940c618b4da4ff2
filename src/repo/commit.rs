//! Commit message and patch retrieval

use super::run_git;
use crate::error::LookupError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

const DIFF_MARKER: &str = "\ndiff --git";

/// Message and file-scoped patch of one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetails {
    pub commit_id: String,
    pub message: String,
    pub patch: String,
}

/// Runs `git show --pretty=fuller --patch` against a fixed repository root
#[derive(Debug, Clone)]
pub struct CommitInspector {
    root: PathBuf,
    timeout: Duration,
}

impl CommitInspector {
    pub fn new(root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            root: root.into(),
            timeout,
        }
    }

    /// Fetch the message and the patch touching `path` for `commit_id`
    pub async fn details(&self, commit_id: &str, path: &str) -> Result<CommitDetails, LookupError> {
        let output = run_git(
            &self.root,
            &["show", "--pretty=fuller", "--patch", commit_id, "--", path],
            self.timeout,
        )
        .await?;

        if !output.status.success() {
            return Err(LookupError::external(
                "git show",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let (message, patch) = split_commit_output(&text);
        debug!(
            "commit {} for {}: {} message bytes, {} patch bytes",
            commit_id,
            path,
            message.len(),
            patch.len()
        );

        Ok(CommitDetails {
            commit_id: commit_id.to_string(),
            message,
            patch,
        })
    }
}

/// Split `git show` output at the first diff header into (message, patch)
pub fn split_commit_output(text: &str) -> (String, String) {
    match text.find(DIFF_MARKER) {
        Some(index) => (
            text[..index].trim().to_string(),
            text[index..].trim().to_string(),
        ),
        None => (text.trim().to_string(), String::new()),
    }
}

/// Everything before the first diff header
pub fn extract_commit_message(text: &str) -> String {
    split_commit_output(text).0
}

/// Everything from the first diff header on, or empty if there is none
pub fn extract_patch(text: &str) -> String {
    split_commit_output(text).1
}
