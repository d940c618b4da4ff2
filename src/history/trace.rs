//! Commit history joined with code at each commit's version

use super::{CommitRecord, TrackerClient};
use crate::error::LookupError;
use crate::extract::{CodeSnippet, DeclarationLocator};
use crate::repo::revision::snapshot_revision;
use crate::repo::{CommitDetails, CommitInspector};
use serde::Serialize;
use tracing::warn;

/// A tracker record with the method body and, optionally, the commit patch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracedCommit {
    #[serde(flatten)]
    pub record: CommitRecord,
    /// Revision the code was read at
    pub code_revision: String,
    pub code: Option<CodeSnippet>,
    pub details: Option<CommitDetails>,
}

/// Combines the tracker, the declaration locator and the commit inspector
pub struct CommitTracer {
    tracker: TrackerClient,
    locator: DeclarationLocator,
    inspector: CommitInspector,
}

impl CommitTracer {
    pub fn new(tracker: TrackerClient, locator: DeclarationLocator, inspector: CommitInspector) -> Self {
        Self {
            tracker,
            locator,
            inspector,
        }
    }

    /// Trace a method through its commits
    ///
    /// The tracker call itself must succeed; per-commit code and patch lookups
    /// that fail are logged and left empty.
    pub async fn trace(
        &self,
        file_path: &str,
        method_name: &str,
        revision: &str,
        target_commit: Option<&str>,
        with_details: bool,
    ) -> Result<Vec<TracedCommit>, LookupError> {
        let records = self
            .tracker
            .history(file_path, method_name, revision, target_commit)
            .await?;

        let mut traced = Vec::with_capacity(records.len());
        for record in records {
            let version = record
                .version
                .as_deref()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(revision);
            let code_revision = snapshot_revision(Some(version));

            let code = match self
                .locator
                .resolve_method(file_path, method_name, &code_revision)
                .await
            {
                Ok(code) => code,
                Err(e) => {
                    warn!("No code for {} at {}: {}", method_name, code_revision, e);
                    None
                }
            };

            let details = if with_details {
                match self.inspector.details(&record.commit_id, file_path).await {
                    Ok(details) => Some(details),
                    Err(e) => {
                        warn!("No details for commit {}: {}", record.commit_id, e);
                        None
                    }
                }
            } else {
                None
            };

            traced.push(TracedCommit {
                record,
                code_revision,
                code,
                details,
            });
        }

        Ok(traced)
    }
}
