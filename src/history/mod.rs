//! Commit history of a method or struct
//!
//! This module handles:
//! - Querying the commit tracker service for the commits that touched a method
//! - Attaching the method body and the commit patch to each record

mod client;
mod trace;

pub use client::{TrackerClient, TrackerEnvelope};
pub use trace::{CommitTracer, TracedCommit};

use serde::{Deserialize, Serialize};

/// One commit reported by the tracker, in the tracker's order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    /// Method signature the tracker grouped this commit under
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub id: Option<i64>,
    pub commit_id: String,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub committer_name: Option<String>,
    #[serde(default)]
    pub author_time: Option<String>,
    #[serde(default)]
    pub commit_time: Option<String>,
    #[serde(default)]
    pub commit_title: Option<String>,
    #[serde(default)]
    pub added: Option<i64>,
    #[serde(default)]
    pub deleted: Option<i64>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub repo: Option<String>,
    /// Free-text category fields
    #[serde(default)]
    pub h1: Option<String>,
    #[serde(default)]
    pub h2: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub newbies_version: Option<String>,
    #[serde(default)]
    pub feature_id: Option<String>,
}

impl CommitRecord {
    /// Short id and title for text output
    pub fn headline(&self) -> String {
        let short = self.commit_id.get(..12).unwrap_or(&self.commit_id);
        format!("{} {}", short, self.commit_title.as_deref().unwrap_or(""))
            .trim_end()
            .to_string()
    }
}
