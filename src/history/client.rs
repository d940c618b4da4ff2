//! HTTP client for the commit tracker service

use super::CommitRecord;
use crate::error::LookupError;
use crate::repo::revision::tracker_revision;
use crate::repo::TrackerConfig;
use reqwest::Url;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// Response envelope of `GET /tracker/trackMethod`
#[derive(Debug, Deserialize)]
pub struct TrackerEnvelope {
    pub success: bool,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    /// Commit lists keyed by method signature, in response order
    #[serde(default, deserialize_with = "ordered_groups")]
    pub data: Vec<(String, Vec<CommitRecord>)>,
}

impl TrackerEnvelope {
    /// Records of every group, flattened in response order
    pub fn into_records(self) -> Vec<CommitRecord> {
        self.data
            .into_iter()
            .flat_map(|(method, records)| {
                records.into_iter().map(move |mut record| {
                    record.method = method.clone();
                    record
                })
            })
            .collect()
    }
}

/// Keeps the JSON object's key order, which a map type would lose
fn ordered_groups<'de, D>(deserializer: D) -> Result<Vec<(String, Vec<CommitRecord>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = Vec<(String, Vec<CommitRecord>)>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a map of method signatures to commit lists")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut groups = Vec::new();
            while let Some((method, records)) = map.next_entry::<String, Option<Vec<CommitRecord>>>()? {
                groups.push((method, records.unwrap_or_default()));
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_any(GroupsVisitor)
}

/// Decode a tracker response body into its records
pub fn decode_envelope(body: &str) -> Result<Vec<CommitRecord>, LookupError> {
    let envelope: TrackerEnvelope =
        serde_json::from_str(body).map_err(|e| LookupError::Decode {
            what: "tracker response".to_string(),
            reason: e.to_string(),
        })?;

    if !envelope.success {
        return Err(LookupError::external(
            "tracker",
            envelope.code.as_deref().unwrap_or("unsuccessful"),
            envelope.msg.unwrap_or_default(),
        ));
    }

    Ok(envelope.into_records())
}

/// Client for the external commit tracker
pub struct TrackerClient {
    config: TrackerConfig,
    client: reqwest::Client,
}

impl TrackerClient {
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs.max(1))
    }

    /// Query URL for one method; the revision is sent without its `v` prefix
    pub fn query_url(
        &self,
        file_path: &str,
        method_name: &str,
        revision: &str,
        target_commit: Option<&str>,
    ) -> Result<Url, LookupError> {
        let endpoint = format!(
            "{}/tracker/trackMethod",
            self.config.base_url.trim_end_matches('/')
        );
        let version = tracker_revision(revision);
        let track_num = self.config.track_num.to_string();

        Url::parse_with_params(
            &endpoint,
            &[
                ("repoPath", self.config.repo.as_str()),
                ("filePaths", file_path),
                ("methodName", method_name),
                ("version", version.as_str()),
                ("targetCommit", target_commit.unwrap_or_default()),
                ("trackNum", track_num.as_str()),
            ],
        )
        .map_err(|e| LookupError::external("tracker", "invalid url", e.to_string()))
    }

    /// Commits that touched `method_name` in `file_path`, in tracker order
    pub async fn history(
        &self,
        file_path: &str,
        method_name: &str,
        revision: &str,
        target_commit: Option<&str>,
    ) -> Result<Vec<CommitRecord>, LookupError> {
        let url = self.query_url(file_path, method_name, revision, target_commit)?;
        info!("Querying commit tracker: {}", url);

        let timeout = self.timeout();
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LookupError::Timeout {
                        operation: "tracker request".to_string(),
                        timeout,
                    }
                } else {
                    LookupError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Commit tracker returned {}: {}", status, body);
            return Err(LookupError::external("tracker", status, body));
        }

        let records = decode_envelope(&body)?;
        info!("Commit tracker returned {} commits for {}", records.len(), method_name);
        Ok(records)
    }
}
