//! Cluster explanations
//!
//! This module handles:
//! - The explainer seam the clustering pipeline calls into
//! - An LLM-backed explainer (Ollama or OpenAI-compatible)
//! - A bounded cache of explanations

mod client;
mod prompts;

pub use client::{LlmClient, LlmConfig, LlmProvider};
pub use prompts::ClusterPrompt;

use crate::cluster::ConceptCluster;
use anyhow::Result;
use async_trait::async_trait;
use lru::LruCache;
use sha2::{Digest, Sha256};
use std::num::NonZeroUsize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Produces a short explanation of what a cluster means for a concept
#[async_trait]
pub trait Explainer: Send + Sync {
    async fn explain(&self, concept: &str, cluster: &ConceptCluster) -> Result<String>;
}

/// Explainer backed by an LLM completion
pub struct LlmExplainer {
    client: LlmClient,
}

impl LlmExplainer {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Explainer for LlmExplainer {
    async fn explain(&self, concept: &str, cluster: &ConceptCluster) -> Result<String> {
        let prompt = ClusterPrompt::generate(concept, cluster);
        debug!("Explaining cluster {:?} with {}", cluster.key, self.client.model());
        let text = self.client.complete(&prompt).await?;
        Ok(text.trim().to_string())
    }
}

/// Explainer that only produces the generated summary
pub struct SummaryExplainer;

#[async_trait]
impl Explainer for SummaryExplainer {
    async fn explain(&self, concept: &str, cluster: &ConceptCluster) -> Result<String> {
        Ok(fallback_explanation(concept, cluster))
    }
}

/// Wraps an explainer with an LRU cache keyed by concept and cluster content
pub struct CachedExplainer<E> {
    inner: E,
    cache: Mutex<LruCache<String, String>>,
}

impl<E: Explainer> CachedExplainer<E> {
    pub fn new(inner: E, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.lock().await.is_empty()
    }
}

#[async_trait]
impl<E: Explainer> Explainer for CachedExplainer<E> {
    async fn explain(&self, concept: &str, cluster: &ConceptCluster) -> Result<String> {
        let key = cache_key(concept, cluster);

        if let Some(hit) = self.cache.lock().await.get(&key).cloned() {
            debug!("Explanation cache hit for {:?}", cluster.key);
            return Ok(hit);
        }

        let explanation = self.inner.explain(concept, cluster).await?;
        self.cache.lock().await.put(key, explanation.clone());
        Ok(explanation)
    }
}

/// Concept plus a digest of the cluster key and its member lines
fn cache_key(concept: &str, cluster: &ConceptCluster) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cluster.key.as_bytes());
    for member in &cluster.members {
        hasher.update(b"\n");
        hasher.update(member.key().as_bytes());
    }
    format!("{}:{}", concept, hex::encode(hasher.finalize()))
}

/// Explanation used when no explainer is configured or it fails
pub fn fallback_explanation(concept: &str, cluster: &ConceptCluster) -> String {
    if cluster.is_core_definitions() {
        format!("{} definition sites of {}", cluster.members.len(), concept)
    } else {
        format!(
            "{} lines where {} appears together with '{}'",
            cluster.members.len(),
            concept,
            cluster.key
        )
    }
}

/// Ask the explainer, falling back to a generated summary on failure
pub async fn explain_or_fallback(
    explainer: &dyn Explainer,
    concept: &str,
    cluster: &ConceptCluster,
) -> String {
    match explainer.explain(concept, cluster).await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => fallback_explanation(concept, cluster),
        Err(e) => {
            warn!("Failed to explain cluster {:?}: {}", cluster.key, e);
            fallback_explanation(concept, cluster)
        }
    }
}
