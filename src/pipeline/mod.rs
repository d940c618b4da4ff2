//! Concept analysis pipeline
//!
//! hints -> code lines -> dedup -> frequency table -> clusters -> sampling
//! -> declaration lookups -> explanations. Every per-item failure is logged
//! and skipped; only the absence of any usable line yields an empty report.

mod hints;

pub use hints::{parse_hints, HintSet, HintSource, JsonHintSource, SearchHit};

use crate::cluster::{
    assign_clusters, dedup_lines, dedup_snippets, lookup_budget, sample_lines, CodeLine,
    ConceptCluster, SourceKind, TokenFrequencyTable,
};
use crate::extract::{CodeSnippet, DeclarationLocator, SnippetKind};
use crate::llm::{explain_or_fallback, Explainer};
use crate::repo::revision::snapshot_revision;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Reference hits considered per search
const MAX_REFERENCE_HITS: usize = 100;

/// Index classifications of definition hits that are kept
const DEFINITION_HIT_KINDS: [&str; 2] = ["struct", "function"];

/// Result of analyzing one concept
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterReport {
    pub id: Uuid,
    pub concept: String,
    pub revision: String,
    pub total_code_lines: usize,
    pub total_clusters: usize,
    pub summary: String,
    pub clusters: Vec<ClusterView>,
    pub generated_at: DateTime<Utc>,
}

/// One cluster with its located code
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    pub cluster_key: String,
    pub core_tokens: Vec<String>,
    pub frequency: usize,
    /// Lines assigned before sampling
    pub line_count: usize,
    pub members: Vec<ClusterMember>,
    pub explanation: Option<String>,
}

/// A located declaration (or bare line) inside a cluster
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterMember {
    pub file_path: String,
    pub line_number: usize,
    pub end_line: usize,
    pub code_text: String,
    pub declaration_kind: String,
    pub name: Option<String>,
}

impl From<CodeSnippet> for ClusterMember {
    fn from(snippet: CodeSnippet) -> Self {
        Self {
            declaration_kind: snippet.kind.to_string(),
            file_path: snippet.file_path,
            line_number: snippet.start_line,
            end_line: snippet.end_line,
            code_text: snippet.code,
            name: snippet.name,
        }
    }
}

/// Orchestrates clustering and enrichment for a concept
pub struct ConceptAnalyzer {
    locator: DeclarationLocator,
    explainer: Option<Arc<dyn Explainer>>,
    workers: usize,
}

impl ConceptAnalyzer {
    pub fn new(locator: DeclarationLocator, workers: usize) -> Self {
        Self {
            locator,
            explainer: None,
            workers: workers.max(1),
        }
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = Some(explainer);
        self
    }

    /// Search the hint source for `concept` and cluster the results
    pub async fn analyze(
        &self,
        concept: &str,
        hints: &dyn HintSource,
        revision: Option<&str>,
    ) -> Result<ClusterReport> {
        let revision = snapshot_revision(revision);
        let hits = hints.search(concept, &revision).await?;
        info!(
            "{} definition and {} reference hits for {:?}",
            hits.definitions.len(),
            hits.references.len(),
            concept
        );

        let lines = self.collect_lines(&hits, &revision).await;
        Ok(self.analyze_lines(concept, lines, &revision).await)
    }

    /// Turn hints into code lines by reading each hinted line from its snapshot
    ///
    /// Definition hits are kept only for structs and functions, and only the
    /// first references are used. Absent, unreadable or blank lines are skipped.
    pub async fn collect_lines(&self, hints: &HintSet, revision: &str) -> Vec<CodeLine> {
        let definitions = hints.definitions.iter().filter(|hit| {
            hit.kind.as_deref().is_some_and(|kind| {
                DEFINITION_HIT_KINDS.contains(&kind.to_ascii_lowercase().as_str())
            })
        });
        let references = hints.references.iter().take(MAX_REFERENCE_HITS);

        let wanted: Vec<(&str, usize, SourceKind)> = definitions
            .map(|hit| (hit, SourceKind::Definitions))
            .chain(references.map(|hit| (hit, SourceKind::References)))
            .flat_map(|(hit, kind)| hit.lines.iter().map(move |&n| (hit.path.as_str(), n, kind)))
            .collect();

        let mut paths: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for (path, _, _) in &wanted {
            if seen.insert(*path) {
                paths.push(path.to_string());
            }
        }

        let snapshots = self.locator.snapshots().clone();
        let rev = revision.to_string();
        let texts = run_bounded(self.workers, paths.clone(), move |path| {
            let snapshots = snapshots.clone();
            let rev = rev.clone();
            async move { snapshots.read_text(&rev, &path).await }
        })
        .await;

        let mut files: HashMap<&str, String> = HashMap::new();
        for (path, text) in paths.iter().zip(texts) {
            match text {
                Some(Ok(Some(text))) => {
                    files.insert(path.as_str(), text);
                }
                Some(Ok(None)) => debug!("{} not present at {}", path, revision),
                Some(Err(e)) => warn!("Skipping {}: {}", path, e),
                None => {}
            }
        }

        wanted
            .into_iter()
            .filter_map(|(path, number, kind)| {
                let text = files.get(path)?.lines().nth(number.checked_sub(1)?)?.trim();
                (!text.is_empty()).then(|| CodeLine::new(path, number, text, kind))
            })
            .collect()
    }

    /// Cluster already materialized lines and locate their declarations
    pub async fn analyze_lines(
        &self,
        concept: &str,
        lines: Vec<CodeLine>,
        revision: &str,
    ) -> ClusterReport {
        let revision = snapshot_revision(Some(revision));
        let lines = dedup_lines(lines);

        if lines.is_empty() {
            info!("No related code found for {:?}", concept);
            return ClusterReport {
                id: Uuid::new_v4(),
                concept: concept.to_string(),
                revision,
                total_code_lines: 0,
                total_clusters: 0,
                summary: format!("no related code found for '{}'", concept),
                clusters: Vec::new(),
                generated_at: Utc::now(),
            };
        }

        let table = TokenFrequencyTable::from_lines(&lines);
        let clusters = assign_clusters(&lines, concept, &table);

        let mut views = Vec::with_capacity(clusters.len());
        for cluster in &clusters {
            views.push(self.enrich(concept, cluster, &revision).await);
        }

        info!(
            "Grouped {} lines about {:?} into {} clusters",
            lines.len(),
            concept,
            views.len()
        );

        ClusterReport {
            id: Uuid::new_v4(),
            concept: concept.to_string(),
            summary: format!(
                "{} code lines about '{}' grouped into {} clusters",
                lines.len(),
                concept,
                views.len()
            ),
            revision,
            total_code_lines: lines.len(),
            total_clusters: views.len(),
            clusters: views,
            generated_at: Utc::now(),
        }
    }

    async fn enrich(&self, concept: &str, cluster: &ConceptCluster, revision: &str) -> ClusterView {
        let sampled = sample_lines(&cluster.members);
        let budget = lookup_budget(&sampled);
        debug!(
            "Cluster {:?}: {} lines, {} sampled, {} lookups",
            cluster.key,
            cluster.members.len(),
            sampled.len(),
            budget.len()
        );

        let snippets = dedup_snippets(self.locate_members(budget, revision).await);

        let explanation = match &self.explainer {
            Some(explainer) => Some(explain_or_fallback(explainer.as_ref(), concept, cluster).await),
            None => None,
        };

        ClusterView {
            cluster_key: cluster.key.clone(),
            core_tokens: cluster.core_tokens.clone(),
            frequency: cluster.frequency,
            line_count: cluster.members.len(),
            members: snippets.into_iter().map(ClusterMember::from).collect(),
            explanation,
        }
    }

    /// Locate the declaration of every line, falling back to the bare line
    async fn locate_members(&self, lines: Vec<CodeLine>, revision: &str) -> Vec<CodeSnippet> {
        let locator = self.locator.clone();
        let rev = revision.to_string();

        let outcomes = run_bounded(self.workers, lines, move |line| {
            let locator = locator.clone();
            let rev = rev.clone();
            async move {
                let outcome = locator
                    .locate_by_line(&line.file_path, line.line_number, &rev)
                    .await;
                (line, outcome)
            }
        })
        .await;

        outcomes
            .into_iter()
            .flatten()
            .map(|(line, outcome)| match outcome {
                Ok(Some(snippet)) => snippet,
                Ok(None) => single_line_snippet(&line, revision),
                Err(e) => {
                    warn!("Lookup failed for {}: {}", line.key(), e);
                    single_line_snippet(&line, revision)
                }
            })
            .collect()
    }
}

fn single_line_snippet(line: &CodeLine, revision: &str) -> CodeSnippet {
    CodeSnippet {
        file_path: line.file_path.clone(),
        revision: revision.to_string(),
        kind: SnippetKind::SingleLine,
        name: None,
        start_line: line.line_number,
        end_line: line.line_number,
        code: line.text.trim().to_string(),
    }
}

/// Run `task` over `inputs` with at most `limit` in flight, results in input order
///
/// A slot is `None` only if its task panicked.
async fn run_bounded<I, T, F, Fut>(limit: usize, inputs: Vec<I>, task: F) -> Vec<Option<T>>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut join_set = JoinSet::new();
    let count = inputs.len();

    for (index, input) in inputs.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let work = task(input);
        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, work.await)
        });
    }

    let mut results: Vec<Option<T>> = (0..count).map(|_| None).collect();
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((index, value)) => results[index] = Some(value),
            Err(e) => warn!("Lookup task failed: {}", e),
        }
    }
    results
}
