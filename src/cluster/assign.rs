//! Cluster assignment

use super::frequency::{TokenFrequencyTable, MAX_CORE_CONCEPTS};
use super::tokenize::tokenize;
use super::{CodeLine, ConceptCluster, CORE_DEFINITIONS};
use tracing::debug;

/// Partition lines into the definitions cluster plus one cluster per core concept
///
/// Definition lines always land in [`CORE_DEFINITIONS`]. Every other line goes
/// to the first core concept found among its identifier tokens, or to the
/// top-ranked concept when none matches. Empty clusters are omitted and the
/// definitions cluster, when present, comes first.
pub fn assign_clusters(
    lines: &[CodeLine],
    concept: &str,
    table: &TokenFrequencyTable,
) -> Vec<ConceptCluster> {
    let mut core = table.core_concepts(MAX_CORE_CONCEPTS);
    if core.is_empty() {
        // Below the frequency threshold: fall back to the most frequent token
        let fallback = table
            .top_token()
            .map(str::to_string)
            .unwrap_or_else(|| concept.trim().to_lowercase());
        debug!("no core concepts, defaulting to {:?}", fallback);
        core.push(fallback);
    }

    let mut definitions = Vec::new();
    let mut buckets: Vec<Vec<CodeLine>> = vec![Vec::new(); core.len()];

    for line in lines {
        if line.is_definition() {
            definitions.push(line.clone());
            continue;
        }

        let index = line
            .identifiers
            .iter()
            .flat_map(|ident| tokenize(ident))
            .find_map(|token| core.iter().position(|c| *c == token))
            .unwrap_or(0);
        buckets[index].push(line.clone());
    }

    let mut clusters = Vec::new();

    if !definitions.is_empty() {
        clusters.push(ConceptCluster {
            key: CORE_DEFINITIONS.to_string(),
            frequency: definitions.len(),
            members: definitions,
            core_tokens: vec![concept.to_string(), "definition".to_string(), "core".to_string()],
        });
    }

    for (token, members) in core.into_iter().zip(buckets) {
        if members.is_empty() {
            continue;
        }
        let frequency = match table.get(&token) {
            0 => members.len(),
            count => count,
        };
        clusters.push(ConceptCluster {
            key: token.clone(),
            members,
            core_tokens: vec![token],
            frequency,
        });
    }

    debug!(
        "assigned {} lines to {} clusters for {:?}",
        lines.len(),
        clusters.len(),
        concept
    );
    clusters
}
