//! Token frequency mining

use super::tokenize::{is_concept_token, tokenize};
use super::CodeLine;
use std::collections::HashMap;

/// Upper bound on ranked core concepts
pub const MAX_CORE_CONCEPTS: usize = 10;

/// Tokens need at least this many occurrences to become a core concept
const MIN_CONCEPT_FREQUENCY: usize = 2;

/// Token occurrence counts, remembering the order tokens were first seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenFrequencyTable {
    counts: HashMap<String, usize>,
    order: Vec<String>,
}

impl TokenFrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every token of every identifier of every line
    ///
    /// Short tokens and stop words are counted too; they are only skipped
    /// when concepts are selected.
    pub fn from_lines(lines: &[CodeLine]) -> Self {
        let mut table = Self::new();
        for line in lines {
            for token in line.identifiers.iter().flat_map(|ident| tokenize(ident)) {
                table.add(token, 1);
            }
        }
        table
    }

    pub fn add(&mut self, token: String, count: usize) {
        match self.counts.get_mut(&token) {
            Some(existing) => *existing += count,
            None => {
                self.order.push(token.clone());
                self.counts.insert(token, count);
            }
        }
    }

    /// Fold another table in; tokens new to `self` are ordered after its own
    pub fn merge(&mut self, other: TokenFrequencyTable) {
        let TokenFrequencyTable { mut counts, order } = other;
        for token in order {
            if let Some(count) = counts.remove(&token) {
                self.add(token, count);
            }
        }
    }

    pub fn get(&self, token: &str) -> usize {
        self.counts.get(token).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Tokens seen at least twice, most frequent first, ties by first sight
    pub fn core_concepts(&self, limit: usize) -> Vec<String> {
        let mut ranked: Vec<&String> = self
            .order
            .iter()
            .filter(|token| is_concept_token(token))
            .filter(|token| self.get(token) >= MIN_CONCEPT_FREQUENCY)
            .collect();
        // Stable sort keeps first-seen order among equal counts
        ranked.sort_by(|a, b| self.get(b).cmp(&self.get(a)));
        ranked.into_iter().take(limit).cloned().collect()
    }

    /// Most frequent concept token regardless of threshold, ties by first sight
    pub fn top_token(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for token in self.order.iter().filter(|token| is_concept_token(token)) {
            let count = self.get(token);
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((token.as_str(), count));
            }
        }
        best.map(|(token, _)| token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::SourceKind;
    use pretty_assertions::assert_eq;

    fn line(n: usize, text: &str) -> CodeLine {
        CodeLine::new("core.c", n, text, SourceKind::References)
    }

    #[test]
    fn test_counts_every_occurrence() {
        let table = TokenFrequencyTable::from_lines(&[
            line(1, "rq_lock(rq_of(cfs_rq));"),
            line(2, "update_rq_clock(rq);"),
        ]);
        assert_eq!(table.get("lock"), 1);
        assert_eq!(table.get("cfs"), 1);
        assert_eq!(table.get("clock"), 1);
        assert_eq!(table.get("update"), 1);
        assert_eq!(table.get("rq"), 5);
    }

    #[test]
    fn test_short_and_stop_tokens_never_become_concepts() {
        let table = TokenFrequencyTable::from_lines(&[
            line(1, "rq_lock(rq);"),
            line(2, "rq_unlock(rq);"),
            line(3, "get_task_struct(p);"),
            line(4, "get_cpu();"),
        ]);
        assert_eq!(table.get("rq"), 4);
        assert_eq!(table.get("get"), 2);
        assert!(table.core_concepts(MAX_CORE_CONCEPTS).is_empty());
        assert_eq!(table.top_token(), Some("lock"));
    }

    #[test]
    fn test_core_concepts_ranking() {
        let table = TokenFrequencyTable::from_lines(&[
            line(1, "enqueue_entity(cfs_rq, se);"),
            line(2, "dequeue_entity(cfs_rq, se);"),
            line(3, "cfs_bandwidth_used();"),
            line(4, "enqueue_task_fair(rq, entity);"),
        ]);
        // entity: 3, cfs: 3, enqueue: 2, task: 1
        assert_eq!(table.core_concepts(MAX_CORE_CONCEPTS), vec!["entity", "cfs", "enqueue"]);
        assert_eq!(table.core_concepts(1), vec!["entity"]);
    }

    #[test]
    fn test_no_core_concepts_below_threshold() {
        let table = TokenFrequencyTable::from_lines(&[line(1, "struct sched_entity *se;")]);
        assert!(table.core_concepts(MAX_CORE_CONCEPTS).is_empty());
        assert_eq!(table.top_token(), Some("sched"));
    }

    #[test]
    fn test_merge_is_order_independent_in_counts() {
        let a = TokenFrequencyTable::from_lines(&[line(1, "sched_clock();")]);
        let b = TokenFrequencyTable::from_lines(&[line(2, "sched_tick(clock_task);")]);

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        for token in ["sched", "clock", "tick", "task"] {
            assert_eq!(ab.get(token), ba.get(token));
        }
        assert_eq!(ab.get("sched"), 2);
        assert_eq!(ab.len(), 4);
    }
}
