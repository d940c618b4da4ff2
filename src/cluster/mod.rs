//! Identifier clustering
//!
//! This module handles:
//! - Identifier extraction and tokenization with stop-word filtering
//! - Token frequency mining and core concept ranking
//! - Partitioning located lines into concept clusters
//! - Deduplication and bounded sampling before span lookups

mod assign;
mod frequency;
mod sample;
mod tokenize;

pub use assign::assign_clusters;
pub use frequency::{TokenFrequencyTable, MAX_CORE_CONCEPTS};
pub use sample::{dedup_lines, dedup_snippets, lookup_budget, sample_lines};
pub use tokenize::{concept_tokens, extract_identifiers, is_concept_token, is_stop_word, tokenize};

use serde::{Deserialize, Serialize};

/// Reserved key of the cluster holding every definition site
pub const CORE_DEFINITIONS: &str = "core definitions";

/// Provenance of a candidate line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Definitions,
    References,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Definitions => write!(f, "definitions"),
            SourceKind::References => write!(f, "references"),
        }
    }
}

/// A source line that mentions the searched concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeLine {
    pub file_path: String,
    pub line_number: usize,
    pub text: String,
    /// Identifiers of `text`, in order of first appearance
    pub identifiers: Vec<String>,
    pub source_kind: SourceKind,
}

impl CodeLine {
    pub fn new(
        file_path: impl Into<String>,
        line_number: usize,
        text: impl Into<String>,
        source_kind: SourceKind,
    ) -> Self {
        let text = text.into();
        let identifiers = extract_identifiers(&text);
        Self {
            file_path: file_path.into(),
            line_number,
            text,
            identifiers,
            source_kind,
        }
    }

    /// Deduplication key: `path:line`
    pub fn key(&self) -> String {
        format!("{}:{}", self.file_path, self.line_number)
    }

    pub fn is_definition(&self) -> bool {
        self.source_kind == SourceKind::Definitions
    }
}

/// Lines grouped under one core concept
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConceptCluster {
    pub key: String,
    pub members: Vec<CodeLine>,
    pub core_tokens: Vec<String>,
    pub frequency: usize,
}

impl ConceptCluster {
    pub fn is_core_definitions(&self) -> bool {
        self.key == CORE_DEFINITIONS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_line_identifiers() {
        let line = CodeLine::new("fair.c", 100, "struct sched_entity *se;", SourceKind::Definitions);
        assert_eq!(line.identifiers, vec!["sched_entity", "se"]);
        assert_eq!(line.key(), "fair.c:100");
        assert!(line.is_definition());
    }

    #[test]
    fn test_code_line_json_shape() {
        let line = CodeLine::new("core.c", 7, "rq->nr_running++;", SourceKind::References);
        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["filePath"], "core.c");
        assert_eq!(json["lineNumber"], 7);
        assert_eq!(json["sourceKind"], "references");
    }
}
