//! Locator hints: candidate (file, line) hits from a code index

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// Candidate lines of one file reported by the index
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    pub path: String,
    #[serde(rename = "line", deserialize_with = "line_list")]
    pub lines: Vec<usize>,
    /// Index classification such as `function`, `struct` or `member`
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Everything the index knows about one identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HintSet {
    #[serde(default)]
    pub definitions: Vec<SearchHit>,
    #[serde(default)]
    pub references: Vec<SearchHit>,
    #[serde(default)]
    pub documentations: Vec<SearchHit>,
}

impl HintSet {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty() && self.references.is_empty() && self.documentations.is_empty()
    }

    /// Append another set's hits after this one's
    pub fn extend(&mut self, other: HintSet) {
        self.definitions.extend(other.definitions);
        self.references.extend(other.references);
        self.documentations.extend(other.documentations);
    }
}

/// Source of candidate hits for an identifier
#[async_trait]
pub trait HintSource: Send + Sync {
    async fn search(&self, entity: &str, revision: &str) -> Result<HintSet>;
}

/// Hints previously exported from the index as JSON
///
/// The file holds one hint object or an array of them; arrays are merged.
pub struct JsonHintSource {
    path: PathBuf,
}

impl JsonHintSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HintDocument {
    One(HintSet),
    Many(Vec<HintSet>),
}

/// Parse exported hint JSON
pub fn parse_hints(json: &str) -> Result<HintSet> {
    let document: HintDocument = serde_json::from_str(json).context("Failed to parse hint JSON")?;
    Ok(match document {
        HintDocument::One(set) => set,
        HintDocument::Many(sets) => sets.into_iter().fold(HintSet::default(), |mut all, set| {
            all.extend(set);
            all
        }),
    })
}

#[async_trait]
impl HintSource for JsonHintSource {
    async fn search(&self, _entity: &str, _revision: &str) -> Result<HintSet> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read hint file: {:?}", self.path))?;
        parse_hints(&json)
    }
}

/// Lines arrive as `"12,40,41"` or as a bare number; unparseable entries are skipped
fn line_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<usize>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum LineSpec {
        Number(usize),
        Text(String),
        List(Vec<usize>),
    }

    Ok(match LineSpec::deserialize(deserializer)? {
        LineSpec::Number(n) => vec![n],
        LineSpec::Text(text) => text
            .split(',')
            .filter_map(|part| part.trim().parse().ok())
            .collect(),
        LineSpec::List(lines) => lines,
    }
    .into_iter()
    .filter(|&n| n > 0)
    .collect())
}
