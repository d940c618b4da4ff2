//! Declaration extraction from C snapshots
//!
//! This module handles:
//! - Parsing a snapshot standalone with tree-sitter (no macro expansion, no includes)
//! - Finding the top-level declaration that covers a line or carries a name
//! - Slicing the declaration's text out of the snapshot

mod code;
mod locator;

pub use code::{CSourceParser, ParsedSource};
pub use locator::{simplify_method_name, DeclarationLocator};

use serde::{Deserialize, Serialize, Serializer};

/// Kind of a top-level C declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    Function,
    Struct,
    Union,
    Enum,
    Declaration,
    Unknown,
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeclarationKind::Function => write!(f, "function"),
            DeclarationKind::Struct => write!(f, "struct"),
            DeclarationKind::Union => write!(f, "union"),
            DeclarationKind::Enum => write!(f, "enum"),
            DeclarationKind::Declaration => write!(f, "declaration"),
            DeclarationKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Line range of a declaration; both ends 1-based and inclusive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationSpan {
    pub kind: DeclarationKind,
    pub start_line: usize,
    pub end_line: usize,
    pub name: Option<String>,
}

impl DeclarationSpan {
    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }
}

/// What a snippet was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    Declaration(DeclarationKind),
    /// A comment block
    Documentation,
    /// The bare line, used when no declaration could be located
    SingleLine,
}

impl std::fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnippetKind::Declaration(kind) => write!(f, "{}", kind),
            SnippetKind::Documentation => write!(f, "documentation"),
            SnippetKind::SingleLine => write!(f, "single_line"),
        }
    }
}

impl Serialize for SnippetKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Text cut out of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub file_path: String,
    pub revision: String,
    pub kind: SnippetKind,
    pub name: Option<String>,
    pub start_line: usize,
    pub end_line: usize,
    pub code: String,
}

impl CodeSnippet {
    /// Key used to drop snippets that cover the same range
    pub fn range_key(&self) -> String {
        format!("{}:{}-{}", self.file_path, self.start_line, self.end_line)
    }

    /// One-line description for logs and text output
    pub fn describe(&self) -> String {
        let name = self.name.as_deref().unwrap_or("<anonymous>");
        format!(
            "{} {} in {} (lines {}-{})",
            self.kind, name, self.file_path, self.start_line, self.end_line
        )
    }
}

/// Inclusive line range of `text`, clamped to the lines that exist, trimmed
pub fn slice_lines(text: &str, start: usize, end: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = start.max(1);
    let end = end.min(lines.len());

    if start > end {
        return String::new();
    }

    lines[start - 1..end].join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_lines_clamps() {
        let text = "a\nb\nc\nd";
        assert_eq!(slice_lines(text, 2, 3), "b\nc");
        assert_eq!(slice_lines(text, 0, 2), "a\nb");
        assert_eq!(slice_lines(text, 3, 99), "c\nd");
        assert_eq!(slice_lines(text, 7, 9), "");
    }

    #[test]
    fn test_slice_lines_trims_indentation_at_edges() {
        let text = "int x;\n    return 0;\n}\n";
        assert_eq!(slice_lines(text, 2, 2), "return 0;");
    }

    #[test]
    fn test_snippet_kind_serializes_as_text() {
        let json = serde_json::to_string(&SnippetKind::Declaration(DeclarationKind::Struct)).unwrap();
        assert_eq!(json, "\"struct\"");
        let json = serde_json::to_string(&SnippetKind::SingleLine).unwrap();
        assert_eq!(json, "\"single_line\"");
    }

    #[test]
    fn test_span_contains() {
        let span = DeclarationSpan {
            kind: DeclarationKind::Function,
            start_line: 10,
            end_line: 20,
            name: Some("pick_next_task_fair".to_string()),
        };
        assert!(span.contains(10));
        assert!(span.contains(20));
        assert!(!span.contains(21));
    }
}
