//! C declaration extraction using tree-sitter
//!
//! Files are parsed standalone: macros are not expanded and includes are not
//! followed, so kernel headers often produce partial trees with ERROR nodes.
//! The traversal descends into those and into preprocessor conditionals, and
//! reports only top-level declarations:
//! - Function definitions
//! - Declarations and typedefs (classified by their composite type, if any)
//! - Bare struct / union / enum definitions

use super::{slice_lines, DeclarationKind, DeclarationSpan};
use crate::error::LookupError;
use tree_sitter::{Node, Tree};

/// Node kinds that are reported as declarations
const DECLARATION_KINDS: &[&str] = &[
    "function_definition",
    "declaration",
    "type_definition",
    "struct_specifier",
    "union_specifier",
    "enum_specifier",
];

/// Node kinds whose children are still at top level
const CONTAINER_KINDS: &[&str] = &[
    "translation_unit",
    "preproc_if",
    "preproc_ifdef",
    "preproc_else",
    "preproc_elif",
    "preproc_elifdef",
    "linkage_specification",
    "declaration_list",
    "ERROR",
];

/// Parser configured for the C grammar
pub struct CSourceParser {
    parser: tree_sitter::Parser,
}

impl CSourceParser {
    pub fn new() -> Result<Self, LookupError> {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&tree_sitter_c::LANGUAGE.into())
            .map_err(|e| LookupError::ParseFailure {
                path: "<grammar>".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { parser })
    }

    /// Parse one snapshot
    pub fn parse(&mut self, path: &str, source: String) -> Result<ParsedSource, LookupError> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| LookupError::ParseFailure {
                path: path.to_string(),
                reason: "parser produced no tree".to_string(),
            })?;

        let line_count = source.lines().count();
        Ok(ParsedSource {
            source,
            tree,
            line_count,
        })
    }
}

/// A snapshot together with its syntax tree
pub struct ParsedSource {
    source: String,
    tree: Tree,
    line_count: usize,
}

impl ParsedSource {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn line_count(&self) -> usize {
        self.line_count
    }

    /// Whether tree-sitter had to recover from syntax errors
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Text covered by a span, clamped to the snapshot
    pub fn snippet(&self, start_line: usize, end_line: usize) -> String {
        slice_lines(&self.source, start_line, end_line)
    }

    /// All top-level declarations in pre-order
    pub fn declarations(&self) -> Vec<DeclarationSpan> {
        let mut spans = Vec::new();
        find_declaration(self.tree.root_node(), &mut |node| {
            spans.push(self.span(node));
            false
        });
        spans
    }

    /// Outermost top-level declaration whose range contains `line`
    pub fn declaration_at_line(&self, line: usize) -> Option<DeclarationSpan> {
        find_declaration(self.tree.root_node(), &mut |node| {
            let (start, end) = self.line_range(node);
            start <= line && line <= end
        })
        .map(|node| self.span(node))
    }

    /// First declaration named exactly `name`
    ///
    /// Function definitions match on the declarator name and declarations on
    /// their first declarator. With `match_tags`, struct/union/enum tag names
    /// match as well.
    pub fn declaration_named(&self, name: &str, match_tags: bool) -> Option<DeclarationSpan> {
        let bytes = self.source.as_bytes();
        find_declaration(self.tree.root_node(), &mut |node| {
            declared_name(node, bytes).as_deref() == Some(name)
                || (match_tags && tag_name(node, bytes).as_deref() == Some(name))
        })
        .map(|node| self.span(node))
    }

    /// First comment whose range contains `line`, as (start, end)
    pub fn comment_at_line(&self, line: usize) -> Option<(usize, usize)> {
        find_comment(self.tree.root_node(), &|node| {
            let (start, end) = self.line_range(node);
            start <= line && line <= end
        })
        .map(|node| self.line_range(node))
    }

    fn span(&self, node: Node) -> DeclarationSpan {
        let bytes = self.source.as_bytes();
        let (start_line, end_line) = self.line_range(node);

        DeclarationSpan {
            kind: classify(node),
            start_line,
            end_line,
            name: declared_name(node, bytes).or_else(|| tag_name(node, bytes)),
        }
    }

    /// 1-based inclusive line range, never past the end of the snapshot
    fn line_range(&self, node: Node) -> (usize, usize) {
        let start = node.start_position().row + 1;
        let end_position = node.end_position();
        let mut end = end_position.row + 1;

        // A node that swallowed the trailing newline ends on the previous line
        if end_position.column == 0 && end > start {
            end -= 1;
        }

        (start, end.min(self.line_count.max(start)))
    }
}

/// Pre-order walk over top-level declarations, stopping at the first accepted one
fn find_declaration<'t>(
    node: Node<'t>,
    accept: &mut dyn FnMut(Node<'t>) -> bool,
) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find_map(|child| {
        if DECLARATION_KINDS.contains(&child.kind()) {
            accept(child).then_some(child)
        } else if CONTAINER_KINDS.contains(&child.kind()) {
            find_declaration(child, &mut *accept)
        } else {
            None
        }
    });
    found
}

/// Pre-order walk over every comment node
fn find_comment<'t>(node: Node<'t>, accept: &dyn Fn(Node<'t>) -> bool) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find_map(|child| {
        if child.kind() == "comment" {
            accept(child).then_some(child)
        } else {
            find_comment(child, accept)
        }
    });
    found
}

fn classify(node: Node) -> DeclarationKind {
    match node.kind() {
        "function_definition" => DeclarationKind::Function,
        "declaration" | "type_definition" => node
            .child_by_field_name("type")
            .and_then(composite_kind)
            .unwrap_or(DeclarationKind::Declaration),
        "struct_specifier" | "union_specifier" | "enum_specifier" => {
            composite_kind(node).unwrap_or(DeclarationKind::Declaration)
        }
        _ => DeclarationKind::Unknown,
    }
}

/// Kind of a composite type specifier that carries a body
fn composite_kind(node: Node) -> Option<DeclarationKind> {
    node.child_by_field_name("body")?;
    match node.kind() {
        "struct_specifier" => Some(DeclarationKind::Struct),
        "union_specifier" => Some(DeclarationKind::Union),
        "enum_specifier" => Some(DeclarationKind::Enum),
        _ => None,
    }
}

/// Declarator name of a function, or the first declarator of a declaration
fn declared_name(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "function_definition" | "declaration" | "type_definition" => {
            declarator_identifier(node.child_by_field_name("declarator")?, source)
        }
        _ => None,
    }
}

/// Tag of the composite type a declaration defines, if any
fn tag_name(node: Node, source: &[u8]) -> Option<String> {
    let composite = match node.kind() {
        "struct_specifier" | "union_specifier" | "enum_specifier" => node,
        "declaration" | "type_definition" => node.child_by_field_name("type")?,
        _ => return None,
    };
    node_text(composite.child_by_field_name("name")?, source)
}

/// Text of a name node; nodes inserted by error recovery have none
fn node_text(node: Node, source: &[u8]) -> Option<String> {
    if node.is_missing() {
        return None;
    }
    node.utf8_text(source)
        .ok()
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

/// Follow nested declarators (pointer, function, array, init) down to the identifier
fn declarator_identifier(node: Node, source: &[u8]) -> Option<String> {
    match node.kind() {
        "identifier" | "field_identifier" | "type_identifier" => node_text(node, source),
        _ => {
            let inner = node
                .child_by_field_name("declarator")
                .or_else(|| node.named_child(0))?;
            declarator_identifier(inner, source)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAIR_C: &str = r#"// SPDX-License-Identifier: GPL-2.0
#include <linux/sched.h>

/*
 * Scheduling entity bookkeeping.
 */
struct sched_entity {
	unsigned long load;
	int on_rq;
};

union sched_key {
	int id;
	long raw;
};

enum sched_state {
	SCHED_IDLE,
	SCHED_RUNNING,
};

typedef struct {
	int weight;
} load_weight_t;

static int sysctl_sched_base_slice = 750000;

static struct sched_entity *pick_next_entity(struct sched_entity *curr)
{
	if (!curr)
		return NULL;
	return curr;
}

#ifdef CONFIG_SMP
void update_load_avg(struct sched_entity *se)
{
	se->load = 1;
}
#endif
"#;

    fn parse(source: &str) -> ParsedSource {
        CSourceParser::new()
            .unwrap()
            .parse("kernel/sched/fair.c", source.to_string())
            .unwrap()
    }

    #[test]
    fn test_declarations_in_order() {
        let parsed = parse(FAIR_C);
        let spans = parsed.declarations();
        let kinds: Vec<_> = spans.iter().map(|s| s.kind).collect();

        assert_eq!(
            kinds,
            vec![
                DeclarationKind::Struct,
                DeclarationKind::Union,
                DeclarationKind::Enum,
                DeclarationKind::Struct,
                DeclarationKind::Declaration,
                DeclarationKind::Function,
                DeclarationKind::Function,
            ]
        );
        assert_eq!(spans[0].name.as_deref(), Some("sched_entity"));
        assert_eq!(spans[3].name.as_deref(), Some("load_weight_t"));
        assert_eq!(spans[4].name.as_deref(), Some("sysctl_sched_base_slice"));
    }

    #[test]
    fn test_declaration_at_line() {
        let parsed = parse(FAIR_C);

        let span = parsed.declaration_at_line(9).unwrap();
        assert_eq!(span.kind, DeclarationKind::Struct);
        assert_eq!((span.start_line, span.end_line), (7, 10));

        let span = parsed.declaration_at_line(32).unwrap();
        assert_eq!(span.kind, DeclarationKind::Function);
        assert_eq!(span.name.as_deref(), Some("pick_next_entity"));
        assert!(span.start_line <= 32 && 32 <= span.end_line);

        assert!(parsed.declaration_at_line(2).is_none());
    }

    #[test]
    fn test_declaration_inside_preprocessor_block() {
        let parsed = parse(FAIR_C);
        let span = parsed.declaration_at_line(38).unwrap();
        assert_eq!(span.name.as_deref(), Some("update_load_avg"));
        assert_eq!((span.start_line, span.end_line), (36, 39));
        assert_eq!(
            parsed.snippet(span.start_line, span.end_line).lines().next(),
            Some("void update_load_avg(struct sched_entity *se)")
        );
        assert!(parsed.declaration_at_line(40).is_none());
    }

    #[test]
    fn test_declaration_named() {
        let parsed = parse(FAIR_C);

        let span = parsed.declaration_named("pick_next_entity", false).unwrap();
        assert_eq!(span.kind, DeclarationKind::Function);

        assert!(parsed.declaration_named("sched_entity", false).is_none());
        let span = parsed.declaration_named("sched_entity", true).unwrap();
        assert_eq!(span.kind, DeclarationKind::Struct);

        assert!(parsed.declaration_named("Pick_Next_Entity", true).is_none());
    }

    #[test]
    fn test_comment_at_line() {
        let parsed = parse(FAIR_C);
        assert_eq!(parsed.comment_at_line(5), Some((4, 6)));
        assert_eq!(parsed.comment_at_line(1), Some((1, 1)));
        assert_eq!(parsed.comment_at_line(8), None);
    }

    #[test]
    fn test_macro_declaration_has_no_empty_name() {
        let parsed = parse("static DEFINE_PER_CPU(int, counter);\n");
        let span = parsed.declaration_at_line(1).unwrap();
        assert_eq!(span.name, None);
        assert!(parsed.declaration_named("", false).is_none());
    }

    #[test]
    fn test_garbage_yields_no_declarations() {
        let parsed = parse("@@@ ### $$$\n");
        assert!(parsed.declaration_at_line(1).is_none());
    }
}
