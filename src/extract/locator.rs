//! Declaration lookups against versioned snapshots

use super::code::{CSourceParser, ParsedSource};
use super::{CodeSnippet, DeclarationSpan, SnippetKind};
use crate::error::{LookupError, LookupResult};
use crate::repo::revision::snapshot_revision;
use crate::repo::SnapshotSource;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

static LEADING_QUALIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(static|inline|extern|void|int|long|char|struct)\s+").unwrap()
});

/// Finds declarations in a file as it existed at a revision
///
/// Every lookup reads the snapshot once, parses it on the blocking pool and
/// returns `Ok(None)` when the file is absent, unparseable, or holds no
/// matching declaration.
#[derive(Clone)]
pub struct DeclarationLocator {
    snapshots: Arc<dyn SnapshotSource>,
}

impl DeclarationLocator {
    pub fn new(snapshots: Arc<dyn SnapshotSource>) -> Self {
        Self { snapshots }
    }

    pub fn snapshots(&self) -> &Arc<dyn SnapshotSource> {
        &self.snapshots
    }

    /// Outermost top-level declaration covering `line`
    pub async fn locate_by_line(
        &self,
        path: &str,
        line: usize,
        revision: &str,
    ) -> LookupResult<CodeSnippet> {
        self.query(path, revision, move |parsed| parsed.declaration_at_line(line))
            .await
    }

    /// First top-level declaration named exactly `name`
    pub async fn locate_by_name(
        &self,
        path: &str,
        name: &str,
        revision: &str,
    ) -> LookupResult<CodeSnippet> {
        let name = name.to_string();
        self.query(path, revision, move |parsed| {
            parsed.declaration_named(&name, false)
        })
        .await
    }

    /// Comment block covering `line`
    pub async fn locate_comment_by_line(
        &self,
        path: &str,
        line: usize,
        revision: &str,
    ) -> LookupResult<CodeSnippet> {
        let revision = snapshot_revision(Some(revision));
        let file_path = path.to_string();
        let snapshot_rev = revision.clone();

        self.with_parsed(path, &revision, move |parsed| {
            let (start_line, end_line) = parsed.comment_at_line(line)?;
            Some(CodeSnippet {
                file_path,
                revision: snapshot_rev,
                kind: SnippetKind::Documentation,
                name: None,
                start_line,
                end_line,
                code: parsed.snippet(start_line, end_line),
            })
        })
        .await
    }

    /// Resolve a method signature such as `static int foo(int)` to its body
    ///
    /// Tries the signature verbatim, then the bare name, then struct, union
    /// and enum tags with the bare name.
    pub async fn resolve_method(
        &self,
        path: &str,
        signature: &str,
        revision: &str,
    ) -> LookupResult<CodeSnippet> {
        let signature = signature.trim().to_string();
        let simple = simplify_method_name(&signature);

        self.query(path, revision, move |parsed| {
            parsed
                .declaration_named(&signature, false)
                .or_else(|| {
                    (!simple.is_empty() && simple != signature)
                        .then(|| parsed.declaration_named(&simple, false))
                        .flatten()
                })
                .or_else(|| {
                    (!simple.is_empty())
                        .then(|| parsed.declaration_named(&simple, true))
                        .flatten()
                })
        })
        .await
    }

    /// Run a span query and cut the matching declaration out of the snapshot
    async fn query<F>(&self, path: &str, revision: &str, find: F) -> LookupResult<CodeSnippet>
    where
        F: FnOnce(&ParsedSource) -> Option<DeclarationSpan> + Send + 'static,
    {
        let revision = snapshot_revision(Some(revision));
        let file_path = path.to_string();
        let snapshot_rev = revision.clone();

        let snippet = self
            .with_parsed(path, &revision, move |parsed| {
                let span = find(parsed)?;
                Some(CodeSnippet {
                    code: parsed.snippet(span.start_line, span.end_line),
                    file_path,
                    revision: snapshot_rev,
                    kind: SnippetKind::Declaration(span.kind),
                    name: span.name,
                    start_line: span.start_line,
                    end_line: span.end_line,
                })
            })
            .await?;

        match &snippet {
            Some(found) => debug!("located {}", found.describe()),
            None => debug!("no declaration in {} at {}", path, revision),
        }
        Ok(snippet)
    }

    async fn with_parsed<T, F>(&self, path: &str, revision: &str, query: F) -> LookupResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&ParsedSource) -> Option<T> + Send + 'static,
    {
        let Some(text) = self.snapshots.read_text(revision, path).await? else {
            return Ok(None);
        };

        let owned_path = path.to_string();
        let outcome = tokio::task::spawn_blocking(move || {
            let parsed = CSourceParser::new()?.parse(&owned_path, text)?;
            Ok::<_, LookupError>(query(&parsed))
        })
        .await
        .map_err(|e| LookupError::ParseFailure {
            path: path.to_string(),
            reason: e.to_string(),
        })
        .and_then(|result| result);

        match outcome {
            Err(e) if e.is_absent() => {
                debug!("treating {} as absent: {}", path, e);
                Ok(None)
            }
            other => other,
        }
    }
}

/// Reduce a method signature to its bare identifier
///
/// Strips one leading qualifier or return type keyword, cuts the parameter
/// list, keeps the last word and drops pointer stars.
pub fn simplify_method_name(signature: &str) -> String {
    let stripped = LEADING_QUALIFIER.replace(signature.trim(), "");
    let head = stripped.split('(').next().unwrap_or_default().trim();
    head.split_whitespace()
        .last()
        .unwrap_or(head)
        .replace('*', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DeclarationKind;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct Fixture(HashMap<(String, String), String>);

    impl Fixture {
        fn single(revision: &str, path: &str, text: &str) -> Arc<dyn SnapshotSource> {
            Arc::new(Fixture(HashMap::from([(
                (revision.to_string(), path.to_string()),
                text.to_string(),
            )])))
        }
    }

    #[async_trait]
    impl SnapshotSource for Fixture {
        async fn read(&self, revision: &str, path: &str) -> LookupResult<Vec<u8>> {
            Ok(self
                .0
                .get(&(revision.to_string(), path.to_string()))
                .map(|s| s.as_bytes().to_vec()))
        }
    }

    const CORE_C: &str = "/* run queue */\nstruct rq {\n\tint nr_running;\n};\n\nstatic inline int rq_len(struct rq *rq)\n{\n\treturn rq->nr_running;\n}\n";

    #[test]
    fn test_simplify_method_name() {
        assert_eq!(simplify_method_name("static int foo(int a)"), "foo");
        assert_eq!(simplify_method_name("static inline int rq_len(struct rq *rq)"), "rq_len");
        assert_eq!(simplify_method_name("struct task_struct *pick_task(void)"), "pick_task");
        assert_eq!(simplify_method_name("sched_entity"), "sched_entity");
        assert_eq!(simplify_method_name("  "), "");
    }

    #[tokio::test]
    async fn test_locate_by_line_uses_tag_revision() {
        let locator = DeclarationLocator::new(Fixture::single("v6.14", "kernel/sched/core.c", CORE_C));

        let snippet = locator
            .locate_by_line("kernel/sched/core.c", 8, "6.14")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snippet.kind, SnippetKind::Declaration(DeclarationKind::Function));
        assert_eq!(snippet.name.as_deref(), Some("rq_len"));
        assert_eq!(snippet.revision, "v6.14");
        assert_eq!((snippet.start_line, snippet.end_line), (6, 9));
        assert!(snippet.code.starts_with("static inline int rq_len"));
        assert!(snippet.code.ends_with('}'));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let locator = DeclarationLocator::new(Fixture::single("v6.14", "a.c", CORE_C));
        let result = locator.locate_by_line("b.c", 1, "v6.14").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_resolve_method_cascade() {
        let locator = DeclarationLocator::new(Fixture::single("v6.14", "core.c", CORE_C));

        let by_signature = locator
            .resolve_method("core.c", "static inline int rq_len(struct rq *rq)", "v6.14")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_signature.name.as_deref(), Some("rq_len"));

        let by_tag = locator
            .resolve_method("core.c", "struct rq", "v6.14")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_tag.kind, SnippetKind::Declaration(DeclarationKind::Struct));
        assert_eq!((by_tag.start_line, by_tag.end_line), (2, 4));

        assert!(locator
            .resolve_method("core.c", "enqueue_task", "v6.14")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_locate_comment() {
        let locator = DeclarationLocator::new(Fixture::single("v6.14", "core.c", CORE_C));
        let snippet = locator
            .locate_comment_by_line("core.c", 1, "v6.14")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snippet.kind, SnippetKind::Documentation);
        assert_eq!(snippet.code, "/* run queue */");
    }
}
