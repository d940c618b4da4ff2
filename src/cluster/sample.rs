//! Deduplication and bounded sampling
//!
//! Every line that survives sampling triggers a full snapshot read and parse,
//! so clusters are cut down before lookups are spawned.

use super::CodeLine;
use crate::extract::CodeSnippet;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Clusters at or below this size are kept whole
const SAMPLE_THRESHOLD: usize = 10;

/// Files with at most this many lines keep all of them
const SMALL_FILE_LINES: usize = 3;

/// Hard cap on sampled lines per cluster
const MAX_SAMPLED_LINES: usize = 15;

/// Lookups issued per file for one cluster
const MAX_LOOKUPS_PER_FILE: usize = 5;

/// Lines closer than this to the previous kept line share its declaration
const MIN_LOOKUP_GAP: usize = 5;

/// Drop repeated `path:line` entries; definition sites win, otherwise the first seen
pub fn dedup_lines(lines: Vec<CodeLine>) -> Vec<CodeLine> {
    let mut kept: Vec<CodeLine> = Vec::with_capacity(lines.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in lines {
        match index.get(&line.key()) {
            Some(&at) => {
                if line.is_definition() && !kept[at].is_definition() {
                    kept[at] = line;
                }
            }
            None => {
                index.insert(line.key(), kept.len());
                kept.push(line);
            }
        }
    }

    kept
}

/// Representative subset of a cluster, at most [`MAX_SAMPLED_LINES`] long
///
/// Small clusters are returned unchanged. Otherwise lines are grouped by file;
/// small files keep everything and larger files keep the first, middle and
/// last lines plus the quartiles.
pub fn sample_lines(lines: &[CodeLine]) -> Vec<CodeLine> {
    if lines.len() <= SAMPLE_THRESHOLD {
        return lines.to_vec();
    }

    let mut sampled = Vec::new();
    for mut group in group_by_file(lines) {
        if group.len() <= SMALL_FILE_LINES {
            sampled.extend(group.into_iter().cloned());
            continue;
        }

        group.sort_by_key(|line| line.line_number);
        sampled.extend(
            representative_positions(group.len())
                .into_iter()
                .map(|i| group[i].clone()),
        );
    }

    sampled.truncate(MAX_SAMPLED_LINES);
    debug!("sampled {} of {} lines", sampled.len(), lines.len());
    sampled
}

/// Sorted, distinct positions: first, middle, last, then the quartiles
fn representative_positions(size: usize) -> Vec<usize> {
    let mut positions = vec![0];
    if size >= 3 {
        positions.push(size / 2);
    }
    if size >= 2 {
        positions.push(size - 1);
    }
    if size >= 5 {
        positions.push(size / 4);
    }
    if size >= 6 {
        positions.push(size * 3 / 4);
    }

    positions.sort_unstable();
    positions.dedup();
    positions
}

/// Lines that actually get a declaration lookup
///
/// Per file, lines are taken in line order; a line within [`MIN_LOOKUP_GAP`]
/// of the previously kept one is skipped, and at most
/// [`MAX_LOOKUPS_PER_FILE`] are kept.
pub fn lookup_budget(lines: &[CodeLine]) -> Vec<CodeLine> {
    let mut budget = Vec::new();

    for mut group in group_by_file(lines) {
        group.sort_by_key(|line| line.line_number);

        let mut last_kept: Option<usize> = None;
        let mut taken = 0;
        for line in group {
            if taken == MAX_LOOKUPS_PER_FILE {
                break;
            }
            if last_kept.is_some_and(|last| line.line_number.abs_diff(last) < MIN_LOOKUP_GAP) {
                continue;
            }
            last_kept = Some(line.line_number);
            taken += 1;
            budget.push(line.clone());
        }
    }

    budget
}

/// Drop snippets covering an already seen range, ordered by path then start line
pub fn dedup_snippets(snippets: Vec<CodeSnippet>) -> Vec<CodeSnippet> {
    let mut seen = HashSet::new();
    let mut unique: Vec<CodeSnippet> = snippets
        .into_iter()
        .filter(|snippet| seen.insert(snippet.range_key()))
        .collect();

    unique.sort_by(|a, b| {
        a.file_path
            .cmp(&b.file_path)
            .then(a.start_line.cmp(&b.start_line))
    });
    unique
}

/// Lines grouped by file, files in order of first appearance
fn group_by_file(lines: &[CodeLine]) -> Vec<Vec<&CodeLine>> {
    let mut groups: Vec<Vec<&CodeLine>> = Vec::new();
    let mut by_path: HashMap<&str, usize> = HashMap::new();

    for line in lines {
        let at = *by_path.entry(line.file_path.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[at].push(line);
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::SourceKind;
    use crate::extract::{DeclarationKind, SnippetKind};
    use pretty_assertions::assert_eq;

    fn refs(path: &str, numbers: impl IntoIterator<Item = usize>) -> Vec<CodeLine> {
        numbers
            .into_iter()
            .map(|n| CodeLine::new(path, n, format!("use_{}(x);", n), SourceKind::References))
            .collect()
    }

    fn snippet(path: &str, start: usize, end: usize) -> CodeSnippet {
        CodeSnippet {
            file_path: path.to_string(),
            revision: "v6.14".to_string(),
            kind: SnippetKind::Declaration(DeclarationKind::Function),
            name: None,
            start_line: start,
            end_line: end,
            code: String::new(),
        }
    }

    #[test]
    fn test_dedup_prefers_definitions() {
        let lines = vec![
            CodeLine::new("fair.c", 10, "se->vruntime", SourceKind::References),
            CodeLine::new("core.c", 3, "rq_lock(rq)", SourceKind::References),
            CodeLine::new("fair.c", 10, "se->vruntime", SourceKind::Definitions),
        ];
        let deduped = dedup_lines(lines);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].key(), "fair.c:10");
        assert_eq!(deduped[0].source_kind, SourceKind::Definitions);
        assert_eq!(deduped[1].key(), "core.c:3");
    }

    #[test]
    fn test_dedup_keeps_first_of_same_kind_and_is_idempotent() {
        let lines = vec![
            CodeLine::new("a.c", 1, "first", SourceKind::References),
            CodeLine::new("a.c", 1, "second", SourceKind::References),
            CodeLine::new("a.c", 2, "other", SourceKind::Definitions),
        ];
        let once = dedup_lines(lines);
        assert_eq!(once[0].text, "first");

        let twice = dedup_lines(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_small_cluster_unchanged() {
        let lines = refs("a.c", 1..=10);
        assert_eq!(sample_lines(&lines), lines);
    }

    #[test]
    fn test_sampling_bounds() {
        let mut lines = refs("a.c", (1..=40).rev());
        lines.extend(refs("b.c", [7, 8]));
        lines.extend(refs("c.c", 1..=30));
        lines.extend(refs("d.c", 1..=30));
        lines.extend(refs("e.c", 1..=30));

        let sampled = sample_lines(&lines);
        assert_eq!(sampled.len(), MAX_SAMPLED_LINES);

        let from_a: Vec<usize> = sampled
            .iter()
            .filter(|l| l.file_path == "a.c")
            .map(|l| l.line_number)
            .collect();
        // 40 lines: positions 0, 10, 20, 30, 39
        assert_eq!(from_a, vec![1, 11, 21, 31, 40]);
        assert!(sampled.iter().filter(|l| l.file_path == "b.c").count() == 2);
    }

    #[test]
    fn test_representative_positions() {
        assert_eq!(representative_positions(1), vec![0]);
        assert_eq!(representative_positions(2), vec![0, 1]);
        assert_eq!(representative_positions(4), vec![0, 2, 3]);
        assert_eq!(representative_positions(5), vec![0, 1, 2, 4]);
        assert_eq!(representative_positions(8), vec![0, 2, 4, 6, 7]);
    }

    #[test]
    fn test_lookup_budget_skips_neighbours() {
        let lines = refs("a.c", [3, 1, 20, 22, 40, 60, 80, 100, 120]);
        let budget: Vec<usize> = lookup_budget(&lines).iter().map(|l| l.line_number).collect();
        assert_eq!(budget, vec![1, 20, 40, 60, 80]);
    }

    #[test]
    fn test_dedup_snippets_sorted() {
        let snippets = vec![
            snippet("fair.c", 40, 60),
            snippet("core.c", 5, 9),
            snippet("fair.c", 40, 60),
            snippet("fair.c", 2, 4),
        ];
        let ranges: Vec<String> = dedup_snippets(snippets).iter().map(CodeSnippet::range_key).collect();
        assert_eq!(ranges, vec!["core.c:5-9", "fair.c:2-4", "fair.c:40-60"]);
    }
}
