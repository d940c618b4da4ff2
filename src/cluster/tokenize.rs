//! Identifier extraction and tokenization

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[a-zA-Z_][a-zA-Z0-9_]*\b").unwrap());

/// C89/C99 keywords never treated as identifiers
const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "int", "long", "register", "return", "short",
    "signed", "sizeof", "static", "struct", "switch", "typedef", "union", "unsigned", "void",
    "volatile", "while",
];

const ENGLISH_STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "its", "may", "new", "now", "old",
    "see", "two", "who", "boy", "did", "use", "way", "she", "many", "some", "time",
];

const C_STOP_WORDS: &[&str] = &[
    "void", "int", "char", "long", "short", "unsigned", "signed", "const", "static", "extern",
    "auto", "register", "volatile", "inline", "return", "break", "continue", "goto", "case",
    "default", "switch", "while", "for", "do", "if", "else", "sizeof", "typedef", "struct",
    "union", "enum",
];

const KERNEL_STOP_WORDS: &[&str] = &[
    "kernel", "linux", "include", "define", "ifdef", "ifndef", "endif", "undef", "line", "file",
];

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ENGLISH_STOP_WORDS
        .iter()
        .chain(C_STOP_WORDS)
        .chain(KERNEL_STOP_WORDS)
        .copied()
        .collect()
});

/// Minimum length of a token that can become a concept
const MIN_CONCEPT_TOKEN_LEN: usize = 3;

/// Split an identifier into lower-case semantic tokens
///
/// Splits on `_` first, then on lower-to-upper case boundaries. Tokens of a
/// single character are dropped and duplicates removed.
pub fn tokenize(identifier: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for part in identifier.split('_') {
        for word in split_camel_case(part) {
            let token = word.to_lowercase();
            if token.chars().count() > 1 && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
    }

    tokens
}

fn split_camel_case(part: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut start = 0;
    let mut prev_lower = false;

    for (index, c) in part.char_indices() {
        if prev_lower && c.is_ascii_uppercase() {
            words.push(&part[start..index]);
            start = index;
        }
        prev_lower = c.is_ascii_lowercase();
    }
    words.push(&part[start..]);

    words.into_iter().filter(|w| !w.is_empty()).collect()
}

/// Identifiers of a source line, without C keywords or single characters
pub fn extract_identifiers(line: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    IDENTIFIER
        .find_iter(line)
        .map(|m| m.as_str())
        .filter(|ident| ident.len() > 1)
        .filter(|ident| !C_KEYWORDS.contains(&ident.to_lowercase().as_str()))
        .filter(|ident| seen.insert(*ident))
        .map(str::to_string)
        .collect()
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(token)
}

/// Whether a token is long enough and specific enough to name a concept
pub fn is_concept_token(token: &str) -> bool {
    token.len() >= MIN_CONCEPT_TOKEN_LEN && !is_stop_word(token)
}

/// Tokens of an identifier list that may count towards a concept
///
/// Repeated tokens across identifiers are kept so that frequencies reflect
/// every occurrence.
pub fn concept_tokens(identifiers: &[String]) -> Vec<String> {
    identifiers
        .iter()
        .flat_map(|ident| tokenize(ident))
        .filter(|token| is_concept_token(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_snake_case() {
        assert_eq!(tokenize("sched_entity"), vec!["sched", "entity"]);
    }

    #[test]
    fn test_tokenize_camel_case() {
        assert_eq!(tokenize("fairSchedClass"), vec!["fair", "sched", "class"]);
    }

    #[test]
    fn test_tokenize_drops_short_and_duplicate_tokens() {
        assert!(tokenize("a").is_empty());
        assert_eq!(tokenize("__rq_lock_rq"), vec!["rq", "lock"]);
        assert_eq!(tokenize("x_y_zz"), vec!["zz"]);
        assert_eq!(tokenize("HTTPServer"), vec!["httpserver"]);
        assert_eq!(tokenize("cpu_rqMask"), vec!["cpu", "rq", "mask"]);
    }

    #[test]
    fn test_extract_identifiers() {
        assert_eq!(
            extract_identifiers("static struct sched_entity *se = &p->se;"),
            vec!["sched_entity", "se"]
        );
        assert_eq!(
            extract_identifiers("if (x > 0x1f) return READ_ONCE(rq->clock);"),
            vec!["READ_ONCE", "rq", "clock"]
        );
        assert!(extract_identifiers("  } else {").is_empty());
    }

    #[test]
    fn test_stop_words() {
        assert!(is_stop_word("kernel"));
        assert!(is_stop_word("struct"));
        assert!(is_stop_word("the"));
        assert!(!is_stop_word("sched"));
    }

    #[test]
    fn test_concept_tokens_filters() {
        let identifiers = vec![
            "sched_entity".to_string(),
            "se".to_string(),
            "linux_sched_init".to_string(),
        ];
        assert_eq!(
            concept_tokens(&identifiers),
            vec!["sched", "entity", "sched", "init"]
        );
    }
}
