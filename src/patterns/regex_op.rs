#![forbid(unsafe_code)]

//! `RegexWithIndex` — regex search over a joined pattern set, with a
//! process-wide compiled-regex cache keyed by the joined source text
//! (§4.4.2).
//!
//! A [`Clause::RegexWithIndexClause`](crate::compiler::Clause) can
//! carry more than one alternative pattern (`data: Vec<String>`); they
//! are joined into a single `(?:a)|(?:b)|...` regex so one scan over
//! the content finds every alternative's matches in source order.

use crate::text_container::Boundary;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum RegexOpError {
    #[error("invalid regex {pattern:?}: {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: Arc<regex::Error>,
    },
}

/// The joined source text plus its modifier flags is the cache key: two
/// clauses with the same alternative set and options share one compiled
/// [`Regex`], which is the common case across rules that repeat a
/// pattern with different scopes.
static CACHE: Lazy<DashMap<String, Result<Arc<Regex>, RegexOpError>>> = Lazy::new(DashMap::new);

/// Thin wrapper so callers can name the cache as a type without
/// reaching for the bare `static`.
pub struct RegexCache;

impl RegexCache {
    /// Compiles (or fetches) the regex for the given joined alternative
    /// set, honoring `i` (case-insensitive) and `m` (multiline)
    /// modifiers via an inline flag group. Failed compiles are cached
    /// too, so a bad pattern is only ever attempted once per process.
    pub fn get_or_compile(alternatives: &[String], modifiers: &[String]) -> Result<Arc<Regex>, RegexOpError> {
        let source = with_flags(&join(alternatives), modifiers);

        if let Some(entry) = CACHE.get(&source) {
            return entry.value().clone();
        }

        let compiled = Regex::new(&source).map(Arc::new).map_err(|source_err| RegexOpError::Invalid {
            pattern: source.clone(),
            source: Arc::new(source_err),
        });
        CACHE.insert(source, compiled.clone());
        compiled
    }
}

fn join(alternatives: &[String]) -> String {
    if alternatives.len() == 1 {
        alternatives[0].clone()
    } else {
        alternatives
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|")
    }
}

/// Prepends an inline flag group (e.g. `(?im)`) for any recognized
/// modifier (`i`, `m`); unrecognized modifiers are ignored.
fn with_flags(pattern: &str, modifiers: &[String]) -> String {
    let mut flags = String::new();
    if modifiers.iter().any(|m| m == "i") {
        flags.push('i');
    }
    if modifiers.iter().any(|m| m == "m") {
        flags.push('m');
    }
    if flags.is_empty() {
        pattern.to_string()
    } else {
        format!("(?{flags}){pattern}")
    }
}

/// Finds every match of the joined regex, optionally restricted to the
/// given regions (JSONPath/XPath projection).
pub fn find_regex(
    content: &str,
    alternatives: &[String],
    modifiers: &[String],
    regions: Option<&[Boundary]>,
) -> Result<Vec<Boundary>, RegexOpError> {
    let regex = RegexCache::get_or_compile(alternatives, modifiers)?;

    let mut out = Vec::new();
    match regions {
        None => collect_matches(&regex, content, 0, &mut out),
        Some(regions) => {
            for region in regions {
                let end = region.end().min(content.len());
                let start = region.index.min(end);
                if start < end {
                    collect_matches(&regex, &content[start..end], start, &mut out);
                }
            }
        }
    }
    Ok(out)
}

fn collect_matches(regex: &Regex, haystack: &str, offset: usize, out: &mut Vec<Boundary>) {
    for m in regex.find_iter(haystack) {
        out.push(Boundary::new(offset + m.start(), m.len()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_pattern_matches() {
        let matches = find_regex("abc123 xyz456", &[r"\d+".to_string()], &[], None).unwrap();
        assert_eq!(matches, vec![Boundary::new(3, 3), Boundary::new(10, 3)]);
    }

    #[test]
    fn multiple_alternatives_join_with_or() {
        let matches = find_regex("foo bar", &["foo".to_string(), "bar".to_string()], &[], None).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn invalid_regex_is_cached_as_error() {
        let bad = vec!["(".to_string()];
        assert!(find_regex("x", &bad, &[], None).is_err());
        assert!(find_regex("x", &bad, &[], None).is_err());
    }

    #[test]
    fn regions_restrict_matches() {
        let content = "123 abc 456";
        let regions = vec![Boundary::new(8, 3)];
        let matches = find_regex(content, &[r"\d+".to_string()], &[], Some(&regions)).unwrap();
        assert_eq!(matches, vec![Boundary::new(8, 3)]);
    }

    #[test]
    fn case_insensitive_modifier_matches_mixed_case() {
        let matches = find_regex("FOO foo", &["foo".to_string()], &["i".to_string()], None).unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn without_modifier_case_differs() {
        let matches = find_regex("FOO foo", &["foo".to_string()], &[], None).unwrap();
        assert_eq!(matches.len(), 1);
    }
}
