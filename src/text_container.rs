#![forbid(unsafe_code)]

//! Text Container — a language-aware indexed view of a source file.
//!
//! Builds a line index once at construction and lazily memoizes
//! comment-vs-code classification per offset (§4.2).

use crate::language::LanguageInfo;
use crate::types::{Scope, ScopeSet};
use dashmap::DashMap;

/// A half-open region of a file: `[index, index + length)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Boundary {
    pub index: usize,
    pub length: usize,
}

impl Boundary {
    pub fn new(index: usize, length: usize) -> Self {
        Self { index, length }
    }

    pub fn end(&self) -> usize {
        self.index + self.length
    }

    /// True when the two boundaries share at least one offset.
    pub fn overlaps(&self, other: &Boundary) -> bool {
        self.index < other.end() && other.index < self.end()
    }
}

/// A 1-indexed `(line, column)` position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

/// Comment delimiters extracted from a [`LanguageInfo`], owned so a
/// `TextContainer` does not need to outlive the registry lookup.
struct CommentSyntax {
    block_prefix: Option<String>,
    block_suffix: Option<String>,
    inline: Option<String>,
}

/// A language-aware indexed view of one file's content.
///
/// Immutable after construction except for the memoized
/// `commented_states` map, which is populated lazily and is safe to
/// read/write from multiple threads because every writer computes the
/// same value for a given offset (§4.2 concurrency note).
pub struct TextContainer {
    content: String,
    /// 1-indexed; slot 0 is a sentinel `0`.
    line_ends: Vec<u32>,
    /// 1-indexed; slot 0 is a sentinel `0`.
    line_starts: Vec<u32>,
    comment_syntax: CommentSyntax,
    commented_states: DashMap<usize, bool>,
}

impl TextContainer {
    pub fn new(content: impl Into<String>, language: &LanguageInfo) -> Self {
        let content = content.into();
        let (line_starts, line_ends) = build_line_index(&content);

        Self {
            content,
            line_ends,
            line_starts,
            comment_syntax: CommentSyntax {
                block_prefix: language.comment_prefix.map(str::to_owned),
                block_suffix: language.comment_suffix.map(str::to_owned),
                inline: language.inline_comment.map(str::to_owned),
            },
            commented_states: DashMap::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    fn has_comment_syntax(&self) -> bool {
        self.comment_syntax.block_prefix.is_some() || self.comment_syntax.inline.is_some()
    }

    /// Smallest `i` with `line_ends[i] >= index`, clamped to the last
    /// populated line if `index` runs past the end of content.
    fn line_index_for(&self, index: usize) -> usize {
        let index = index as u32;
        let found = self.line_ends[1..]
            .iter()
            .position(|&end| end >= index)
            .map(|pos| pos + 1);
        found.unwrap_or(self.line_ends.len() - 1)
    }

    pub fn get_line_boundary(&self, index: usize) -> Boundary {
        let i = self.line_index_for(index);
        let start = self.line_starts[i] as usize;
        let end = self.line_ends[i] as usize;
        Boundary::new(start, end.saturating_sub(start) + 1)
    }

    /// Content of the given 1-indexed line, clamped to the last line.
    pub fn get_line_content(&self, line: usize) -> &str {
        let line = line.clamp(1, self.line_starts.len() - 1);
        let start = self.line_starts[line] as usize;
        let end = (self.line_ends[line] as usize + 1).min(self.content.len());
        &self.content[start.min(end)..end]
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len() - 1
    }

    pub fn get_location(&self, index: usize) -> Location {
        let i = self.line_index_for(index);
        let start = self.line_starts[i] as usize;
        let line = i as u32;
        let column = (index.saturating_sub(start) + 1) as u32;
        Location { line, column }
    }

    pub fn get_boundary_text(&self, boundary: Boundary) -> &str {
        let end = boundary.end().min(self.content.len());
        let start = boundary.index.min(end);
        &self.content[start..end]
    }

    /// Runs the commented-state algorithm (§4.2) for `query`, memoizing
    /// the result.
    pub fn is_commented(&self, query: usize) -> bool {
        if self.content.is_empty() {
            return false;
        }
        let clamped = query.min(self.content.len() - 1);

        if let Some(v) = self.commented_states.get(&clamped) {
            if clamped == query {
                return *v;
            }
        }

        self.compute_commented_state(clamped);

        let result = *self
            .commented_states
            .get(&clamped)
            .expect("computed above");
        if clamped != query {
            self.commented_states.insert(query, result);
        }
        result
    }

    fn compute_commented_state(&self, q: usize) {
        if self.commented_states.contains_key(&q) {
            return;
        }

        let block_region = if let (Some(prefix), Some(suffix)) = (
            &self.comment_syntax.block_prefix,
            &self.comment_syntax.block_suffix,
        ) {
            self.rfind_from(prefix, q).map(|p| {
                let s = self
                    .find_from(suffix, p)
                    .map(|s| s + suffix.len() - 1)
                    .unwrap_or(self.content.len() - 1);
                (p, s)
            })
        } else {
            None
        };

        let inline_region = if let Some(inline) = &self.comment_syntax.inline {
            self.rfind_from(inline, q).map(|p| {
                let n = self.content[p..]
                    .find('\n')
                    .map(|rel| p + rel)
                    .unwrap_or(self.content.len() - 1);
                (p, n)
            })
        } else {
            None
        };

        // Block and inline candidates are independent searches; take
        // whichever region actually covers `q` (the one starting
        // closest to `q` if both do).
        let covering = [block_region, inline_region]
            .into_iter()
            .flatten()
            .filter(|&(p, s)| p <= q && q <= s)
            .max_by_key(|&(p, _)| p);

        if let Some((p, s)) = covering {
            if !self.commented_states.contains_key(&p) {
                for offset in p..=s.min(self.content.len() - 1) {
                    self.commented_states.insert(offset, true);
                }
            }
        }

        // Back-fill: walk backward from q, marking unvisited offsets
        // false, stopping at the first offset already resolved.
        let mut cursor = q as isize;
        let mut to_mark = Vec::new();
        while cursor >= 0 {
            let off = cursor as usize;
            if self.commented_states.contains_key(&off) {
                break;
            }
            to_mark.push(off);
            cursor -= 1;
        }
        for off in to_mark {
            self.commented_states.insert(off, false);
        }
    }

    /// Greatest `p <= q` such that `content[p..]` starts with `needle`.
    fn rfind_from(&self, needle: &str, q: usize) -> Option<usize> {
        let upper = (q + 1).min(self.content.len());
        self.content[..upper].rfind(needle)
    }

    /// Least `s >= from` such that `content[s..]` starts with `needle`.
    fn find_from(&self, needle: &str, from: usize) -> Option<usize> {
        self.content[from..].find(needle).map(|rel| from + rel)
    }

    /// `scope_match` (§4.2): accept unconditionally for `All` scope or
    /// languages without comment syntax; otherwise consult
    /// `is_commented`.
    pub fn scope_match(&self, scopes: ScopeSet, boundary: Boundary) -> bool {
        if scopes.contains(Scope::All) || !self.has_comment_syntax() {
            return true;
        }
        let in_comment = self.is_commented(boundary.index);
        (in_comment && scopes.contains(Scope::Comment)) || (!in_comment && scopes.contains(Scope::Code))
    }
}

/// Builds the 1-indexed `line_starts`/`line_ends` parallel arrays
/// (§4.2 construction algorithm).
fn build_line_index(content: &str) -> (Vec<u32>, Vec<u32>) {
    let mut line_starts = vec![0u32];
    let mut line_ends = vec![0u32];

    if content.is_empty() {
        line_starts.push(0);
        line_ends.push(0);
        return (line_starts, line_ends);
    }

    line_starts.push(0);
    let bytes = content.as_bytes();
    let length = bytes.len();

    for (p, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            line_ends.push(p as u32);
            if p + 1 < length {
                line_starts.push((p + 1) as u32);
            }
        }
    }

    if line_ends.len() <= line_starts.len() {
        line_ends.push((length - 1) as u32);
    }

    (line_starts, line_ends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::from_file_name;
    use std::path::Path;

    fn rust_info() -> LanguageInfo {
        from_file_name(Path::new("test.rs")).1
    }

    fn python_info() -> LanguageInfo {
        from_file_name(Path::new("test.py")).1
    }

    #[test]
    fn empty_content_has_single_zero_line() {
        let tc = TextContainer::new("", &rust_info());
        assert_eq!(tc.line_count(), 1);
        assert_eq!(tc.get_location(0), Location { line: 1, column: 1 });
    }

    #[test]
    fn content_without_trailing_newline_gets_final_line_end() {
        let tc = TextContainer::new("abc", &rust_info());
        assert_eq!(tc.line_count(), 1);
        let boundary = tc.get_line_boundary(0);
        assert_eq!(boundary, Boundary::new(0, 3));
    }

    #[test]
    fn multiline_location_tracks_line_and_column() {
        let tc = TextContainer::new("ab\ncd\nef", &rust_info());
        assert_eq!(tc.get_location(0), Location { line: 1, column: 1 });
        assert_eq!(tc.get_location(3), Location { line: 2, column: 1 });
        assert_eq!(tc.get_location(7), Location { line: 3, column: 2 });
    }

    #[test]
    fn boundary_text_is_clamped() {
        let tc = TextContainer::new("hello", &rust_info());
        let text = tc.get_boundary_text(Boundary::new(3, 100));
        assert_eq!(text, "lo");
    }

    #[test]
    fn block_comment_is_detected() {
        let tc = TextContainer::new("/* https://contoso.com */", &rust_info());
        assert!(tc.is_commented(5));
        assert!(tc.is_commented(0));
        assert!(tc.is_commented(25));
    }

    #[test]
    fn code_before_block_comment_is_not_commented() {
        let tc = TextContainer::new("var x = 1; /* comment */", &rust_info());
        assert!(!tc.is_commented(0));
        assert!(tc.is_commented(15));
    }

    #[test]
    fn inline_comment_covers_rest_of_line() {
        let tc = TextContainer::new("var url = 1; // contoso.com\nvar y = 2;", &rust_info());
        assert!(!tc.is_commented(0));
        assert!(tc.is_commented(20));
        assert!(!tc.is_commented(30));
    }

    #[test]
    fn python_inline_comment_only() {
        let tc = TextContainer::new("x = 1  # note\ny = 2", &python_info());
        assert!(!tc.is_commented(0));
        assert!(tc.is_commented(9));
        assert!(!tc.is_commented(15));
    }

    #[test]
    fn scope_match_accepts_all_without_comment_check() {
        let tc = TextContainer::new("// comment\ncode", &rust_info());
        let scopes = ScopeSet::universal();
        assert!(tc.scope_match(scopes, Boundary::new(3, 1)));
    }

    #[test]
    fn scope_match_code_only_rejects_comment_text() {
        let tc = TextContainer::new("// comment\ncode", &rust_info());
        let mut scopes = ScopeSet::default();
        scopes.insert(Scope::Code);
        assert!(!tc.scope_match(scopes, Boundary::new(3, 1)));
        assert!(tc.scope_match(scopes, Boundary::new(11, 1)));
    }

    #[test]
    fn commented_state_is_deterministic_on_requery() {
        let tc = TextContainer::new("/* comment */ code", &rust_info());
        let first = tc.is_commented(5);
        let second = tc.is_commented(5);
        assert_eq!(first, second);
    }
}
