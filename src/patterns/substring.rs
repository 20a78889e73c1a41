#![forbid(unsafe_code)]

//! `SubstringIndex` — plain or word-boundary-aware substring search
//! (§4.4.1).

use crate::text_container::Boundary;

/// True when `content[offset]` is not a word character (`[A-Za-z0-9_]`),
/// or `offset` is out of range.
fn is_word_boundary_at(content: &str, offset: isize) -> bool {
    if offset < 0 || offset as usize >= content.len() {
        return true;
    }
    match content.as_bytes().get(offset as usize) {
        Some(&b) => !(b.is_ascii_alphanumeric() || b == b'_'),
        None => true,
    }
}

/// Finds every occurrence of `needle` in `content`, optionally
/// restricted to the given regions (a JSONPath/XPath projection),
/// optionally requiring non-word-character neighbors on both sides, and
/// optionally case-insensitive (the `i` modifier — `m` has no effect on
/// a literal substring search).
///
/// Mirrors `str::match_indices` but re-scans per region when regions
/// are supplied, since an occurrence spanning a region boundary must
/// be rejected.
pub fn find_substring(
    content: &str,
    needle: &str,
    use_word_boundaries: bool,
    case_insensitive: bool,
    regions: Option<&[Boundary]>,
) -> Vec<Boundary> {
    if needle.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    match regions {
        None => collect_in_range(content, needle, use_word_boundaries, case_insensitive, 0, content.len(), &mut out),
        Some(regions) => {
            for region in regions {
                let end = region.end().min(content.len());
                let start = region.index.min(end);
                collect_in_range(content, needle, use_word_boundaries, case_insensitive, start, end, &mut out);
            }
        }
    }
    out
}

fn collect_in_range(
    content: &str,
    needle: &str,
    use_word_boundaries: bool,
    case_insensitive: bool,
    start: usize,
    end: usize,
    out: &mut Vec<Boundary>,
) {
    if start >= end || end > content.len() {
        return;
    }
    let haystack = &content[start..end];

    let positions: Vec<usize> = if case_insensitive {
        let haystack_lower = haystack.to_ascii_lowercase();
        let needle_lower = needle.to_ascii_lowercase();
        haystack_lower.match_indices(&needle_lower).map(|(rel, _)| rel).collect()
    } else {
        haystack.match_indices(needle).map(|(rel, _)| rel).collect()
    };

    for rel in positions {
        let idx = start + rel;
        if use_word_boundaries {
            let before_ok = is_word_boundary_at(content, idx as isize - 1);
            let after_ok = is_word_boundary_at(content, (idx + needle.len()) as isize);
            if !before_ok || !after_ok {
                continue;
            }
        }
        out.push(Boundary::new(idx, needle.len()));
    }
}
