#![forbid(unsafe_code)]

//! Rule Processor — orchestrates rule selection, clause evaluation,
//! confidence filtering, tag de-duplication and excerpt extraction for
//! one file (§4.6).

use crate::catalog::RuleCatalog;
use crate::evaluator::evaluate;
use crate::language::{FileType, LanguageInfo};
use crate::model::MatchRecord;
use crate::text_container::{Boundary, TextContainer};
use crate::types::{ConfidenceFilter, Tag};
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation, checked between rules and between files
/// (§5). Cloning shares the same underlying flag.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// How a file's analysis concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Completed,
    TimedOut,
    Canceled,
}

/// Tunables for [`analyze_file`] (§4.6 options table).
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub confidence_filter: ConfidenceFilter,
    pub allow_all_tags_in_build_files: bool,
    pub unique_tag_exceptions: Vec<String>,
    /// Lines of excerpt on either side of the match; `-1` disables
    /// excerpt extraction entirely.
    pub context_lines: i32,
    pub treat_everything_as_code: bool,
    pub parallel: bool,
    pub file_timeout_ms: Option<u64>,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        Self {
            confidence_filter: ConfidenceFilter::default(),
            allow_all_tags_in_build_files: false,
            unique_tag_exceptions: Vec::new(),
            context_lines: 3,
            treat_everything_as_code: false,
            parallel: true,
            file_timeout_ms: None,
        }
    }
}

pub struct FileAnalysis {
    pub matches: Vec<MatchRecord>,
    pub status: FileStatus,
}

const SAMPLE_MAX_LEN: usize = 200;

/// Runs every applicable rule from `catalog` against `content`, honoring
/// `options`, and returns the resulting [`MatchRecord`]s plus how the
/// analysis concluded.
///
/// `seen_tags`, when provided, implements tags-only de-duplication: a
/// rule whose every tag has already been witnessed in this run is
/// dropped before its findings are emitted (§4.6 step 3).
pub fn analyze_file(
    content: &str,
    file_path: &Path,
    language_info: &LanguageInfo,
    catalog: &RuleCatalog,
    options: &ProcessorOptions,
    seen_tags: Option<&mut HashSet<Tag>>,
    cancellation: &CancellationToken,
) -> FileAnalysis {
    let container = TextContainer::new(content, language_info);
    let language_name = language_info.name.as_str();
    let rules = catalog.rules_for(language_name, file_path);

    let deadline = options
        .file_timeout_ms
        .map(|ms| (Instant::now(), std::time::Duration::from_millis(ms)));

    let mut seen_tags = seen_tags;
    let mut out: Vec<MatchRecord> = Vec::new();

    for entry in rules {
        if cancellation.is_cancelled() {
            return FileAnalysis { matches: out, status: FileStatus::Canceled };
        }
        if let Some((start, budget)) = deadline {
            if start.elapsed() > budget {
                return FileAnalysis { matches: out, status: FileStatus::TimedOut };
            }
        }

        if should_skip_for_tags(
            &entry.rule,
            language_info.file_type,
            options,
            seen_tags.as_deref(),
        ) {
            continue;
        }

        let findings = evaluate(&entry.compiled, &entry.rule, &container, options.treat_everything_as_code);
        let findings = resolve_overlaps(findings);

        let mut rule_matches = Vec::new();
        for finding in findings {
            let Some(pattern) = entry.rule.patterns.get(finding.pattern_index) else {
                continue;
            };
            if !options.confidence_filter.contains(pattern.confidence) {
                continue;
            }

            let start = container.get_location(finding.boundary.index);
            let end = container.get_location(finding.boundary.end());
            let sample = sample_text(&container, finding.boundary);
            let excerpt = extract_excerpt(&container, start.line, options.context_lines);

            rule_matches.push(MatchRecord {
                file: file_path.to_path_buf(),
                language: language_name.to_string(),
                boundary_index: finding.boundary.index,
                boundary_length: finding.boundary.length,
                start: start.into(),
                end: end.into(),
                rule_id: entry.rule.id.as_str().to_string(),
                rule_name: entry.rule.name.clone(),
                rule_description: entry.rule.description.clone(),
                matched_pattern: pattern.pattern.clone(),
                pattern_type: format!("{:?}", pattern.pattern_type).to_ascii_lowercase(),
                confidence: format!("{:?}", pattern.confidence).to_ascii_lowercase(),
                severity: entry.rule.severity.to_string(),
                tags: entry.rule.tags.iter().map(|t| t.as_str().to_string()).collect(),
                sample,
                excerpt,
            });
        }

        if !rule_matches.is_empty() {
            if let Some(seen) = seen_tags.as_deref_mut() {
                seen.extend(entry.rule.tags.iter().cloned());
            }
            out.extend(rule_matches);
        }
    }

    FileAnalysis { matches: out, status: FileStatus::Completed }
}

/// Tags-only de-dup: when a tag filter is active, a rule whose every
/// tag was already witnessed is dropped unless the tag matches one of
/// `unique_tag_exceptions` (exempt from uniqueness suppression) or the
/// file is a build file and `allow_all_tags_in_build_files` is set.
fn should_skip_for_tags(
    rule: &crate::model::Rule,
    file_type: FileType,
    options: &ProcessorOptions,
    seen_tags: Option<&HashSet<Tag>>,
) -> bool {
    let Some(seen) = seen_tags else { return false };
    if options.allow_all_tags_in_build_files && file_type == FileType::Build {
        return false;
    }
    if rule.tags.is_empty() {
        return false;
    }
    rule.tags.iter().all(|tag| {
        let exempt = options
            .unique_tag_exceptions
            .iter()
            .any(|pattern| tag.as_str().starts_with(pattern.as_str()));
        !exempt && seen.contains(tag)
    })
}

/// Best-match overlap resolution within one rule's findings: when two
/// boundaries overlap, keep the longer one, breaking ties by the
/// smaller start index (§4.6 step 4). Result is sorted by
/// `(boundary.index, boundary.length)` per the ordering guarantee in
/// §5.
fn resolve_overlaps(mut findings: Vec<crate::evaluator::Finding>) -> Vec<crate::evaluator::Finding> {
    findings.sort_by_key(|f| (f.boundary.index, std::cmp::Reverse(f.boundary.length)));

    let mut kept: Vec<crate::evaluator::Finding> = Vec::new();
    for finding in findings {
        if kept.iter().any(|k: &crate::evaluator::Finding| k.boundary.overlaps(&finding.boundary)) {
            continue;
        }
        kept.push(finding);
    }
    kept.sort_by_key(|f| (f.boundary.index, f.boundary.length));
    kept
}

fn sample_text(container: &TextContainer, boundary: Boundary) -> String {
    let capped = Boundary::new(boundary.index, boundary.length.min(SAMPLE_MAX_LEN));
    container.get_boundary_text(capped).to_string()
}

/// `context_lines` lines of content centered on `center_line`, with
/// common leading whitespace trimmed across the window. `-1` disables
/// excerpt extraction.
fn extract_excerpt(container: &TextContainer, center_line: u32, context_lines: i32) -> Option<String> {
    if context_lines < 0 {
        return None;
    }
    let context_lines = context_lines as u32;
    let first = center_line.saturating_sub(context_lines).max(1);
    let last = (center_line + context_lines).min(container.line_count() as u32);

    let lines: Vec<&str> = (first..=last)
        .map(|line| container.get_line_content(line as usize))
        .collect();

    let common_indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let trimmed: Vec<&str> = lines
        .iter()
        .map(|l| if l.len() >= common_indent { &l[common_indent..] } else { *l })
        .collect();

    Some(trimmed.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_rules;
    use crate::language::from_file_name;
    use std::io::Write;
    use std::path::Path;
    use tempfile::tempdir;

    fn write_rule(dir: &Path, name: &str, json: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(json.as_bytes()).unwrap();
    }

    #[test]
    fn analyze_file_emits_a_match_for_a_simple_substring_rule() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "r.json",
            r#"{
                "id": "t1", "description": "d", "severity": "moderate",
                "tags": ["a.b"],
                "patterns": [{"pattern": "danger", "type": "substring", "confidence": "high"}]
            }"#,
        );
        let (catalog, _) = load_rules(dir.path()).unwrap();
        let (_, language) = from_file_name(Path::new("x.rs"));
        let options = ProcessorOptions::default();
        let token = CancellationToken::new();

        let result = analyze_file(
            "let x = danger();",
            Path::new("x.rs"),
            &language,
            &catalog,
            &options,
            None,
            &token,
        );
        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.status, FileStatus::Completed);
    }

    #[test]
    fn confidence_filter_drops_low_confidence_findings() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "r.json",
            r#"{
                "id": "t2", "description": "d", "severity": "moderate",
                "patterns": [{"pattern": "danger", "type": "substring", "confidence": "low"}]
            }"#,
        );
        let (catalog, _) = load_rules(dir.path()).unwrap();
        let (_, language) = from_file_name(Path::new("x.rs"));
        let options = ProcessorOptions::default();
        let token = CancellationToken::new();

        let result = analyze_file("danger", Path::new("x.rs"), &language, &catalog, &options, None, &token);
        assert!(result.matches.is_empty());
    }

    #[test]
    fn tag_dedup_drops_second_rule_sharing_every_tag() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "r1.json",
            r#"{
                "id": "t3", "description": "d", "severity": "moderate", "tags": ["shared"],
                "patterns": [{"pattern": "foo", "type": "substring", "confidence": "high"}]
            }"#,
        );
        write_rule(
            dir.path(),
            "r2.json",
            r#"{
                "id": "t4", "description": "d", "severity": "moderate", "tags": ["shared"],
                "patterns": [{"pattern": "bar", "type": "substring", "confidence": "high"}]
            }"#,
        );
        let (catalog, _) = load_rules(dir.path()).unwrap();
        let (_, language) = from_file_name(Path::new("x.rs"));
        let options = ProcessorOptions::default();
        let token = CancellationToken::new();
        let mut seen = HashSet::new();

        let result = analyze_file(
            "foo bar",
            Path::new("x.rs"),
            &language,
            &catalog,
            &options,
            Some(&mut seen),
            &token,
        );
        assert_eq!(result.matches.len(), 1);
    }

    #[test]
    fn cancellation_token_stops_analysis_early() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "r.json",
            r#"{
                "id": "t5", "description": "d", "severity": "moderate",
                "patterns": [{"pattern": "danger", "type": "substring", "confidence": "high"}]
            }"#,
        );
        let (catalog, _) = load_rules(dir.path()).unwrap();
        let (_, language) = from_file_name(Path::new("x.rs"));
        let options = ProcessorOptions::default();
        let token = CancellationToken::new();
        token.cancel();

        let result = analyze_file("danger", Path::new("x.rs"), &language, &catalog, &options, None, &token);
        assert_eq!(result.status, FileStatus::Canceled);
        assert!(result.matches.is_empty());
    }
}
