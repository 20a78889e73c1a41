#![forbid(unsafe_code)]

//! Clause Evaluator — walks a [`ConvertedOatRule`]'s expression string
//! and decides, for each candidate finding produced by its OR-group,
//! whether the rule's conditions also hold (§4.5).
//!
//! The expression grammar the compiler emits is restricted by
//! construction to `"(L0 OR L1 OR ...)" ["AND Lk" ...]` or a bare
//! label on either side, so the evaluator parses it with simple string
//! splitting rather than a general boolean-expression parser.

use crate::compiler::{Clause, ConvertedOatRule};
use crate::patterns::{find_regex, find_substring, project_json_paths, project_x_paths, selector_holds};
use crate::text_container::{Boundary, TextContainer};
use std::collections::HashMap;

/// One candidate match that satisfied every AND-ed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// Index into the source [`crate::model::Rule::patterns`] of the
    /// pattern that produced this finding.
    pub pattern_index: usize,
    pub boundary: Boundary,
}

/// The raw matches a non-`Within` clause produced, keyed by label.
struct ClauseMatches {
    by_label: HashMap<String, Vec<Boundary>>,
}

/// Evaluates every pattern clause once against `container`, honoring
/// each clause's scope restriction and optional structural projection.
///
/// `treat_everything_as_code` mirrors [`crate::processor::ProcessorOptions`]
/// of the same name: when set, scope restrictions are bypassed entirely
/// (every match is treated as code), because the caller has determined
/// this file has no reliable comment grammar to honor.
fn evaluate_leaf_clauses(clauses: &[Clause], container: &TextContainer, treat_everything_as_code: bool) -> ClauseMatches {
    let mut by_label = HashMap::new();

    for clause in clauses {
        let (label, raw) = match clause {
            Clause::SubstringIndexClause {
                label,
                data,
                scopes,
                use_word_boundaries,
                invert,
                arguments,
                ..
            } => {
                let case_insensitive = arguments.iter().any(|m| m == "i");
                let mut matches = Vec::new();
                for needle in data {
                    matches.extend(find_substring(container.content(), needle, *use_word_boundaries, case_insensitive, None));
                }
                let matches = filter_and_invert(matches, container, *scopes, *invert, treat_everything_as_code);
                (label.clone(), matches)
            }
            Clause::RegexWithIndexClause { label, data, scopes, invert, arguments, .. } => {
                let matches = find_regex(container.content(), data, arguments, None).unwrap_or_default();
                let matches = filter_and_invert(matches, container, *scopes, *invert, treat_everything_as_code);
                (label.clone(), matches)
            }
            Clause::WithinClause { inner, label, .. } => {
                let (_, matches) = evaluate_inner(inner, container, treat_everything_as_code);
                (label.clone(), matches)
            }
        };
        by_label.insert(label, raw);
    }

    ClauseMatches { by_label }
}

fn evaluate_inner(clause: &Clause, container: &TextContainer, treat_everything_as_code: bool) -> (String, Vec<Boundary>) {
    match clause {
        Clause::SubstringIndexClause {
            label,
            data,
            scopes,
            use_word_boundaries,
            invert,
            arguments,
            ..
        } => {
            let case_insensitive = arguments.iter().any(|m| m == "i");
            let mut matches = Vec::new();
            for needle in data {
                matches.extend(find_substring(container.content(), needle, *use_word_boundaries, case_insensitive, None));
            }
            (label.clone(), filter_and_invert(matches, container, *scopes, *invert, treat_everything_as_code))
        }
        Clause::RegexWithIndexClause { label, data, scopes, invert, arguments, .. } => {
            let matches = find_regex(container.content(), data, arguments, None).unwrap_or_default();
            (label.clone(), filter_and_invert(matches, container, *scopes, *invert, treat_everything_as_code))
        }
        Clause::WithinClause { label, inner, .. } => {
            let (_, matches) = evaluate_inner(inner, container, treat_everything_as_code);
            (label.clone(), matches)
        }
    }
}

fn filter_and_invert(
    matches: Vec<Boundary>,
    container: &TextContainer,
    scopes: crate::types::ScopeSet,
    invert: bool,
    treat_everything_as_code: bool,
) -> Vec<Boundary> {
    let scoped: Vec<Boundary> = matches
        .into_iter()
        .filter(|m| treat_everything_as_code || container.scope_match(scopes, *m))
        .collect();

    if !invert {
        return scoped;
    }
    if scoped.is_empty() {
        vec![Boundary::new(0, container.len().max(1))]
    } else {
        Vec::new()
    }
}

/// Restricts a pattern's raw matches to its declared JSONPath/XPath
/// projection, if any. A pattern with no `json_paths`/`x_paths`
/// searches the whole file, as today.
fn projected_regions(pattern: &crate::model::SearchPattern, content: &str) -> Option<Vec<Boundary>> {
    if pattern.json_paths.is_empty() && pattern.x_paths.is_empty() {
        return None;
    }
    let mut regions = Vec::new();
    if let Ok(r) = project_json_paths(content, &pattern.json_paths) {
        regions.extend(r);
    }
    if let Ok(r) = project_x_paths(content, &pattern.x_paths) {
        regions.extend(r);
    }
    Some(regions)
}

/// Evaluates one pattern's clause restricted to its own projection, if
/// it declares one. Separate from [`evaluate_leaf_clauses`] because
/// projection is a per-pattern concern, not a per-clause one — two
/// clauses sharing a label never happens, but a pattern that sets
/// `json_paths` needs a different match set than the unprojected scan
/// the within-clause helpers above use for conditions.
fn evaluate_pattern_clause(
    clause: &Clause,
    pattern: &crate::model::SearchPattern,
    container: &TextContainer,
    treat_everything_as_code: bool,
) -> Vec<Boundary> {
    let regions = projected_regions(pattern, container.content());
    match clause {
        Clause::SubstringIndexClause {
            data,
            scopes,
            use_word_boundaries,
            invert,
            arguments,
            ..
        } => {
            let case_insensitive = arguments.iter().any(|m| m == "i");
            let mut matches = Vec::new();
            for needle in data {
                matches.extend(find_substring(container.content(), needle, *use_word_boundaries, case_insensitive, regions.as_deref()));
            }
            filter_and_invert(matches, container, *scopes, *invert, treat_everything_as_code)
        }
        Clause::RegexWithIndexClause { data, scopes, invert, arguments, .. } => {
            let matches = find_regex(container.content(), data, arguments, regions.as_deref()).unwrap_or_default();
            filter_and_invert(matches, container, *scopes, *invert, treat_everything_as_code)
        }
        Clause::WithinClause { .. } => Vec::new(),
    }
}

/// Splits the compiler's expression string into the OR-group's labels
/// and the AND-ed condition labels that follow it.
fn parse_expression(expression: &str) -> (Vec<String>, Vec<String>) {
    if expression.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut parts = expression.split(" AND ");
    let first = parts.next().unwrap_or_default();
    let or_labels: Vec<String> = first
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(" OR ")
        .map(str::to_string)
        .collect();
    let and_labels: Vec<String> = parts.map(str::to_string).collect();
    (or_labels, and_labels)
}

/// Evaluates a compiled rule against `container`, returning one
/// [`Finding`] per candidate match that also satisfies every AND-ed
/// condition.
///
/// An empty expression (degenerate zero-pattern rule) never matches.
///
/// `treat_everything_as_code` forwards [`crate::processor::ProcessorOptions::treat_everything_as_code`]:
/// when set, every clause's scope restriction is bypassed.
pub fn evaluate(
    compiled: &ConvertedOatRule,
    rule: &crate::model::Rule,
    container: &TextContainer,
    treat_everything_as_code: bool,
) -> Vec<Finding> {
    if compiled.expression.is_empty() {
        return Vec::new();
    }

    let (or_labels, and_labels) = parse_expression(&compiled.expression);
    let leaf = evaluate_leaf_clauses(&compiled.clauses, container, treat_everything_as_code);

    let label_to_pattern_index: HashMap<&str, usize> = or_labels
        .iter()
        .enumerate()
        .map(|(i, label)| (label.as_str(), i))
        .collect();

    let mut out = Vec::new();
    for label in &or_labels {
        let Some(&pattern_index) = label_to_pattern_index.get(label.as_str()) else {
            continue;
        };
        let Some(pattern) = rule.patterns.get(pattern_index) else {
            continue;
        };
        let clause = compiled.clauses.iter().find(|c| c.label() == label);
        let Some(clause) = clause else { continue };

        let candidates = evaluate_pattern_clause(clause, pattern, container, treat_everything_as_code);

        'candidate: for boundary in candidates {
            for and_label in &and_labels {
                let within_clause = compiled.clauses.iter().find(|c| c.label() == and_label);
                let Some(Clause::WithinClause { search_in, negate_finding, .. }) = within_clause else {
                    continue;
                };
                let inner_matches = leaf.by_label.get(and_label.as_str()).cloned().unwrap_or_default();
                let holds = selector_holds(*search_in, container, boundary, &inner_matches);
                let satisfied = holds != *negate_finding;
                if !satisfied {
                    continue 'candidate;
                }
            }
            out.push(Finding { pattern_index, boundary });
        }
    }
    out
}
