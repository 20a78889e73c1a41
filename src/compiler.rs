#![forbid(unsafe_code)]

//! Rule Compiler — turns a [`Rule`] into a [`ConvertedOatRule`]: an
//! ordered list of [`Clause`]s plus the boolean expression string the
//! evaluator walks (§4.3).

use crate::error::CompileViolation;
use crate::model::{Rule, SearchCondition, SearchIn, SearchPattern};
use crate::patterns::regex_op::RegexCache;
use crate::types::{PatternType, ScopeSet};

/// One compiled leaf of a rule's boolean expression.
///
/// Every variant shares a `label` (`L0`, `L1`, ...) used by the
/// expression string and the evaluator to address it.
#[derive(Debug, Clone)]
pub enum Clause {
    SubstringIndexClause {
        label: String,
        data: Vec<String>,
        scopes: ScopeSet,
        use_word_boundaries: bool,
        capture: bool,
        invert: bool,
        /// Recognized: `i` (case-insensitive). `m` has no effect on a
        /// literal substring search.
        arguments: Vec<String>,
    },
    RegexWithIndexClause {
        label: String,
        data: Vec<String>,
        scopes: ScopeSet,
        capture: bool,
        invert: bool,
        /// Recognized: `i` (case-insensitive), `m` (multiline).
        arguments: Vec<String>,
    },
    WithinClause {
        label: String,
        search_in: SearchIn,
        negate_finding: bool,
        /// Index of the clause (by position in `ConvertedOatRule::clauses`)
        /// whose captures this condition is tested against.
        inner: Box<Clause>,
    },
}

impl Clause {
    pub fn label(&self) -> &str {
        match self {
            Self::SubstringIndexClause { label, .. }
            | Self::RegexWithIndexClause { label, .. }
            | Self::WithinClause { label, .. } => label,
        }
    }
}

/// A compiled rule: its clauses plus the expression joining them, ready
/// for the [`crate::evaluator`].
#[derive(Debug, Clone)]
pub struct ConvertedOatRule {
    pub rule_id: String,
    pub clauses: Vec<Clause>,
    /// `"(L0 OR L1 OR ...) AND Lk AND Ll"`. Empty when the rule has no
    /// patterns at all (degenerate rule, §4.3 step 2).
    pub expression: String,
}

/// Compiles one pattern into its clause. An unrecognized [`PatternType`]
/// cannot occur since [`PatternType`] is exhaustively matched, unlike
/// the raw JSON string it was parsed from — but a `regex`/`regex-word`
/// pattern's source text can still fail to compile, which is reported
/// as a [`CompileViolation`] (§4.3 "Validation") rather than deferred to
/// first use.
fn compile_pattern(
    pattern: &SearchPattern,
    label: String,
    rule_id: &str,
    violations: &mut Vec<CompileViolation>,
) -> Clause {
    let scopes = if pattern.scopes.is_empty() {
        ScopeSet::universal()
    } else {
        ScopeSet::from_scopes(&pattern.scopes)
    };

    let arguments = pattern.modifiers.clone();

    match pattern.pattern_type {
        PatternType::String => Clause::SubstringIndexClause {
            label,
            data: vec![pattern.pattern.clone()],
            scopes,
            use_word_boundaries: true,
            capture: true,
            invert: false,
            arguments,
        },
        PatternType::Substring => Clause::SubstringIndexClause {
            label,
            data: vec![pattern.pattern.clone()],
            scopes,
            use_word_boundaries: false,
            capture: true,
            invert: false,
            arguments,
        },
        PatternType::Regex => {
            let data = vec![pattern.pattern.clone()];
            validate_regex(&data, &arguments, rule_id, &label, violations);
            Clause::RegexWithIndexClause {
                label,
                data,
                scopes,
                capture: true,
                invert: false,
                arguments,
            }
        }
        PatternType::RegexWord => {
            let data = vec![format!(r"\b({})\b", pattern.pattern)];
            validate_regex(&data, &arguments, rule_id, &label, violations);
            Clause::RegexWithIndexClause {
                label,
                data,
                scopes,
                capture: true,
                invert: false,
                arguments,
            }
        }
    }
}

/// Compiles the joined regex now so a malformed pattern is reported at
/// load time instead of silently matching nothing at scan time; the
/// compiled result is cached, so this costs nothing extra once the
/// clause is actually evaluated.
fn validate_regex(
    data: &[String],
    arguments: &[String],
    rule_id: &str,
    label: &str,
    violations: &mut Vec<CompileViolation>,
) {
    if let Err(err) = RegexCache::get_or_compile(data, arguments) {
        violations.push(CompileViolation {
            rule_id: rule_id.to_string(),
            clause_label: Some(label.to_string()),
            reason: format!("invalid regex pattern: {err}"),
        });
    }
}

/// Compiles one condition into a [`Clause::WithinClause`] wrapping its
/// own pattern clause, or `None` with a pushed [`CompileViolation`] if
/// the condition's `search_in` selector cannot be mapped (this never
/// actually happens today since [`SearchIn::parse`] runs during model
/// loading and unparseable values are already dropped there — kept
/// here as the compiler's own defense in depth per §4.3 step 5).
fn compile_condition(
    condition: &SearchCondition,
    rule_id: &str,
    label: String,
    violations: &mut Vec<CompileViolation>,
) -> Option<Clause> {
    let inner_label = format!("{label}_inner");
    let inner = compile_pattern(&condition.pattern, inner_label, rule_id, violations);

    if !matches!(
        condition.search_in,
        SearchIn::FindingOnly
            | SearchIn::FindingRegion { .. }
            | SearchIn::SameLine
            | SearchIn::SameFile
            | SearchIn::OnlyBefore
            | SearchIn::OnlyAfter
    ) {
        violations.push(CompileViolation {
            rule_id: rule_id.to_string(),
            clause_label: Some(label),
            reason: "unrecognized search_in selector".to_string(),
        });
        return None;
    }

    Some(Clause::WithinClause {
        label,
        search_in: condition.search_in,
        negate_finding: condition.negate_finding,
        inner: Box::new(inner),
    })
}

/// Compiles a [`Rule`] into a [`ConvertedOatRule`], collecting any
/// non-fatal issues along the way.
///
/// A rule with zero patterns compiles to an empty clause list and an
/// empty expression; the evaluator treats an empty expression as
/// "never matches" (§4.3 step 2).
pub fn compile(rule: &Rule) -> (ConvertedOatRule, Vec<CompileViolation>) {
    let mut violations = Vec::new();
    let mut clauses = Vec::with_capacity(rule.patterns.len() + rule.conditions.len());

    let pattern_labels: Vec<String> = rule
        .patterns
        .iter()
        .enumerate()
        .map(|(i, pattern)| {
            let label = format!("L{i}");
            clauses.push(compile_pattern(pattern, label.clone(), rule.id.as_str(), &mut violations));
            label
        })
        .collect();

    let mut expression = if pattern_labels.is_empty() {
        String::new()
    } else if pattern_labels.len() == 1 {
        pattern_labels[0].clone()
    } else {
        format!("({})", pattern_labels.join(" OR "))
    };

    let base = clauses.len();
    for (i, condition) in rule.conditions.iter().enumerate() {
        let label = format!("L{}", base + i);
        if let Some(clause) = compile_condition(condition, rule.id.as_str(), label.clone(), &mut violations) {
            clauses.push(clause);
            if expression.is_empty() {
                expression = label;
            } else {
                expression.push_str(" AND ");
                expression.push_str(&label);
            }
        }
    }

    (
        ConvertedOatRule {
            rule_id: rule.id.as_str().to_string(),
            clauses,
            expression,
        },
        violations,
    )
}
