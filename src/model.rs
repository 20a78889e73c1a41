#![forbid(unsafe_code)]

//! Rule Model — typed representation of rules, patterns, conditions and
//! scopes, deserialized from the JSON schema in §6.

use crate::text_container::{Boundary, Location};
use crate::types::{Confidence, LanguageName, PatternType, RuleId, Scope, Severity, Tag};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One matcher inside a [`Rule`] (§3 `SearchPattern`).
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPattern {
    pub pattern: String,
    #[serde(rename = "type")]
    pub pattern_type: PatternType,
    pub confidence: Confidence,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default, rename = "jsonpaths")]
    pub json_paths: Vec<String>,
    #[serde(default, rename = "xpaths")]
    pub x_paths: Vec<String>,
}

/// `search_in` selector for a [`SearchCondition`] (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchIn {
    FindingOnly,
    FindingRegion { before: u32, after: u32 },
    SameLine,
    SameFile,
    OnlyBefore,
    OnlyAfter,
}

impl SearchIn {
    /// Parses the `search_in` string, including `finding-region(N,M)`.
    /// Returns `None` for unrecognized values, which the compiler then
    /// logs and drops (§4.3 step 5).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "finding-only" => Some(Self::FindingOnly),
            "same-line" => Some(Self::SameLine),
            "same-file" => Some(Self::SameFile),
            "only-before" => Some(Self::OnlyBefore),
            "only-after" => Some(Self::OnlyAfter),
            _ => {
                let inner = s
                    .strip_prefix("finding-region(")
                    .and_then(|rest| rest.strip_suffix(')'))?;
                let mut parts = inner.split(',').map(str::trim);
                let before: u32 = parts.next()?.parse().ok()?;
                let after: u32 = parts.next()?.parse().ok()?;
                Some(Self::FindingRegion { before, after })
            }
        }
    }
}

/// Gates a rule by the presence/absence of another pattern near the
/// candidate match (§3 `SearchCondition`).
#[derive(Debug, Clone)]
pub struct SearchCondition {
    pub pattern: SearchPattern,
    pub search_in: SearchIn,
    pub negate_finding: bool,
}

/// A named, tagged match intent (§3 `Rule`).
#[derive(Debug, Clone)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    pub description: String,
    pub severity: Severity,
    pub tags: Vec<Tag>,
    pub applies_to: Vec<LanguageName>,
    pub applies_to_file_regex: Vec<String>,
    pub patterns: Vec<SearchPattern>,
    pub conditions: Vec<SearchCondition>,
}

impl Rule {
    /// A universal rule has neither a language nor a filename
    /// restriction.
    pub fn is_universal(&self) -> bool {
        self.applies_to.is_empty() && self.applies_to_file_regex.is_empty()
    }
}

// --- JSON schema (§6), kept separate from the `Rule` the compiler
// consumes so unknown fields / case-insensitive enums are handled once,
// here, at the boundary. ---

#[derive(Debug, Deserialize)]
pub(crate) struct RuleDocument {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub severity: String,
    #[serde(default)]
    pub applies_to: Vec<String>,
    #[serde(default)]
    pub applies_to_file_regex: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<PatternDocument>,
    #[serde(default)]
    pub conditions: Vec<ConditionDocument>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PatternDocument {
    pub pattern: String,
    #[serde(rename = "type")]
    pub pattern_type: String,
    pub confidence: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    #[serde(default)]
    pub xpaths: Vec<String>,
    #[serde(default)]
    pub jsonpaths: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConditionDocument {
    pub pattern: PatternDocument,
    #[serde(default = "default_search_in")]
    pub search_in: String,
    #[serde(default)]
    pub negate_finding: bool,
}

fn default_search_in() -> String {
    "finding-only".to_string()
}

/// A `MatchRecord`'s matched pattern type, carried through for reporting
/// without re-deriving it from the clause that produced the capture.
pub use crate::types::PatternType as MatchedPatternType;

/// One reported finding (§3 `MatchRecord`).
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub file: PathBuf,
    pub language: String,
    pub boundary_index: usize,
    pub boundary_length: usize,
    pub start: LocationDto,
    pub end: LocationDto,
    pub rule_id: String,
    pub rule_name: String,
    pub rule_description: String,
    pub matched_pattern: String,
    pub pattern_type: String,
    pub confidence: String,
    pub severity: String,
    pub tags: Vec<String>,
    pub sample: String,
    pub excerpt: Option<String>,
}

/// Serializable mirror of [`Location`].
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LocationDto {
    pub line: u32,
    pub column: u32,
}

impl From<Location> for LocationDto {
    fn from(loc: Location) -> Self {
        Self {
            line: loc.line,
            column: loc.column,
        }
    }
}

impl MatchRecord {
    pub fn boundary(&self) -> Boundary {
        Boundary::new(self.boundary_index, self.boundary_length)
    }
}

impl PatternDocument {
    /// Converts a JSON pattern document into a [`SearchPattern`], or
    /// `None` with a pushed [`CompileViolation`] if the `type` or
    /// `confidence` is unrecognized.
    fn into_pattern(
        self,
        rule_id: &str,
        violations: &mut Vec<crate::error::CompileViolation>,
    ) -> Option<SearchPattern> {
        let pattern_type = match self.pattern_type.as_str() {
            "string" => PatternType::String,
            "substring" => PatternType::Substring,
            "regex" => PatternType::Regex,
            "regex-word" => PatternType::RegexWord,
            other => {
                violations.push(crate::error::CompileViolation {
                    rule_id: rule_id.to_string(),
                    clause_label: None,
                    reason: format!("unknown pattern type '{other}'"),
                });
                return None;
            }
        };

        let confidence = match Confidence::parse(&self.confidence) {
            Some(c) => c,
            None => {
                violations.push(crate::error::CompileViolation {
                    rule_id: rule_id.to_string(),
                    clause_label: None,
                    reason: format!("unknown confidence '{}'", self.confidence),
                });
                return None;
            }
        };

        let scopes = self
            .scopes
            .iter()
            .filter_map(|s| match s.to_ascii_lowercase().as_str() {
                "all" => Some(Scope::All),
                "code" => Some(Scope::Code),
                "comment" => Some(Scope::Comment),
                _ => None,
            })
            .collect();

        Some(SearchPattern {
            pattern: self.pattern,
            pattern_type,
            confidence,
            scopes,
            modifiers: self.modifiers,
            json_paths: self.jsonpaths,
            x_paths: self.xpaths,
        })
    }
}

impl RuleDocument {
    /// Converts a deserialized JSON document into a compiler-ready
    /// [`Rule`], collecting non-fatal issues (unknown pattern type,
    /// unknown severity, unknown `search_in`) as [`crate::error::CompileViolation`]s
    /// rather than failing the whole catalog load.
    pub(crate) fn into_rule(
        self,
        violations: &mut Vec<crate::error::CompileViolation>,
    ) -> Rule {
        let severity = Severity::parse(&self.severity).unwrap_or_else(|| {
            violations.push(crate::error::CompileViolation {
                rule_id: self.id.clone(),
                clause_label: None,
                reason: format!("unknown severity '{}', defaulting to moderate", self.severity),
            });
            Severity::Moderate
        });

        let patterns: Vec<SearchPattern> = self
            .patterns
            .into_iter()
            .filter_map(|p| p.into_pattern(&self.id, violations))
            .collect();

        let conditions: Vec<SearchCondition> = self
            .conditions
            .into_iter()
            .filter_map(|c| {
                let search_in = match SearchIn::parse(&c.search_in) {
                    Some(s) => s,
                    None => {
                        violations.push(crate::error::CompileViolation {
                            rule_id: self.id.clone(),
                            clause_label: None,
                            reason: format!("unknown search_in '{}'", c.search_in),
                        });
                        return None;
                    }
                };
                let pattern = c.pattern.into_pattern(&self.id, violations)?;
                Some(SearchCondition {
                    pattern,
                    search_in,
                    negate_finding: c.negate_finding,
                })
            })
            .collect();

        Rule {
            id: RuleId::new(self.id.clone()),
            name: self.name.unwrap_or(self.id),
            description: self.description,
            severity,
            tags: self.tags.into_iter().map(Tag::new).collect(),
            applies_to: self.applies_to.into_iter().map(LanguageName::new).collect(),
            applies_to_file_regex: self.applies_to_file_regex,
            patterns,
            conditions,
        }
    }
}
