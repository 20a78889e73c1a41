#![forbid(unsafe_code)]

//! Core domain types shared across the rules engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authored severity of a rule, ordered most to least impactful.
///
/// Reported on every [`crate::model::MatchRecord`] but never used to
/// filter results — only [`Confidence`] gates emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Critical,
    Important,
    Moderate,
    BestPractice,
    ManualReview,
}

impl Severity {
    /// Parses a severity name case-insensitively, accepting both
    /// `kebab-case` and the schema's documented spellings.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "important" => Some(Self::Important),
            "moderate" => Some(Self::Moderate),
            "best-practice" | "bestpractice" => Some(Self::BestPractice),
            "manual-review" | "manualreview" => Some(Self::ManualReview),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Moderate => "moderate",
            Self::BestPractice => "best-practice",
            Self::ManualReview => "manual-review",
        };
        write!(f, "{s}")
    }
}

/// Authored quality of a pattern; drives runtime filtering via a
/// [`ConfidenceFilter`] bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Low => 0b001,
            Self::Medium => 0b010,
            Self::High => 0b100,
        }
    }
}

/// A bitmask of accepted [`Confidence`] levels.
///
/// Defaults to `High | Medium`, matching the processor's documented
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceFilter(u8);

impl ConfidenceFilter {
    pub const fn new(mask: u8) -> Self {
        Self(mask)
    }

    pub fn all() -> Self {
        Self(0b111)
    }

    pub fn from_levels(levels: &[Confidence]) -> Self {
        levels.iter().fold(Self(0), |acc, c| acc.with(*c))
    }

    pub const fn with(self, confidence: Confidence) -> Self {
        Self(self.0 | confidence.bit())
    }

    pub fn contains(self, confidence: Confidence) -> bool {
        self.0 & confidence.bit() != 0
    }
}

impl Default for ConfidenceFilter {
    /// `High | Medium`, per the Rule Processor's documented default.
    fn default() -> Self {
        Self::new(0).with(Confidence::High).with(Confidence::Medium)
    }
}

/// Where in a file a pattern is allowed to match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    All,
    Code,
    Comment,
}

/// A set of [`Scope`] values, small enough to live inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScopeSet(u8);

const SCOPE_ALL: u8 = 0b001;
const SCOPE_CODE: u8 = 0b010;
const SCOPE_COMMENT: u8 = 0b100;

impl ScopeSet {
    pub fn from_scopes(scopes: &[Scope]) -> Self {
        let mut set = Self::default();
        for s in scopes {
            set.insert(*s);
        }
        set
    }

    /// The compiler's default when a pattern specifies no scopes: `[All]`.
    pub fn universal() -> Self {
        Self(SCOPE_ALL)
    }

    pub fn insert(&mut self, scope: Scope) {
        self.0 |= match scope {
            Scope::All => SCOPE_ALL,
            Scope::Code => SCOPE_CODE,
            Scope::Comment => SCOPE_COMMENT,
        };
    }

    pub fn contains(self, scope: Scope) -> bool {
        let bit = match scope {
            Scope::All => SCOPE_ALL,
            Scope::Code => SCOPE_CODE,
            Scope::Comment => SCOPE_COMMENT,
        };
        self.0 & bit != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// How a [`crate::model::SearchPattern`]'s text is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternType {
    String,
    Substring,
    Regex,
    RegexWord,
}

/// A validated, dotted-path rule tag (e.g. `"crypto.weak-hash"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(String);

impl Tag {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable rule identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A source-language name, as returned by the [`crate::language::LanguageRegistry`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageName(String);

impl LanguageName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LanguageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}
