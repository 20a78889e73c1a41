//! Error types for scanalyze
//!
//! Follows a hierarchical structure with specific error variants per
//! error category, rolled up into one top-level [`CoreError`].

use std::path::PathBuf;

/// Errors raised while loading or compiling a rule catalog.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// The rules source could not be parsed as JSON.
    #[error("failed to parse rule catalog at {path:?}: {source}")]
    Deserialize {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    /// The rules directory could not be read.
    #[error("failed to read rules directory {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),
}

/// A single reason a rule or clause was rejected during compilation.
///
/// Unlike [`RuleError`], a [`CompileViolation`] never aborts catalog
/// loading: the offending rule or clause is simply dropped and the
/// catalog remains usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileViolation {
    pub rule_id: String,
    pub clause_label: Option<String>,
    pub reason: String,
}

impl std::fmt::Display for CompileViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.clause_label {
            Some(label) => write!(
                f,
                "rule '{}' clause {}: {}",
                self.rule_id, label, self.reason
            ),
            None => write!(f, "rule '{}': {}", self.rule_id, self.reason),
        }
    }
}

/// Top-level error type for scanalyze.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("rule catalog error: {0}")]
    Rule(#[from] RuleError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
