#![forbid(unsafe_code)]

//! Structure-aware pre-projection — restricts a pattern's search space
//! to the text backing specific JSON or XML nodes before the
//! substring/regex operators run over it (§4.4.4).
//!
//! Projection never parses the clause's own pattern text as JSON/XML;
//! it parses the *file under analysis*, resolves each `json_paths`/
//! `x_paths` expression against it, and turns the resulting node
//! values back into [`Boundary`] regions by locating their literal
//! text in the original content. A node value that does not appear
//! verbatim in the source (e.g. a number re-serialized without its
//! original formatting) cannot be projected and is silently skipped.

use crate::text_container::Boundary;
use jsonpath_rust::JsonPathQuery;
use sxd_document::parser;
use sxd_xpath::{Context, Factory, Value as XValue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("content is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("invalid JSONPath expression {expr:?}: {reason}")]
    InvalidJsonPath { expr: String, reason: String },

    #[error("content is not valid XML: {0}")]
    InvalidXml(#[from] sxd_document::parser::Error),

    #[error("invalid XPath expression {expr:?}: {reason}")]
    InvalidXPath { expr: String, reason: String },
}

/// Resolves every expression in `json_paths` against `content` and
/// returns the regions their matched values occupy in the original
/// text, in match order. Returns `Ok(vec![])` (not an error) for
/// expressions that match nothing.
pub fn project_json_paths(content: &str, json_paths: &[String]) -> Result<Vec<Boundary>, ProjectionError> {
    if json_paths.is_empty() {
        return Ok(Vec::new());
    }
    let root: serde_json::Value = serde_json::from_str(content)?;

    let mut regions = Vec::new();
    for expr in json_paths {
        let matched = root
            .clone()
            .path(expr)
            .map_err(|reason| ProjectionError::InvalidJsonPath {
                expr: expr.clone(),
                reason,
            })?;

        for value in flatten_json(&matched) {
            if let Some(text) = json_value_text(&value) {
                regions.extend(locate_all(content, &text));
            }
        }
    }
    Ok(regions)
}

/// `jsonpath-rust`'s `.path()` wraps multi-match results in a JSON
/// array; a query that targets a single scalar returns that scalar
/// directly. Normalize both shapes into a flat list of leaf values.
fn flatten_json(value: &serde_json::Value) -> Vec<serde_json::Value> {
    match value {
        serde_json::Value::Array(items) => items.clone(),
        serde_json::Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

fn json_value_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
    }
}

/// Resolves every expression in `x_paths` against `content`, read as
/// namespace-agnostic XML, and returns the regions their matched node
/// text occupies in the original source.
pub fn project_x_paths(content: &str, x_paths: &[String]) -> Result<Vec<Boundary>, ProjectionError> {
    if x_paths.is_empty() {
        return Ok(Vec::new());
    }
    let package = parser::parse(content)?;
    let document = package.as_document();
    let factory = Factory::new();
    let context = Context::new();

    let mut regions = Vec::new();
    for expr in x_paths {
        let xpath = factory
            .build(expr)
            .map_err(|e| ProjectionError::InvalidXPath {
                expr: expr.clone(),
                reason: e.to_string(),
            })?
            .ok_or_else(|| ProjectionError::InvalidXPath {
                expr: expr.clone(),
                reason: "empty expression".to_string(),
            })?;

        let value = xpath
            .evaluate(&context, document.root())
            .map_err(|e| ProjectionError::InvalidXPath {
                expr: expr.clone(),
                reason: e.to_string(),
            })?;

        match value {
            XValue::Nodeset(nodes) => {
                for node in nodes.document_order() {
                    regions.extend(locate_all(content, &node.string_value()));
                }
            }
            XValue::String(s) => regions.extend(locate_all(content, &s)),
            XValue::Number(n) => regions.extend(locate_all(content, &n.to_string())),
            XValue::Boolean(_) => {}
        }
    }
    Ok(regions)
}

/// Every verbatim occurrence of `needle` in `content`, as a region a
/// downstream pattern operator can be restricted to.
fn locate_all(content: &str, needle: &str) -> Vec<Boundary> {
    if needle.is_empty() {
        return Vec::new();
    }
    content
        .match_indices(needle)
        .map(|(idx, _)| Boundary::new(idx, needle.len()))
        .collect()
}
