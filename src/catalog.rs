#![forbid(unsafe_code)]

//! Rule Catalog — loads a directory of rule JSON documents, compiles
//! each one, and indexes the survivors by applicability so the
//! processor can select a file's candidate rules without scanning the
//! whole catalog (§4.3, §4.6).

use crate::compiler::{compile, ConvertedOatRule};
use crate::error::{CompileViolation, RuleError};
use crate::model::{Rule, RuleDocument};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// One loaded, compiled rule plus its source, kept together because
/// the processor needs both the typed [`Rule`] (for severity, tags,
/// excerpt text) and the compiled clauses (for evaluation).
pub struct CatalogEntry {
    pub rule: Rule,
    pub compiled: ConvertedOatRule,
    /// Precompiled `applies_to_file_regex` patterns; a regex that fails
    /// to compile drops the rule with a [`CompileViolation`] rather
    /// than panicking at match time.
    file_regexes: Vec<Regex>,
}

impl CatalogEntry {
    /// True when this rule should be evaluated against a file with the
    /// given language name or path.
    pub fn applies_to(&self, language: &str, path: &Path) -> bool {
        if self.rule.is_universal() {
            return true;
        }
        let by_language = self
            .rule
            .applies_to
            .iter()
            .any(|l| l.as_str().eq_ignore_ascii_case(language));
        if by_language {
            return true;
        }
        let file_name = path.to_string_lossy();
        self.file_regexes.iter().any(|re| re.is_match(&file_name))
    }
}

/// An indexed, ready-to-query collection of compiled rules.
#[derive(Default)]
pub struct RuleCatalog {
    entries: Vec<CatalogEntry>,
}

impl RuleCatalog {
    /// Rules with no language or filename restriction — always
    /// candidates, regardless of the file under analysis.
    pub fn universal_rules(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(|e| e.rule.is_universal())
    }

    /// Rules that declare `language` in their `applies_to` set
    /// (case-insensitively), per the library surface in §6.
    pub fn by_language<'a>(&'a self, language: &'a str) -> impl Iterator<Item = &'a CatalogEntry> {
        self.entries
            .iter()
            .filter(move |e| e.rule.applies_to.iter().any(|l| l.as_str().eq_ignore_ascii_case(language)))
    }

    /// Rules whose `applies_to_file_regex` matches `name`, per the
    /// library surface in §6.
    pub fn by_filename<'a>(&'a self, name: &Path) -> impl Iterator<Item = &'a CatalogEntry> {
        let file_name = name.to_string_lossy().into_owned();
        self.entries
            .iter()
            .filter(move |e| e.file_regexes.iter().any(|re| re.is_match(&file_name)))
    }

    /// Every loaded rule, regardless of applicability — used for
    /// catalog diagnostics (e.g. `list-rules`), not file analysis.
    pub fn all(&self) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter()
    }

    /// Candidate rules for a file with the given detected language and
    /// path, in catalog order: universal rules, then by-language and
    /// by-filename rules.
    pub fn rules_for(&self, language: &str, path: &Path) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.applies_to(language, path))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loads a rule catalog from `source`: a directory of `*.json` files, a
/// single `.json` file, or any other path read whole as one JSON
/// document/array (§4.3, §6 "Rules are loaded once from JSON (file,
/// directory, or string)"). Compiles every rule and returns the catalog
/// plus every violation encountered along the way (unknown enum
/// strings, unparsable regexes, malformed clauses). A violation never
/// aborts the load — only the offending rule is dropped.
pub fn load_rules(source: &Path) -> Result<(RuleCatalog, Vec<CompileViolation>), RuleError> {
    if source.is_dir() {
        load_rules_from_dir(source)
    } else {
        let text = std::fs::read_to_string(source).map_err(|e| RuleError::Io(source.to_path_buf(), e))?;
        load_rules_from_str(&text, Some(source))
    }
}

fn load_rules_from_dir(dir: &Path) -> Result<(RuleCatalog, Vec<CompileViolation>), RuleError> {
    let mut violations = Vec::new();
    let mut entries = Vec::new();

    let read_dir = std::fs::read_dir(dir).map_err(|e| RuleError::Io(dir.to_path_buf(), e))?;

    for item in read_dir {
        let item = item.map_err(|e| RuleError::Io(dir.to_path_buf(), e))?;
        let path = item.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }

        let text = std::fs::read_to_string(&path).map_err(|e| RuleError::Io(path.clone(), e))?;
        let (file_entries, file_violations) = compile_documents(&text, Some(&path))?;
        entries.extend(file_entries);
        violations.extend(file_violations);
    }

    Ok((RuleCatalog { entries }, violations))
}

/// Loads a rule catalog from an in-memory JSON string (a single rule
/// document or an array of documents), with no filesystem access at
/// all. `source_path`, when given, is only used to annotate
/// deserialization errors.
pub fn load_rules_from_str(
    text: &str,
    source_path: Option<&Path>,
) -> Result<(RuleCatalog, Vec<CompileViolation>), RuleError> {
    let (entries, violations) = compile_documents(text, source_path)?;
    Ok((RuleCatalog { entries }, violations))
}

fn compile_documents(
    text: &str,
    path: Option<&Path>,
) -> Result<(Vec<CatalogEntry>, Vec<CompileViolation>), RuleError> {
    let mut violations = Vec::new();
    let mut entries = Vec::new();

    let documents: Vec<RuleDocument> = match serde_json::from_str::<Vec<RuleDocument>>(text) {
        Ok(docs) => docs,
        Err(_) => {
            let single: RuleDocument = serde_json::from_str(text).map_err(|source| RuleError::Deserialize {
                path: path.map(Path::to_path_buf),
                source,
            })?;
            vec![single]
        }
    };

    for document in documents {
        let rule = document.into_rule(&mut violations);
        let (compiled, compile_violations) = compile(&rule);
        violations.extend(compile_violations);

        let mut file_regexes = Vec::new();
        for pattern in &rule.applies_to_file_regex {
            match Regex::new(pattern) {
                Ok(re) => file_regexes.push(re),
                Err(err) => violations.push(CompileViolation {
                    rule_id: rule.id.as_str().to_string(),
                    clause_label: None,
                    reason: format!("invalid applies_to_file_regex {pattern:?}: {err}"),
                }),
            }
        }

        entries.push(CatalogEntry {
            rule,
            compiled,
            file_regexes,
        });
    }

    Ok((entries, violations))
}

/// Groups a catalog's rules by declared language, for diagnostics and
/// for the CLI's `--rules` summary output.
pub fn by_language(catalog: &RuleCatalog) -> HashMap<String, Vec<&str>> {
    let mut map: HashMap<String, Vec<&str>> = HashMap::new();
    for entry in &catalog.entries {
        for language in &entry.rule.applies_to {
            map.entry(language.as_str().to_string())
                .or_default()
                .push(entry.rule.id.as_str());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_rule(dir: &Path, name: &str, json: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(json.as_bytes()).unwrap();
    }

    #[test]
    fn loads_and_compiles_a_universal_rule() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "rule.json",
            r#"{
                "id": "test-1",
                "name": "Test",
                "description": "desc",
                "severity": "moderate",
                "tags": ["test.tag"],
                "patterns": [
                    {"pattern": "danger", "type": "substring", "confidence": "high"}
                ]
            }"#,
        );
        let (catalog, violations) = load_rules(dir.path()).unwrap();
        assert!(violations.is_empty());
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.universal_rules().count(), 1);
    }

    #[test]
    fn unknown_severity_is_reported_as_violation_but_rule_still_loads() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "rule.json",
            r#"{
                "id": "test-2",
                "description": "desc",
                "severity": "not-a-real-severity",
                "patterns": [
                    {"pattern": "danger", "type": "substring", "confidence": "high"}
                ]
            }"#,
        );
        let (catalog, violations) = load_rules(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(violations.iter().any(|v| v.rule_id == "test-2"));
    }

    #[test]
    fn rules_for_filters_by_language_and_filename_regex() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "rule.json",
            r#"{
                "id": "py-only",
                "description": "desc",
                "severity": "moderate",
                "applies_to": ["python"],
                "patterns": [
                    {"pattern": "eval(", "type": "substring", "confidence": "high"}
                ]
            }"#,
        );
        let (catalog, _) = load_rules(dir.path()).unwrap();
        assert_eq!(catalog.rules_for("python", Path::new("a.py")).len(), 1);
        assert_eq!(catalog.rules_for("rust", Path::new("a.rs")).len(), 0);
        assert_eq!(catalog.by_language("python").count(), 1);
        assert_eq!(catalog.by_language("rust").count(), 0);
    }

    #[test]
    fn by_filename_matches_applies_to_file_regex() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "rule.json",
            r#"{
                "id": "pom-only",
                "description": "desc",
                "severity": "moderate",
                "applies_to_file_regex": ["pom\\.xml$"],
                "patterns": [{"pattern": "17", "type": "string", "confidence": "high"}]
            }"#,
        );
        let (catalog, _) = load_rules(dir.path()).unwrap();
        assert_eq!(catalog.by_filename(Path::new("pom.xml")).count(), 1);
        assert_eq!(catalog.by_filename(Path::new("other.xml")).count(), 0);
    }

    #[test]
    fn non_json_files_are_ignored() {
        let dir = tempdir().unwrap();
        write_rule(dir.path(), "notes.txt", "not a rule");
        let (catalog, violations) = load_rules(dir.path()).unwrap();
        assert!(catalog.is_empty());
        assert!(violations.is_empty());
    }

    #[test]
    fn load_rules_from_str_parses_a_bare_array() {
        let (catalog, violations) = load_rules_from_str(
            r#"[{
                "id": "inline-1",
                "description": "desc",
                "severity": "moderate",
                "patterns": [{"pattern": "danger", "type": "substring", "confidence": "high"}]
            }]"#,
            None,
        )
        .unwrap();
        assert!(violations.is_empty());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn load_rules_accepts_a_single_file_path() {
        let dir = tempdir().unwrap();
        write_rule(
            dir.path(),
            "one.json",
            r#"{
                "id": "solo",
                "description": "desc",
                "severity": "moderate",
                "patterns": [{"pattern": "danger", "type": "substring", "confidence": "high"}]
            }"#,
        );
        let (catalog, violations) = load_rules(&dir.path().join("one.json")).unwrap();
        assert!(violations.is_empty());
        assert_eq!(catalog.len(), 1);
    }
}
