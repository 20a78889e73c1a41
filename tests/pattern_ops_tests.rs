//! Integration coverage for pattern operations exercised through the
//! public catalog/processor API, rather than the crate-internal unit
//! tests living next to each operator.

use scanalyze::catalog::load_rules;
use scanalyze::language::from_file_name;
use scanalyze::processor::{analyze_file, CancellationToken, ProcessorOptions};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

fn write_rule(dir: &Path, name: &str, json: &str) {
    let mut file = std::fs::File::create(dir.join(name)).unwrap();
    file.write_all(json.as_bytes()).unwrap();
}

#[test]
fn regex_word_pattern_respects_word_boundaries() {
    let dir = tempdir().unwrap();
    write_rule(
        dir.path(),
        "r.json",
        r#"{
            "id": "rw1", "description": "d", "severity": "moderate",
            "patterns": [{"pattern": "md5", "type": "regex-word", "confidence": "high"}]
        }"#,
    );
    let (catalog, _) = load_rules(dir.path()).unwrap();
    let (_, language) = from_file_name(Path::new("x.rs"));
    let options = ProcessorOptions::default();
    let token = CancellationToken::new();

    let bare = analyze_file("hash = md5(data)", Path::new("x.rs"), &language, &catalog, &options, None, &token);
    assert_eq!(bare.matches.len(), 1);

    let embedded = analyze_file("hmac_md5sum(data)", Path::new("x.rs"), &language, &catalog, &options, None, &token);
    assert!(embedded.matches.is_empty());
}

#[test]
fn multiple_alternatives_in_one_pattern_all_match() {
    let dir = tempdir().unwrap();
    write_rule(
        dir.path(),
        "r.json",
        r#"{
            "id": "re1", "description": "d", "severity": "moderate",
            "patterns": [{"pattern": "md5|sha1", "type": "regex", "confidence": "high"}]
        }"#,
    );
    let (catalog, _) = load_rules(dir.path()).unwrap();
    let (_, language) = from_file_name(Path::new("x.rs"));
    let options = ProcessorOptions::default();
    let token = CancellationToken::new();

    let result = analyze_file(
        "let a = md5(x); let b = sha1(y);",
        Path::new("x.rs"),
        &language,
        &catalog,
        &options,
        None,
        &token,
    );
    assert_eq!(result.matches.len(), 2);
}

#[test]
fn x_path_projection_restricts_matches_to_element_text() {
    let dir = tempdir().unwrap();
    write_rule(
        dir.path(),
        "r.json",
        r#"{
            "id": "xp1", "description": "d", "severity": "moderate",
            "patterns": [{
                "pattern": "secret", "type": "substring", "confidence": "high",
                "xpaths": ["//password"]
            }]
        }"#,
    );
    let (catalog, _) = load_rules(dir.path()).unwrap();
    let (_, language) = from_file_name(Path::new("x.xml"));
    let options = ProcessorOptions::default();
    let token = CancellationToken::new();

    let content = "<config><password>secret</password><!-- secret backup copy --></config>";
    let result = analyze_file(content, Path::new("x.xml"), &language, &catalog, &options, None, &token);
    assert_eq!(result.matches.len(), 1);
}

#[test]
fn x_path_namespace_agnostic_local_name_matches_regardless_of_xmlns() {
    let dir = tempdir().unwrap();
    write_rule(
        dir.path(),
        "r.json",
        r#"{
            "id": "xp2", "description": "d", "severity": "moderate",
            "patterns": [{
                "pattern": "17", "type": "regex", "confidence": "high",
                "xpaths": ["/*[local-name(.)='project']/*[local-name(.)='properties']/*[local-name(.)='java.version']"]
            }]
        }"#,
    );
    let (catalog, _) = load_rules(dir.path()).unwrap();
    let (_, language) = from_file_name(Path::new("pom.xml"));
    let options = ProcessorOptions::default();
    let token = CancellationToken::new();

    let without_xmlns = "<project><properties><java.version>17</java.version></properties></project>";
    let result = analyze_file(without_xmlns, Path::new("pom.xml"), &language, &catalog, &options, None, &token);
    assert_eq!(result.matches.len(), 1);

    let with_xmlns =
        "<project xmlns=\"http://maven.apache.org/POM/4.0.0\"><properties><java.version>17</java.version></properties></project>";
    let result = analyze_file(with_xmlns, Path::new("pom.xml"), &language, &catalog, &options, None, &token);
    assert_eq!(result.matches.len(), 1);
}

#[test]
fn case_insensitive_modifier_matches_mixed_case_regex() {
    let dir = tempdir().unwrap();
    write_rule(
        dir.path(),
        "r.json",
        r#"{
            "id": "mod1", "description": "d", "severity": "moderate",
            "patterns": [{
                "pattern": "danger", "type": "regex", "confidence": "high",
                "modifiers": ["i"]
            }]
        }"#,
    );
    let (catalog, _) = load_rules(dir.path()).unwrap();
    let (_, language) = from_file_name(Path::new("x.rs"));
    let options = ProcessorOptions::default();
    let token = CancellationToken::new();

    let result = analyze_file("DANGER ahead", Path::new("x.rs"), &language, &catalog, &options, None, &token);
    assert_eq!(result.matches.len(), 1);
}

#[test]
fn invalid_regex_pattern_is_a_compile_violation_not_a_panic() {
    let dir = tempdir().unwrap();
    write_rule(
        dir.path(),
        "r.json",
        r#"{
            "id": "bad-regex", "description": "d", "severity": "moderate",
            "patterns": [{"pattern": "(unterminated", "type": "regex", "confidence": "high"}]
        }"#,
    );
    let (catalog, violations) = load_rules(dir.path()).unwrap();
    assert!(violations.iter().any(|v| v.rule_id == "bad-regex"));

    let (_, language) = from_file_name(Path::new("x.rs"));
    let options = ProcessorOptions::default();
    let token = CancellationToken::new();

    let result = analyze_file("(unterminated", Path::new("x.rs"), &language, &catalog, &options, None, &token);
    assert!(result.matches.is_empty());
}
