//! `list-rules` command handler: reports what a rules directory would
//! load, plus any compile-time violations, without scanning any files.

use crate::catalog::load_rules;
use crate::cli::args::OutputFormat;
use crate::error::CoreError;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct RuleSummary {
    id: String,
    name: String,
    severity: String,
    tags: Vec<String>,
    universal: bool,
}

pub fn run(rules: PathBuf, format: OutputFormat) -> Result<(), CoreError> {
    let (catalog, violations) = load_rules(&rules).map_err(CoreError::Rule)?;

    let summaries: Vec<RuleSummary> = catalog
        .all()
        .map(|entry| RuleSummary {
            id: entry.rule.id.as_str().to_string(),
            name: entry.rule.name.clone(),
            severity: entry.rule.severity.to_string(),
            tags: entry.rule.tags.iter().map(|t| t.as_str().to_string()).collect(),
            universal: entry.rule.is_universal(),
        })
        .collect();

    match format {
        OutputFormat::Jsonl => {
            for summary in &summaries {
                if let Ok(json) = serde_json::to_string(summary) {
                    println!("{json}");
                }
            }
        }
        OutputFormat::Human => {
            for summary in &summaries {
                println!(
                    "{} [{}] {} (tags: {})",
                    summary.id,
                    summary.severity,
                    summary.name,
                    summary.tags.join(", ")
                );
            }
        }
    }

    if !violations.is_empty() {
        eprintln!("{} violation(s) while loading rules:", violations.len());
        for violation in &violations {
            eprintln!("  {violation}");
        }
    }

    Ok(())
}
