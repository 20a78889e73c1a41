//! `scan` command handler: wires the file walker, execution engine and
//! an output formatter together.

use crate::catalog::load_rules;
use crate::cli::args::{ColorChoice, ConfidenceLevel, OutputFormat};
use crate::engine::{ExecutionEngine, FileWalker};
use crate::error::CoreError;
use crate::output::{HumanFormatter, JsonlFormatter};
use crate::processor::{CancellationToken, ProcessorOptions};
use crate::types::{Confidence, ConfidenceFilter};
use std::path::PathBuf;
use tracing::{info, warn};

#[allow(clippy::too_many_arguments)]
pub fn run(
    paths: Vec<PathBuf>,
    rules: PathBuf,
    format: OutputFormat,
    color: ColorChoice,
    min_confidence: Vec<ConfidenceLevel>,
    context: i32,
    jobs: usize,
    unique_tags_only: bool,
    scan_unknown_extensions: bool,
    file_timeout_ms: Option<u64>,
    include: Vec<String>,
    exclude: Vec<String>,
) -> Result<(), CoreError> {
    let (catalog, violations) = load_rules(&rules).map_err(CoreError::Rule)?;
    for violation in &violations {
        warn!(%violation, "rule catalog violation");
    }
    info!(rule_count = catalog.len(), "loaded rule catalog");

    if jobs > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .map_err(|e| CoreError::Config(format!("failed to configure thread pool: {e}")))?;
    }

    let confidence_filter = ConfidenceFilter::from_levels(
        &min_confidence
            .iter()
            .map(|c| match c {
                ConfidenceLevel::Low => Confidence::Low,
                ConfidenceLevel::Medium => Confidence::Medium,
                ConfidenceLevel::High => Confidence::High,
            })
            .collect::<Vec<_>>(),
    );

    let options = ProcessorOptions {
        confidence_filter,
        context_lines: context,
        file_timeout_ms,
        ..Default::default()
    };

    let cancellation = CancellationToken::new();
    let engine = ExecutionEngine::new(&catalog, options, cancellation);

    let mut all_files = Vec::new();
    for root in &paths {
        let walker = FileWalker::new(root, &include, &exclude)
            .map_err(|e| CoreError::Config(format!("failed to walk {}: {e}", root.display())))?;
        for entry in walker.walk() {
            match entry {
                Ok(entry) => all_files.push(entry),
                Err(e) => warn!(error = %e, "error while walking files"),
            }
        }
    }

    let mut summary = engine.execute(all_files, scan_unknown_extensions);
    if unique_tags_only {
        summary.matches = dedup_by_tag(summary.matches);
    }

    match format {
        OutputFormat::Human => {
            let formatter = HumanFormatter::new(color.into());
            formatter.write(&summary).map_err(CoreError::Io)?;
        }
        OutputFormat::Jsonl => {
            let formatter = JsonlFormatter::new();
            print!("{}", formatter.format(&summary));
        }
    }

    Ok(())
}

/// One witness per tag, across the entire scan — distinct from the
/// processor's per-file tag de-dup, which only suppresses repeats
/// within a single file (§4.6).
fn dedup_by_tag(matches: Vec<crate::model::MatchRecord>) -> Vec<crate::model::MatchRecord> {
    let mut seen = std::collections::HashSet::new();
    matches
        .into_iter()
        .filter(|m| {
            if m.tags.is_empty() {
                return true;
            }
            let all_seen = m.tags.iter().all(|t| seen.contains(t));
            if all_seen {
                false
            } else {
                seen.extend(m.tags.iter().cloned());
                true
            }
        })
        .collect()
}
