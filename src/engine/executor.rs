#![forbid(unsafe_code)]

//! Execution Engine — coordinates rule catalog, file walker and rule
//! processor to analyze a set of discovered files in parallel.

use crate::catalog::RuleCatalog;
use crate::engine::file_walker::FileEntry;
use crate::model::MatchRecord;
use crate::processor::{analyze_file, CancellationToken, FileStatus, ProcessorOptions};
use rayon::prelude::*;
use std::fs;
use std::sync::Mutex;
use tracing::warn;

/// Aggregate counters across a whole `scan` invocation.
#[derive(Debug, Default)]
pub struct ExecutionSummary {
    pub files_scanned: usize,
    pub files_skipped_unknown_language: usize,
    pub files_timed_out: usize,
    pub matches: Vec<MatchRecord>,
}

/// Orchestrates parallel per-file analysis over a discovered file set.
///
/// Rule evaluation within a file is sequential (§5); only the
/// across-file fan-out is parallel, via rayon when
/// `options.parallel` is set.
pub struct ExecutionEngine<'a> {
    catalog: &'a RuleCatalog,
    options: ProcessorOptions,
    cancellation: CancellationToken,
}

impl<'a> ExecutionEngine<'a> {
    pub fn new(catalog: &'a RuleCatalog, options: ProcessorOptions, cancellation: CancellationToken) -> Self {
        Self {
            catalog,
            options,
            cancellation,
        }
    }

    pub fn execute(&self, files: Vec<FileEntry>, treat_unknown_as_code: bool) -> ExecutionSummary {
        let total = files.len();
        let eligible: Vec<FileEntry> = files
            .into_iter()
            .filter(|f| f.language_known || treat_unknown_as_code)
            .collect();
        let skipped = total - eligible.len();

        let summary = Mutex::new(ExecutionSummary {
            files_skipped_unknown_language: skipped,
            ..Default::default()
        });

        let run_one = |file: &FileEntry| {
            if self.cancellation.is_cancelled() {
                return;
            }
            let content = match fs::read_to_string(&file.path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "failed to read file, skipping");
                    return;
                }
            };

            let analysis = analyze_file(
                &content,
                &file.path,
                &file.language,
                self.catalog,
                &self.options,
                None,
                &self.cancellation,
            );

            let mut guard = summary.lock().expect("summary mutex poisoned");
            guard.files_scanned += 1;
            if analysis.status == FileStatus::TimedOut {
                guard.files_timed_out += 1;
            }
            guard.matches.extend(analysis.matches);
        };

        if self.options.parallel {
            eligible.par_iter().for_each(run_one);
        } else {
            eligible.iter().for_each(run_one);
        }

        summary.into_inner().expect("summary mutex poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::load_rules;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_rule(dir: &std::path::Path, name: &str, json: &str) {
        let mut file = std::fs::File::create(dir.join(name)).unwrap();
        file.write_all(json.as_bytes()).unwrap();
    }

    #[test]
    fn execute_scans_eligible_files_and_collects_matches() {
        let rules_dir = tempdir().unwrap();
        write_rule(
            rules_dir.path(),
            "r.json",
            r#"{
                "id": "t1", "description": "d", "severity": "moderate",
                "patterns": [{"pattern": "danger", "type": "substring", "confidence": "high"}]
            }"#,
        );
        let (catalog, _) = load_rules(rules_dir.path()).unwrap();

        let files_dir = tempdir().unwrap();
        let path = files_dir.path().join("a.rs");
        std::fs::write(&path, "let x = danger();").unwrap();
        let unknown_path = files_dir.path().join("a.bin");
        std::fs::write(&unknown_path, "danger").unwrap();

        let engine = ExecutionEngine::new(&catalog, ProcessorOptions::default(), CancellationToken::new());
        let files = vec![FileEntry::new(path), FileEntry::new(unknown_path)];
        let summary = engine.execute(files, false);

        assert_eq!(summary.files_scanned, 1);
        assert_eq!(summary.matches.len(), 1);
    }

    #[test]
    fn cancellation_stops_further_file_processing() {
        let rules_dir = tempdir().unwrap();
        write_rule(
            rules_dir.path(),
            "r.json",
            r#"{
                "id": "t1", "description": "d", "severity": "moderate",
                "patterns": [{"pattern": "danger", "type": "substring", "confidence": "high"}]
            }"#,
        );
        let (catalog, _) = load_rules(rules_dir.path()).unwrap();

        let files_dir = tempdir().unwrap();
        let path = files_dir.path().join("a.rs");
        std::fs::write(&path, "danger").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let engine = ExecutionEngine::new(&catalog, ProcessorOptions::default(), token);
        let summary = engine.execute(vec![FileEntry::new(path)], false);

        assert_eq!(summary.files_scanned, 0);
    }
}
