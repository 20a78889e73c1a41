#![forbid(unsafe_code)]

//! JSONL output formatter for machine-readable output.
//!
//! Outputs one JSON object per line: all match records in input order,
//! followed by one status record.

use crate::engine::ExecutionSummary;
use serde::Serialize;

pub struct JsonlFormatter;

impl JsonlFormatter {
    pub fn new() -> Self {
        JsonlFormatter
    }

    pub fn format(&self, summary: &ExecutionSummary) -> String {
        let mut output = String::new();

        for record in &summary.matches {
            if let Ok(json) = serde_json::to_string(record) {
                output.push_str(&json);
                output.push('\n');
            }
        }

        let status = StatusRecord {
            record_type: "status",
            files_scanned: summary.files_scanned as u64,
            files_skipped_unknown_language: summary.files_skipped_unknown_language as u64,
            files_timed_out: summary.files_timed_out as u64,
            total_matches: summary.matches.len() as u64,
        };
        if let Ok(json) = serde_json::to_string(&status) {
            output.push_str(&json);
            output.push('\n');
        }

        output
    }
}

impl Default for JsonlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
struct StatusRecord {
    #[serde(rename = "type")]
    record_type: &'static str,
    files_scanned: u64,
    files_skipped_unknown_language: u64,
    files_timed_out: u64,
    total_matches: u64,
}
