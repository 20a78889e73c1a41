#![forbid(unsafe_code)]

//! Human-readable console formatter: one colorized block per match,
//! severity-tinted, followed by a summary line.

use crate::engine::ExecutionSummary;
use crate::model::MatchRecord;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

pub struct HumanFormatter {
    color_choice: ColorChoice,
}

impl HumanFormatter {
    pub fn new(color_choice: ColorChoice) -> Self {
        Self { color_choice }
    }

    pub fn write(&self, summary: &ExecutionSummary) -> std::io::Result<()> {
        let mut stream = StandardStream::stdout(self.color_choice);
        for record in &summary.matches {
            self.write_record(&mut stream, record)?;
        }
        self.write_summary(&mut stream, summary)
    }

    fn write_record(&self, stream: &mut StandardStream, record: &MatchRecord) -> std::io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(Some(severity_color(&record.severity))).set_bold(true))?;
        write!(stream, "[{}] ", record.severity)?;
        stream.reset()?;
        writeln!(
            stream,
            "{} — {} ({}:{}:{})",
            record.rule_id,
            record.rule_name,
            record.file.display(),
            record.start.line,
            record.start.column
        )?;

        stream.set_color(ColorSpec::new().set_dimmed(true))?;
        writeln!(stream, "    {}", record.rule_description)?;
        stream.reset()?;

        writeln!(stream, "    matched: {:?}  confidence: {}  tags: {}", record.sample, record.confidence, record.tags.join(", "))?;

        if let Some(excerpt) = &record.excerpt {
            for line in excerpt.lines() {
                writeln!(stream, "    | {line}")?;
            }
        }
        writeln!(stream)
    }

    fn write_summary(&self, stream: &mut StandardStream, summary: &ExecutionSummary) -> std::io::Result<()> {
        stream.set_color(ColorSpec::new().set_bold(true))?;
        writeln!(
            stream,
            "{} match(es) across {} file(s) scanned ({} skipped, {} timed out)",
            summary.matches.len(),
            summary.files_scanned,
            summary.files_skipped_unknown_language,
            summary.files_timed_out
        )?;
        stream.reset()
    }
}

fn severity_color(severity: &str) -> Color {
    match severity {
        "critical" => Color::Red,
        "important" => Color::Yellow,
        "moderate" => Color::Cyan,
        "best-practice" => Color::Green,
        _ => Color::White,
    }
}
