//! CLI argument parsing using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Jsonl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Auto,
    Always,
    Never,
}

impl From<ColorChoice> for termcolor::ColorChoice {
    fn from(value: ColorChoice) -> Self {
        match value {
            ColorChoice::Auto => termcolor::ColorChoice::Auto,
            ColorChoice::Always => termcolor::ColorChoice::Always,
            ColorChoice::Never => termcolor::ColorChoice::Never,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// scanalyze CLI main entry point.
#[derive(Parser, Debug)]
#[command(name = "scanalyze")]
#[command(about = "Declarative rules engine for scanning source code")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan files or directories for rule matches.
    Scan {
        /// Paths to scan (defaults to current directory).
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Directory of rule JSON documents.
        #[arg(long)]
        rules: PathBuf,

        /// Output format.
        #[arg(short, long, default_value = "human")]
        format: OutputFormat,

        /// Minimum confidence levels to report (repeatable).
        #[arg(long = "min-confidence", value_enum, default_values_t = [ConfidenceLevel::Medium, ConfidenceLevel::High])]
        min_confidence: Vec<ConfidenceLevel>,

        /// Lines of excerpt on either side of a match; -1 disables excerpts.
        #[arg(long, default_value_t = 3, allow_negative_numbers = true)]
        context: i32,

        /// Number of parallel worker threads; 0 uses rayon's default.
        #[arg(long, default_value_t = 0)]
        jobs: usize,

        /// Only emit one match per tag, across the whole scan.
        #[arg(long)]
        unique_tags_only: bool,

        /// Scan files with unrecognized extensions as plain code instead of skipping them.
        #[arg(long)]
        scan_unknown_extensions: bool,

        /// Abort a single file's analysis after this many milliseconds.
        #[arg(long)]
        file_timeout_ms: Option<u64>,

        /// Glob patterns to include (defaults to everything not excluded).
        #[arg(long = "include")]
        include: Vec<String>,

        /// Glob patterns to exclude, in addition to `.gitignore`.
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },

    /// List the rules a given directory would load, with any violations found while compiling them.
    ListRules {
        #[arg(long)]
        rules: PathBuf,

        #[arg(short, long, default_value = "human")]
        format: OutputFormat,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_defaults() {
        let cli = Cli::parse_from(["scanalyze", "scan", "--rules", "rules/"]);
        match cli.command {
            Command::Scan { paths, rules, format, context, .. } => {
                assert_eq!(paths, vec![PathBuf::from(".")]);
                assert_eq!(rules, PathBuf::from("rules/"));
                assert_eq!(format, OutputFormat::Human);
                assert_eq!(context, 3);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn scan_accepts_multiple_paths_and_jsonl_format() {
        let cli = Cli::parse_from([
            "scanalyze", "scan", "src/", "tests/", "--rules", "rules/", "--format", "jsonl",
        ]);
        match cli.command {
            Command::Scan { paths, format, .. } => {
                assert_eq!(paths, vec![PathBuf::from("src/"), PathBuf::from("tests/")]);
                assert_eq!(format, OutputFormat::Jsonl);
            }
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn scan_accepts_negative_context() {
        let cli = Cli::parse_from(["scanalyze", "scan", "--rules", "rules/", "--context", "-1"]);
        match cli.command {
            Command::Scan { context, .. } => assert_eq!(context, -1),
            _ => panic!("expected Scan command"),
        }
    }

    #[test]
    fn global_color_flag_precedes_subcommand() {
        let cli = Cli::parse_from(["scanalyze", "--color", "always", "scan", "--rules", "rules/"]);
        assert_eq!(cli.color, ColorChoice::Always);
    }

    #[test]
    fn list_rules_requires_rules_dir() {
        let result = Cli::try_parse_from(["scanalyze", "list-rules"]);
        assert!(result.is_err());
    }
}
