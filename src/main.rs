//! scanalyze CLI entry point.

use clap::Parser;
use scanalyze::cli::{Cli, Command};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Scan {
            paths,
            rules,
            format,
            min_confidence,
            context,
            jobs,
            unique_tags_only,
            scan_unknown_extensions,
            file_timeout_ms,
            include,
            exclude,
        } => scanalyze::cli::scan::run(
            paths,
            rules,
            format,
            cli.color,
            min_confidence,
            context,
            jobs,
            unique_tags_only,
            scan_unknown_extensions,
            file_timeout_ms,
            include,
            exclude,
        ),
        Command::ListRules { rules, format } => scanalyze::cli::list_rules::run(rules, format),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
