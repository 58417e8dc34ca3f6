//! Dump tool for the sift HTML tokenizer.
//!
//! Reads an HTML file, tokenizes it and prints the result.
//!
//! ## Usage
//!
//! ```bash
//! # Indented token tree
//! sift-dump page.html --output tree
//!
//! # Metadata and anomalies, with formatted words
//! sift-dump page.html --format-text --output summary
//!
//! # Full JSON with a parser config file and debug logs
//! sift-dump page.html --config parser.json --log-level debug
//! ```

use clap::{ArgAction, Parser};
use sift_common::{init_logging, CommonError, LogConfig, LogFormat};
use std::path::PathBuf;

mod dump;

use dump::OutputMode;

#[derive(Parser)]
#[command(name = "sift-dump")]
#[command(about = "Tokenize an HTML page and dump the tokens, tree or metadata")]
struct Cli {
    /// HTML file to tokenize
    file: PathBuf,

    /// Parser configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Decode entities and normalize punctuation in words
    #[arg(long)]
    format_text: bool,

    /// Keep every word fragment as its own token
    #[arg(long)]
    no_combine_words: bool,

    /// Also strip comments, noscript and doctype before tokenizing
    #[arg(long)]
    clean_fully: bool,

    /// Output mode
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputMode,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// More log detail with source locations (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Log filter directives, e.g. "sift_html=trace" (overrides RUST_LOG)
    #[arg(long)]
    log_filter: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn log_config(cli: &Cli) -> Result<LogConfig, CommonError> {
    let config = match cli.verbose {
        0 => LogConfig::default().with_level_name(&cli.log_level)?,
        1 => LogConfig::debug(),
        _ => LogConfig::trace(),
    };
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    let config = config.with_format(format);
    Ok(match cli.log_filter {
        Some(ref filter) => config.with_filter(filter.as_str()),
        None => config,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(log_config(&cli)?)?;

    let mut config = match cli.config {
        Some(ref path) => dump::load_config(path)?,
        None => sift_html::ParserConfig::default(),
    };
    // Flags only switch options on; a config file can still disable them.
    if cli.format_text {
        config = config.with_format_text(true);
    }
    if cli.no_combine_words {
        config = config.with_combine_words(false);
    }
    if cli.clean_fully {
        config = config.with_clean_fully(true);
    }

    let result = dump::parse_file(&cli.file, &config)?;
    println!("{}", dump::render(&result, cli.output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_log_level_flag() {
        let cli = Cli::parse_from(["sift-dump", "page.html", "--log-level", "info"]);
        let config = log_config(&cli).unwrap();
        assert_eq!(config.level, Level::INFO);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(!config.include_location);

        let cli = Cli::parse_from(["sift-dump", "page.html", "--log-level", "chatty"]);
        assert!(log_config(&cli).is_err());
    }

    #[test]
    fn test_verbose_presets() {
        let cli = Cli::parse_from(["sift-dump", "page.html", "-v"]);
        let config = log_config(&cli).unwrap();
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.include_location);

        let cli = Cli::parse_from(["sift-dump", "page.html", "-vv", "--json-logs"]);
        let config = log_config(&cli).unwrap();
        assert_eq!(config.level, Level::TRACE);
        assert!(config.include_span_events);
        assert_eq!(config.format, LogFormat::Json);
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::parse_from(["sift-dump", "page.html", "--log-filter", "sift_html=trace"]);
        let config = log_config(&cli).unwrap();
        assert_eq!(config.filter.as_deref(), Some("sift_html=trace"));
    }
}
