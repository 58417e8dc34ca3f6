//! Load a page, tokenize it and render the result.

use std::fmt::Write as _;
use std::path::Path;

use sift_html::{ParseResult, ParserConfig, Token};

/// How the parse result is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    /// Full result as pretty-printed JSON.
    Json,
    /// Indented token tree.
    Tree,
    /// Counts, metadata and anomalies.
    Summary,
}

/// Error type for dump operations.
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] sift_html::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<String, DumpError> {
    std::fs::read_to_string(path).map_err(|source| DumpError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Load a parser configuration from a JSON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<ParserConfig, DumpError> {
    let json = read(path.as_ref())?;
    Ok(ParserConfig::from_json(&json)?)
}

/// Tokenize an HTML file.
pub fn parse_file(path: impl AsRef<Path>, config: &ParserConfig) -> Result<ParseResult, DumpError> {
    let path = path.as_ref();
    let html = read(path)?;
    tracing::debug!(path = %path.display(), bytes = html.len(), "read page");
    Ok(sift_html::tokenize(&html, config)?)
}

/// Render a parse result in the requested mode.
pub fn render(result: &ParseResult, mode: OutputMode) -> Result<String, DumpError> {
    match mode {
        OutputMode::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputMode::Tree => Ok(render_tree(result)),
        OutputMode::Summary => Ok(render_summary(result)),
    }
}

/// One line per token, indented by level.
pub fn render_tree(result: &ParseResult) -> String {
    let mut out = String::new();
    for token in result.tokens() {
        let indent = "  ".repeat(token.level());
        let _ = match token {
            Token::Tag(tag) => match tag.node.end_index {
                Some(end) if end != tag.node.id => {
                    writeln!(out, "{}{} #{}..{}", indent, tag.name, tag.node.id, end)
                }
                Some(_) => writeln!(out, "{}{} #{}", indent, tag.name, tag.node.id),
                None => writeln!(out, "{}{} #{} (unclosed)", indent, tag.name, tag.node.id),
            },
            Token::Word(word) => writeln!(out, "{}\"{}\" #{}", indent, word.text, word.node.id),
        };
    }
    out
}

/// Counts, metadata and anomalies as aligned text.
pub fn render_summary(result: &ParseResult) -> String {
    let mut out = String::new();
    let anomalies = result.anomalies();
    let _ = writeln!(out, "Tokens:       {}", result.num_tokens());
    let _ = writeln!(out, "Tags:         {}", result.num_tags());
    let _ = writeln!(out, "Words:        {}", result.num_words());
    let _ = writeln!(out, "Top level:    {}", result.roots().count());
    let _ = writeln!(out, "Title:        {}", result.title().unwrap_or("-"));
    let _ = writeln!(out, "Authors:      {}", join_or_dash(result.author_names()));
    let _ = writeln!(out, "Byline:       {}", result.byline().unwrap_or("-"));
    let _ = writeln!(
        out,
        "Published:    {}",
        result
            .publish_date()
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    let _ = writeln!(out, "Wild closes:  {}", join_or_dash(&anomalies.wild_closes));
    let _ = writeln!(out, "Unclosed:     {}", anomalies.unclosed.len());
    let _ = writeln!(out, "Discarded:    {}", anomalies.discarded_fragments);
    out
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
