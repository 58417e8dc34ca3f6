//! # Sift HTML
//!
//! Fault-tolerant tokenizer for real-world HTML.
//!
//! The page is normalized and split on spaces into fragments. Each fragment
//! is classified as the start of a tag, the continuation of a tag that spans
//! several fragments, or a word. While tokens are produced an implicit tree is
//! built against a stack of open ancestors, and document metadata (title,
//! authors, byline, publish date) is collected on the side.
//!
//! ```
//! use sift_html::{tokenize, ParserConfig};
//!
//! let result = tokenize("<p>Hello <b>World</b></p>", &ParserConfig::default()).unwrap();
//! assert_eq!(result.num_tags(), 2);
//! ```

pub mod config;
pub mod entities;
pub mod metadata;
pub mod preprocess;
pub mod result;
pub mod stack;
pub mod token;
pub mod tokenizer;

use thiserror::Error;

pub use config::ParserConfig;
pub use metadata::{Author, AuthorSource, Metadata};
pub use result::{Anomalies, ParseResult};
pub use token::{NodeInfo, Tag, Token, TokenId, Word, ROOT_ID};
pub use tokenizer::{tokenize, tokenize_fragments, Tokenizer};

/// Errors that can occur while tokenizing a page.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for tokenizer operations.
pub type Result<T> = std::result::Result<T, ParseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_parse() {
        let result = tokenize("<html><body><p>Hello</p></body></html>", &ParserConfig::default())
            .unwrap();
        assert_eq!(result.num_tags(), 3);
        assert_eq!(result.num_words(), 1);
    }

    #[test]
    fn test_empty_html() {
        let err = tokenize("", &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidInput(_)));
    }

    #[test]
    fn test_whitespace_only_html() {
        let err = tokenize(" \n\t ", &ParserConfig::default()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidInput(_)));
    }

    #[test]
    fn test_error_display() {
        let err = ParseError::Config("bad".into());
        assert_eq!(err.to_string(), "Configuration error: bad");
    }
}
