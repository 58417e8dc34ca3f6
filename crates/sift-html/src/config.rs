//! Tokenizer configuration

use crate::{ParseError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Elements that never open a nesting scope by default: the HTML void
/// elements plus comments and doctype declarations.
pub const DEFAULT_IGNORE_PARENTING: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr", "!--", "!doctype",
];

/// Tokenizer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Decode entities and normalize punctuation in words as they are created
    pub format_text: bool,

    /// Merge adjacent word fragments into a single word token
    pub combine_words: bool,

    /// Also strip comments, noscript bodies and doctype during preprocessing
    pub clean_fully: bool,

    /// Tag names that are never pushed onto the ancestor stack
    pub ignore_parenting: BTreeSet<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            format_text: false,
            combine_words: true,
            clean_fully: false,
            ignore_parenting: DEFAULT_IGNORE_PARENTING
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }
}

impl ParserConfig {
    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: ParserConfig = serde_json::from_str(json)?;
        config.ignore_parenting = normalize_names(config.ignore_parenting)?;
        Ok(config)
    }

    pub fn with_format_text(mut self, enabled: bool) -> Self {
        self.format_text = enabled;
        self
    }

    pub fn with_combine_words(mut self, enabled: bool) -> Self {
        self.combine_words = enabled;
        self
    }

    pub fn with_clean_fully(mut self, enabled: bool) -> Self {
        self.clean_fully = enabled;
        self
    }

    /// Replace the ignore-parenting set. Names are lowercased.
    pub fn with_ignore_parenting<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignore_parenting = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        self
    }

    /// Whether `short_tag` never opens a scope. Declarations (`<!…>`) and
    /// processing instructions (`<?…?>`) never do, whatever the set holds.
    pub fn ignores_parenting(&self, short_tag: &str) -> bool {
        if short_tag.starts_with(['!', '?']) {
            return true;
        }
        if short_tag.bytes().any(|b| b.is_ascii_uppercase()) {
            self.ignore_parenting
                .contains(&short_tag.to_ascii_lowercase())
        } else {
            self.ignore_parenting.contains(short_tag)
        }
    }
}

fn normalize_names(names: BTreeSet<String>) -> Result<BTreeSet<String>> {
    let mut normalized = BTreeSet::new();
    for name in names {
        let name = name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(ParseError::Config(format!(
                "invalid ignore_parenting entry: {:?}",
                name
            )));
        }
        normalized.insert(name.to_ascii_lowercase());
    }
    Ok(normalized)
}
