//! The immutable output of one tokenize call.

use crate::metadata::{Author, Metadata};
use crate::token::{Token, TokenId, ROOT_ID};
use chrono::NaiveDate;
use serde::Serialize;

/// Structural problems the tokenizer recovered from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Anomalies {
    /// End tags with no matching open ancestor, in document order.
    pub wild_closes: Vec<String>,
    /// Elements never closed, outermost first.
    pub unclosed: Vec<TokenId>,
    /// Tag-like fragments without an element name.
    pub discarded_fragments: usize,
}

impl Anomalies {
    pub fn is_empty(&self) -> bool {
        self.wild_closes.is_empty() && self.unclosed.is_empty() && self.discarded_fragments == 0
    }
}

/// Tokens, counts and metadata of a parsed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    tokens: Vec<Token>,
    num_tags: usize,
    num_tokens: usize,
    num_words: usize,
    metadata: Metadata,
    anomalies: Anomalies,
}

impl ParseResult {
    pub(crate) fn new(
        tokens: Vec<Token>,
        num_tags: usize,
        num_words: usize,
        metadata: Metadata,
        anomalies: Anomalies,
    ) -> Self {
        let num_tokens = tokens.len();
        Self {
            tokens,
            num_tags,
            num_tokens,
            num_words,
            metadata,
            anomalies,
        }
    }

    /// All tokens in document order.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Look a token up by id.
    pub fn get(&self, id: TokenId) -> Option<&Token> {
        if id == ROOT_ID {
            return None;
        }
        self.tokens.get(id - 1).filter(|token| token.id() == id)
    }

    /// Child tokens of `id`, in document order.
    pub fn children_of(&self, id: TokenId) -> impl Iterator<Item = &Token> + '_ {
        self.get(id)
            .map(|token| token.children())
            .unwrap_or_default()
            .iter()
            .filter_map(move |child| self.get(*child))
    }

    /// Tokens directly under the synthetic root.
    pub fn roots(&self) -> impl Iterator<Item = &Token> + '_ {
        self.tokens.iter().filter(|token| token.node().is_top_level())
    }

    /// Number of tag tokens created.
    pub fn num_tags(&self) -> usize {
        self.num_tags
    }

    pub fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// Number of word fragments consumed.
    pub fn num_words(&self) -> usize {
        self.num_words
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    pub fn author_names(&self) -> &[String] {
        &self.metadata.author_names
    }

    pub fn authors(&self) -> &[Author] {
        &self.metadata.authors
    }

    pub fn byline(&self) -> Option<&str> {
        self.metadata.byline.as_deref()
    }

    pub fn publish_date(&self) -> Option<NaiveDate> {
        self.metadata.publish_date
    }

    pub fn anomalies(&self) -> &Anomalies {
        &self.anomalies
    }

    /// Text of all words joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .filter_map(Token::as_word)
            .map(|word| word.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{NodeInfo, Tag, Word};

    fn sample() -> ParseResult {
        let mut tag = Tag::from_fragment("<p>").unwrap();
        tag.node = NodeInfo::new(1, ROOT_ID, 0);
        tag.node.children.push(2);
        let word = Word::new(NodeInfo::new(2, 1, 1), "hello");
        ParseResult::new(
            vec![Token::Tag(tag), Token::Word(word)],
            1,
            1,
            Metadata::default(),
            Anomalies::default(),
        )
    }

    #[test]
    fn test_counts() {
        let result = sample();
        assert_eq!(result.num_tokens(), 2);
        assert_eq!(result.num_tags(), 1);
        assert_eq!(result.num_words(), 1);
        assert!(result.anomalies().is_empty());
    }

    #[test]
    fn test_lookup() {
        let result = sample();
        assert_eq!(result.get(ROOT_ID), None);
        assert_eq!(result.get(2).map(Token::html), Some("hello"));
        assert_eq!(result.get(3), None);
        let children: Vec<_> = result.children_of(1).map(Token::id).collect();
        assert_eq!(children, vec![2]);
        assert_eq!(result.children_of(2).count(), 0);
        assert_eq!(result.roots().map(Token::id).collect::<Vec<_>>(), vec![1]);
        assert_eq!(result.text(), "hello");
    }
}
