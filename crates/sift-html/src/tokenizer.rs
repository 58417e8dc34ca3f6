//! Fragment tokenizer and tree builder.
//!
//! Consumes a page that has been split on spaces and classifies each fragment
//! as the start of a tag, the continuation of a tag spread over several
//! fragments (comments, attributes), or a word. The implicit tree is built
//! in the same pass against an [`AncestorStack`].

use crate::config::ParserConfig;
use crate::entities;
use crate::metadata::MetadataCollector;
use crate::preprocess;
use crate::result::{Anomalies, ParseResult};
use crate::stack::{AncestorStack, CloseResolution};
use crate::token::{NodeInfo, Tag, Token, TokenId, Word, ROOT_ID};
use crate::{ParseError, Result};
use tracing::{debug, trace};

/// Tokenizer state for a single document.
pub struct Tokenizer<'c> {
    config: &'c ParserConfig,
    tokens: Vec<Token>,
    stack: AncestorStack,
    /// Position in `tokens` of a tag still waiting for its closing fragment.
    open_tag: Option<usize>,
    /// Word still collecting fragments when words are combined.
    pending_word: Option<Word>,
    next_id: TokenId,
    tag_pos: usize,
    num_tags: usize,
    num_words: usize,
    metadata: MetadataCollector,
    anomalies: Anomalies,
}

impl<'c> Tokenizer<'c> {
    pub fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            tokens: Vec::new(),
            stack: AncestorStack::new(),
            open_tag: None,
            pending_word: None,
            next_id: ROOT_ID + 1,
            tag_pos: 0,
            num_tags: 0,
            num_words: 0,
            metadata: MetadataCollector::new(),
            anomalies: Anomalies::default(),
        }
    }

    /// Tokenize a sequence of fragments.
    pub fn tokenize<'f, I>(mut self, fragments: I) -> ParseResult
    where
        I: IntoIterator<Item = &'f str>,
    {
        for fragment in fragments {
            self.process_fragment(fragment);
        }
        self.finish()
    }

    fn process_fragment(&mut self, fragment: &str) {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            return;
        }

        if let Some(index) = self.open_tag {
            self.continue_tag(index, fragment);
        } else if fragment.starts_with('<') {
            self.start_tag(fragment);
        } else {
            self.word(fragment);
        }
    }

    fn allocate_id(&mut self) -> TokenId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Id of the most recently created token, or the root if none exists.
    fn last_id(&self) -> TokenId {
        self.next_id - 1
    }

    fn node_mut(&mut self, id: TokenId) -> Option<&mut NodeInfo> {
        if id == ROOT_ID {
            return None;
        }
        self.tokens.get_mut(id - 1).map(Token::node_mut)
    }

    /// Record `child` under `parent`. Links to the root or to a parent that is
    /// not in the output list are skipped.
    fn link_child(&mut self, parent: TokenId, child: TokenId) {
        if parent == ROOT_ID {
            return;
        }
        match self.node_mut(parent) {
            Some(node) => node.children.push(child),
            None => trace!(parent, child, "parent not in token list, link skipped"),
        }
    }

    fn emit(&mut self, token: Token) {
        self.link_child(token.parent_id(), token.id());
        self.tokens.push(token);
    }

    fn start_tag(&mut self, fragment: &str) {
        let Some(mut tag) = Tag::from_fragment(fragment) else {
            debug!(fragment, "discarding fragment without element name");
            self.anomalies.discarded_fragments += 1;
            return;
        };

        self.flush_word();
        tag.token_pos = self.tag_pos;
        self.tag_pos += 1;

        if tag.is_end_tag() {
            self.end_tag(&tag);
            return;
        }

        let parent = self.stack.peek().id;
        let level = self.stack.level();
        let id = self.allocate_id();
        tag.node = NodeInfo::new(id, parent, level);
        self.num_tags += 1;

        let opens_scope = tag.is_opening && !self.config.ignores_parenting(&tag.short_tag);
        if opens_scope {
            self.stack.push(id, &tag.short_tag);
        } else {
            tag.node.end_index = Some(id);
        }
        trace!(id, parent, level, name = %tag.name, "tag");

        self.metadata.check_tag(&tag, opens_scope);
        let complete = tag.is_valid;
        self.emit(Token::Tag(tag));
        if !complete {
            self.open_tag = Some(self.tokens.len() - 1);
        }
    }

    fn end_tag(&mut self, tag: &Tag) {
        self.metadata.check_end_tag(&tag.short_tag);

        // The current parent is assumed to end before the next token.
        let next_id = self.next_id;
        let top = self.stack.peek().id;
        if let Some(node) = self.node_mut(top) {
            node.end_index = Some(next_id);
        }

        match self.stack.resolve_close(&tag.short_tag) {
            CloseResolution::Matched(popped) => {
                let last = self.last_id();
                for id in popped {
                    if let Some(node) = self.node_mut(id) {
                        node.end_index = Some(last);
                    }
                }
            }
            CloseResolution::Wild => {
                debug!(name = %tag.short_tag, token_pos = tag.token_pos, "wild close tag");
                self.anomalies.wild_closes.push(tag.short_tag.clone());
            }
        }
    }

    fn continue_tag(&mut self, index: usize, fragment: &str) {
        let Some(Token::Tag(tag)) = self.tokens.get_mut(index) else {
            self.open_tag = None;
            return;
        };
        trace!(html = %tag.html, fragment, "appending to tag");
        tag.append(fragment);

        let ignored = self.config.ignores_parenting(&tag.short_tag);
        if tag.is_inline_closing && !ignored && self.stack.pop_if_top(tag.node.id) {
            tag.node.end_index = Some(tag.node.id);
        }

        self.metadata.check_tag(tag, tag.is_opening && !ignored);
        if tag.is_valid {
            self.open_tag = None;
        }
    }

    fn word(&mut self, fragment: &str) {
        let text = if self.config.format_text {
            entities::format_word(fragment)
        } else {
            fragment.to_string()
        };
        if text.is_empty() {
            return;
        }

        self.num_words += 1;
        self.metadata.check_word(&text);

        if let Some(word) = self.pending_word.as_mut() {
            word.push_fragment(&text);
            return;
        }

        let parent = self.stack.peek().id;
        let level = self.stack.level();
        let word = Word::new(NodeInfo::new(self.allocate_id(), parent, level), text);
        trace!(id = word.node.id, parent, text = %word.text, "word");

        if self.config.combine_words {
            self.pending_word = Some(word);
        } else {
            self.emit(Token::Word(word));
        }
    }

    fn flush_word(&mut self) {
        if let Some(word) = self.pending_word.take() {
            self.emit(Token::Word(word));
        }
    }

    fn finish(mut self) -> ParseResult {
        self.flush_word();
        self.anomalies.unclosed = self.stack.open_ids();

        debug!(
            tokens = self.tokens.len(),
            tags = self.num_tags,
            words = self.num_words,
            wild_closes = self.anomalies.wild_closes.len(),
            unclosed = self.anomalies.unclosed.len(),
            "tokenized"
        );

        ParseResult::new(
            self.tokens,
            self.num_tags,
            self.num_words,
            self.metadata.finish(),
            self.anomalies,
        )
    }
}

/// Clean, split and tokenize a whole page.
pub fn tokenize(html: &str, config: &ParserConfig) -> Result<ParseResult> {
    if html.trim().is_empty() {
        return Err(ParseError::InvalidInput("empty html string".to_string()));
    }
    let cleaned = preprocess::clean_page(html, config.clean_fully);
    let fragments = preprocess::split_fragments(&cleaned);
    debug!(fragments = fragments.len(), "page split");
    Ok(Tokenizer::new(config).tokenize(fragments))
}

/// Tokenize fragments that were already cleaned and split.
pub fn tokenize_fragments<'f, I>(fragments: I, config: &ParserConfig) -> ParseResult
where
    I: IntoIterator<Item = &'f str>,
{
    Tokenizer::new(config).tokenize(fragments)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fragments: &[&str]) -> ParseResult {
        tokenize_fragments(fragments.iter().copied(), &ParserConfig::default())
    }

    fn tag(result: &ParseResult, id: TokenId) -> &Tag {
        result.get(id).and_then(Token::as_tag).unwrap()
    }

    #[test]
    fn test_ids_increase_in_document_order() {
        let result = run(&["<div>", "a", "<p>", "b", "c", "</p>", "<br>", "d", "</div>"]);
        let ids: Vec<TokenId> = result.tokens().iter().map(Token::id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_well_formed_nesting() {
        let result = run(&["<div>", "<p>", "text", "</p>", "<span>", "x", "</span>", "</div>"]);
        let div = tag(&result, 1);
        assert_eq!(div.node.children, vec![2, 4]);
        assert_eq!(div.node.end_index, Some(5));

        let p = tag(&result, 2);
        assert_eq!(p.node.parent_id, 1);
        assert_eq!(p.node.level, 1);
        assert_eq!(p.node.children, vec![3]);
        assert_eq!(p.node.end_index, Some(3));

        let word = result.get(3).unwrap();
        assert_eq!(word.parent_id(), 2);
        assert_eq!(word.level(), 2);
        assert!(result.anomalies().is_empty());
    }

    #[test]
    fn test_close_pops_orphans() {
        let result = run(&["<div>", "<b>", "<i>", "x", "</div>", "y"]);
        assert_eq!(tag(&result, 1).node.end_index, Some(4));
        assert_eq!(tag(&result, 2).node.end_index, Some(4));
        assert_eq!(tag(&result, 3).node.end_index, Some(4));
        // After the close, new tokens hang off the root again.
        assert_eq!(result.get(5).unwrap().parent_id(), ROOT_ID);
        assert!(result.anomalies().unclosed.is_empty());
    }

    #[test]
    fn test_wild_close() {
        let result = run(&["<p>", "word", "</div>", "more"]);
        assert_eq!(result.num_tags(), 1);
        assert!(result
            .tokens()
            .iter()
            .all(|t| t.as_tag().map_or(true, |tag| tag.short_tag != "div")));
        assert_eq!(result.anomalies().wild_closes, vec!["div"]);
        assert_eq!(result.anomalies().unclosed, vec![1]);
        // The end tag still breaks the word, and <p> stays the parent.
        assert_eq!(result.get(2).unwrap().html(), "word");
        assert_eq!(result.get(3).unwrap().parent_id(), 1);
        assert_eq!(tag(&result, 1).node.children, vec![2, 3]);
    }

    #[test]
    fn test_void_and_self_closing_never_parent() {
        let result = run(&["<p>", "<br>", "<img", "src=\"x\"/>", "a", "</p>"]);
        let br = tag(&result, 2);
        assert_eq!(br.node.end_index, Some(2));
        let img = tag(&result, 3);
        assert_eq!(img.node.end_index, Some(3));
        assert!(img.is_inline_closing);
        assert_eq!(img.html, "<img src=\"x\"/>");
        let word = result.get(4).unwrap();
        assert_eq!(word.parent_id(), 1);
        assert_eq!(tag(&result, 1).node.children, vec![2, 3, 4]);
    }

    #[test]
    fn test_speculative_push_retracted() {
        let config = ParserConfig::default().with_ignore_parenting(Vec::<String>::new());
        let result = tokenize_fragments(["<widget", "a=\"1\"", "/>", "after"], &config);
        let widget = tag(&result, 1);
        assert!(widget.is_inline_closing);
        assert_eq!(widget.name, "<widget/>");
        assert_eq!(widget.node.end_index, Some(1));
        assert_eq!(result.get(2).unwrap().parent_id(), ROOT_ID);
        assert!(result.anomalies().unclosed.is_empty());
    }

    #[test]
    fn test_split_comment_is_one_tag() {
        let result = run(&["<!--", "comment", "text", "-->"]);
        assert_eq!(result.num_tokens(), 1);
        assert_eq!(result.num_tags(), 1);
        assert_eq!(result.num_words(), 0);
        let comment = tag(&result, 1);
        assert_eq!(comment.html, "<!-- comment text -->");
        assert!(comment.is_valid);
        assert_eq!(comment.short_tag, "!--");
    }

    #[test]
    fn test_combine_words() {
        let result = run(&["<p>", "Hello", "World", "</p>"]);
        let words: Vec<&str> = result
            .tokens()
            .iter()
            .filter_map(Token::as_word)
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(words, vec!["Hello World"]);
        assert_eq!(result.num_words(), 2);
    }

    #[test]
    fn test_separate_words() {
        let config = ParserConfig::default().with_combine_words(false);
        let result = tokenize_fragments(["<p>", "Hello", "World", "</p>"], &config);
        let words: Vec<&str> = result
            .tokens()
            .iter()
            .filter_map(Token::as_word)
            .map(|w| w.text.as_str())
            .collect();
        assert_eq!(words, vec!["Hello", "World"]);
        assert_eq!(tag(&result, 1).node.children, vec![2, 3]);
        assert_eq!(tag(&result, 1).node.end_index, Some(3));
    }

    #[test]
    fn test_top_level_self_closing() {
        let result = run(&["<br/>", "<br/>", "<br/>"]);
        assert_eq!(result.num_tags(), 3);
        for token in result.tokens() {
            assert_eq!(token.parent_id(), ROOT_ID);
            assert_eq!(token.level(), 0);
            assert!(token.children().is_empty());
        }
    }

    #[test]
    fn test_discarded_fragment() {
        let result = run(&["<p>", "a", "<", "b", "</p>"]);
        assert_eq!(result.anomalies().discarded_fragments, 1);
        assert_eq!(result.num_tokens(), 2);
        assert_eq!(result.get(2).unwrap().html(), "a b");
    }

    #[test]
    fn test_token_positions_count_end_tags() {
        let result = run(&["<p>", "a", "</p>", "<p>", "b", "</p>"]);
        assert_eq!(tag(&result, 1).token_pos, 0);
        assert_eq!(tag(&result, 3).token_pos, 2);
    }

    #[test]
    fn test_format_text() {
        let config = ParserConfig::default().with_format_text(true);
        let result = tokenize_fragments(["<p>", "don&rsquo;t", "&nbsp;", "stop", "</p>"], &config);
        assert_eq!(result.text(), "don't stop");
        assert_eq!(result.num_words(), 2);
    }

    #[test]
    fn test_optimistic_end_on_wild_close() {
        let result = run(&["<p>", "a", "</div>"]);
        assert_eq!(tag(&result, 1).node.end_index, Some(3));
    }

    #[test]
    fn test_tokenize_rejects_blank() {
        assert!(matches!(
            tokenize("   ", &ParserConfig::default()),
            Err(ParseError::InvalidInput(_))
        ));
    }
}
