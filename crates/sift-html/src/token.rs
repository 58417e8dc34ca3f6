//! Token model.
//!
//! Every token is either a [`Tag`] or a [`Word`]; both carry a [`NodeInfo`]
//! with their identity and position in the implicit tree.

use crate::entities;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

/// Identifier of a token. Ids start at 1; 0 is the synthetic root.
pub type TokenId = usize;

/// Id of the synthetic root that parents every top-level token.
pub const ROOT_ID: TokenId = 0;

lazy_static! {
    static ref ATTRIBUTE: Regex = Regex::new(
        r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'<>`]+)))?"#
    )
    .expect("attribute pattern is valid");
}

/// Identity and tree position shared by tags and words.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeInfo {
    pub id: TokenId,
    pub parent_id: TokenId,
    pub level: usize,
    pub children: Vec<TokenId>,
    pub start_index: TokenId,
    /// Id of the last token created under this one, once it is closed.
    pub end_index: Option<TokenId>,
}

impl NodeInfo {
    pub fn new(id: TokenId, parent_id: TokenId, level: usize) -> Self {
        Self {
            id,
            parent_id,
            level,
            children: Vec::new(),
            start_index: id,
            end_index: None,
        }
    }

    /// Whether this node hangs directly off the synthetic root.
    pub fn is_top_level(&self) -> bool {
        self.parent_id == ROOT_ID
    }
}

/// An HTML tag, possibly accumulated from several fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    #[serde(flatten)]
    pub node: NodeInfo,
    /// Canonical rendered form: `<name>` or `<name/>`.
    pub name: String,
    /// Raw accumulated markup.
    pub html: String,
    pub short_tag: String,
    pub is_opening: bool,
    pub is_inline_closing: bool,
    pub is_valid: bool,
    /// Position among all tag occurrences, end tags included.
    pub token_pos: usize,
}

impl Tag {
    /// Build a candidate tag from a raw fragment.
    ///
    /// Returns `None` when no element name can be derived (`<`, `</>`, `<3`).
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let short_tag = short_tag_of(fragment);
        if short_tag.is_empty() {
            return None;
        }
        let mut tag = Self {
            node: NodeInfo::new(ROOT_ID, ROOT_ID, 0),
            name: String::new(),
            html: fragment.to_string(),
            short_tag,
            is_opening: false,
            is_inline_closing: false,
            is_valid: false,
            token_pos: 0,
        };
        tag.refresh();
        Some(tag)
    }

    /// Whether this is an end tag (`</name>`).
    pub fn is_end_tag(&self) -> bool {
        self.html.starts_with("</")
    }

    pub fn is_comment(&self) -> bool {
        self.html.starts_with("<!--")
    }

    /// Append a continuation fragment and recompute the flags.
    pub(crate) fn append(&mut self, fragment: &str) {
        self.html.push(' ');
        self.html.push_str(fragment);
        self.refresh();
    }

    /// Render the canonical name from the current flags.
    pub fn rendered_name(&self) -> String {
        if self.is_inline_closing {
            format!("<{}/>", self.short_tag)
        } else if self.is_opening {
            format!("<{}>", self.short_tag)
        } else {
            format!("</{}>", self.short_tag)
        }
    }

    fn refresh(&mut self) {
        let end_tag = self.is_end_tag();
        self.is_inline_closing = !end_tag && !self.is_comment() && self.html.ends_with("/>");
        self.is_opening = !end_tag && !self.is_inline_closing;
        self.is_valid = is_complete(&self.html);
        self.name = self.rendered_name();
    }

    /// Parsed attributes in source order. Names are lowercased and values
    /// entity-decoded; valueless attributes map to an empty string.
    pub fn attributes(&self) -> Vec<(String, String)> {
        if self.is_comment() || self.is_end_tag() {
            return Vec::new();
        }
        let body = self.html.trim_start_matches('<');
        let body = match body.find(|c: char| c.is_whitespace()) {
            Some(pos) => &body[pos..],
            None => return Vec::new(),
        };
        let body = body.trim_end_matches('>').trim_end_matches('/');

        ATTRIBUTE
            .captures_iter(body)
            .map(|caps| {
                let name = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .or_else(|| caps.get(4))
                    .map(|m| entities::decode(m.as_str()))
                    .unwrap_or_default();
                (name, value)
            })
            .collect()
    }

    /// Value of the first attribute called `name`.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.attributes()
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }
}

/// A run of text between tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Word {
    #[serde(flatten)]
    pub node: NodeInfo,
    pub text: String,
}

impl Word {
    pub fn new(node: NodeInfo, text: impl Into<String>) -> Self {
        Self {
            node,
            text: text.into(),
        }
    }

    /// Merge another fragment into this word.
    pub(crate) fn push_fragment(&mut self, fragment: &str) {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(fragment);
    }
}

/// A token in the output list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Token {
    Tag(Tag),
    Word(Word),
}

impl Token {
    pub fn node(&self) -> &NodeInfo {
        match self {
            Token::Tag(tag) => &tag.node,
            Token::Word(word) => &word.node,
        }
    }

    pub(crate) fn node_mut(&mut self) -> &mut NodeInfo {
        match self {
            Token::Tag(tag) => &mut tag.node,
            Token::Word(word) => &mut word.node,
        }
    }

    pub fn id(&self) -> TokenId {
        self.node().id
    }

    pub fn parent_id(&self) -> TokenId {
        self.node().parent_id
    }

    pub fn level(&self) -> usize {
        self.node().level
    }

    pub fn children(&self) -> &[TokenId] {
        &self.node().children
    }

    pub fn end_index(&self) -> Option<TokenId> {
        self.node().end_index
    }

    /// Raw markup of a tag, or the text of a word.
    pub fn html(&self) -> &str {
        match self {
            Token::Tag(tag) => &tag.html,
            Token::Word(word) => &word.text,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Token::Tag(tag) => Some(tag),
            Token::Word(_) => None,
        }
    }

    pub fn as_word(&self) -> Option<&Word> {
        match self {
            Token::Word(word) => Some(word),
            Token::Tag(_) => None,
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Token::Tag(_))
    }
}

/// Lowercase element name of a raw fragment, or an empty string.
pub fn short_tag_of(fragment: &str) -> String {
    let Some(rest) = fragment.strip_prefix('<') else {
        return String::new();
    };
    if rest.starts_with("!--") {
        return "!--".to_string();
    }
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    let starts_like_name = rest
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '!' || c == '?');
    if !starts_like_name {
        return String::new();
    }
    rest.chars()
        .take_while(|&c| !c.is_whitespace() && c != '>' && c != '/' && c != '<')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Whether the accumulated markup forms a complete tag.
fn is_complete(html: &str) -> bool {
    if html.starts_with("<!--") {
        return html.len() >= "<!---->".len() && html.ends_with("-->");
    }
    let opens = html.bytes().filter(|&b| b == b'<').count();
    let closes = html.bytes().filter(|&b| b == b'>').count();
    html.ends_with('>') && opens <= closes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_tag() {
        assert_eq!(short_tag_of("<div>"), "div");
        assert_eq!(short_tag_of("</DIV>"), "div");
        assert_eq!(short_tag_of("<br/>"), "br");
        assert_eq!(short_tag_of("<a"), "a");
        assert_eq!(short_tag_of("<!--"), "!--");
        assert_eq!(short_tag_of("<!--comment-->"), "!--");
        assert_eq!(short_tag_of("<!DOCTYPE"), "!doctype");
        assert_eq!(short_tag_of("<"), "");
        assert_eq!(short_tag_of("</>"), "");
        assert_eq!(short_tag_of("<3"), "");
        assert_eq!(short_tag_of("word"), "");
    }

    #[test]
    fn test_single_fragment_tags() {
        let tag = Tag::from_fragment("<p>").unwrap();
        assert!(tag.is_opening);
        assert!(tag.is_valid);
        assert_eq!(tag.name, "<p>");

        let tag = Tag::from_fragment("<br/>").unwrap();
        assert!(tag.is_inline_closing);
        assert!(!tag.is_opening);
        assert_eq!(tag.name, "<br/>");

        let tag = Tag::from_fragment("</p>").unwrap();
        assert!(tag.is_end_tag());
        assert!(!tag.is_opening);
        assert_eq!(tag.name, "</p>");
    }

    #[test]
    fn test_accumulating_tag() {
        let mut tag = Tag::from_fragment("<img").unwrap();
        assert!(!tag.is_valid);
        assert!(tag.is_opening);

        tag.append(r#"src="x.png""#);
        assert!(!tag.is_valid);

        tag.append("/>");
        assert!(tag.is_valid);
        assert!(tag.is_inline_closing);
        assert_eq!(tag.name, "<img/>");
        assert_eq!(tag.html, r#"<img src="x.png" />"#);
    }

    #[test]
    fn test_comment_validity() {
        let mut tag = Tag::from_fragment("<!--").unwrap();
        assert!(!tag.is_valid);
        tag.append("a>b");
        assert!(!tag.is_valid);
        tag.append("-->");
        assert!(tag.is_valid);
        assert!(!tag.is_inline_closing);
        assert_eq!(tag.html, "<!-- a>b -->");

        assert!(Tag::from_fragment("<!---->").unwrap().is_valid);
        assert!(!Tag::from_fragment("<!-->").unwrap().is_valid);
    }

    #[test]
    fn test_attributes() {
        let tag = Tag::from_fragment(
            r#"<a href="/x?a=1&amp;b=2" class='byline main' data-id=7 hidden>"#,
        )
        .unwrap();
        let attrs = tag.attributes();
        assert_eq!(
            attrs,
            vec![
                ("href".to_string(), "/x?a=1&b=2".to_string()),
                ("class".to_string(), "byline main".to_string()),
                ("data-id".to_string(), "7".to_string()),
                ("hidden".to_string(), String::new()),
            ]
        );
        assert_eq!(tag.attr("CLASS").as_deref(), Some("byline main"));
        assert_eq!(tag.attr("rel"), None);
    }

    #[test]
    fn test_attributes_self_closing() {
        let tag = Tag::from_fragment(r#"<meta name="author" content="Jane Roe"/>"#).unwrap();
        assert_eq!(tag.attr("name").as_deref(), Some("author"));
        assert_eq!(tag.attr("content").as_deref(), Some("Jane Roe"));
        assert!(Tag::from_fragment("<p>").unwrap().attributes().is_empty());
    }

    #[test]
    fn test_token_accessors() {
        let word = Word::new(NodeInfo::new(3, 1, 1), "hello");
        let token = Token::Word(word);
        assert_eq!(token.id(), 3);
        assert_eq!(token.parent_id(), 1);
        assert_eq!(token.level(), 1);
        assert!(!token.node().is_top_level());
        assert!(NodeInfo::new(1, ROOT_ID, 0).is_top_level());
        assert_eq!(token.html(), "hello");
        assert!(!token.is_tag());
        assert!(token.as_word().is_some());
        assert!(token.as_tag().is_none());
    }
}
