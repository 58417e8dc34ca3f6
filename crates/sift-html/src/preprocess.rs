//! Page cleanup that runs before tokenization.
//!
//! After [`clean_page`] script and style bodies are gone, all whitespace is a
//! single space, and every tag boundary is separated from neighbouring words
//! by a space, so splitting on the space character never yields a fragment
//! that mixes markup and text.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("whitespace pattern is valid");
    static ref SCRIPT: Regex = Regex::new(r"(?is)<script\b[^>]*>.*?(?:</script\s*>|\z)")
        .expect("script pattern is valid");
    static ref STYLE: Regex = Regex::new(r"(?is)<style\b[^>]*>.*?(?:</style\s*>|\z)")
        .expect("style pattern is valid");
    static ref NOSCRIPT: Regex = Regex::new(r"(?is)<noscript\b[^>]*>.*?(?:</noscript\s*>|\z)")
        .expect("noscript pattern is valid");
    static ref COMMENT: Regex =
        Regex::new(r"(?s)<!--.*?(?:-->|\z)").expect("comment pattern is valid");
    static ref DOCTYPE: Regex = Regex::new(r"(?i)<!doctype[^>]*>").expect("doctype pattern is valid");
    static ref LOOSE_END_TAG: Regex =
        Regex::new(r"</\s*([A-Za-z][^\s>/]*)\s*>").expect("end tag pattern is valid");
}

/// Normalize a page so it can be split into fragments.
///
/// With `clean_fully`, comments, `<noscript>` bodies and doctype declarations
/// are removed as well.
pub fn clean_page(html: &str, clean_fully: bool) -> String {
    let text = WHITESPACE.replace_all(html, " ");
    let text = SCRIPT.replace_all(&text, " ");
    let text = STYLE.replace_all(&text, " ");

    let text = if clean_fully {
        let text = COMMENT.replace_all(&text, " ");
        let text = NOSCRIPT.replace_all(&text, " ");
        DOCTYPE.replace_all(&text, " ").into_owned()
    } else {
        text.into_owned()
    };

    let text = LOOSE_END_TAG.replace_all(&text, "</$1>");

    let mut spaced = String::with_capacity(text.len() + text.len() / 8);
    for ch in text.chars() {
        match ch {
            '<' => spaced.push_str(" <"),
            '>' => spaced.push_str("> "),
            _ => spaced.push(ch),
        }
    }

    let cleaned = WHITESPACE.replace_all(spaced.trim(), " ").into_owned();
    trace!(
        input_len = html.len(),
        output_len = cleaned.len(),
        clean_fully,
        "page cleaned"
    );
    cleaned
}

/// Split a cleaned page on the space character, dropping empty fragments.
pub fn split_fragments(cleaned: &str) -> Vec<&str> {
    cleaned.split(' ').filter(|f| !f.is_empty()).collect()
}
