//! Document metadata collected while tokenizing.
//!
//! The collector is told about every tag, end tag and word as the tokenizer
//! produces them. It never feeds anything back into tokenization. Signals come
//! from `<title>`, `<meta>` name/property pairs, `datetime` attributes and
//! class/id/rel/itemprop hints that mark byline, author and date regions.

use crate::token::Tag;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use tracing::trace;

lazy_static! {
    static ref AUTHOR_META: Regex = Regex::new(
        r"(?i)^\s*(?:(?:article|dc|dcterm|dcterms|og|twitter|parsely|sailthru)\s*[-.:]\s*)?(author|author_name|creator|byl)\s*$"
    )
    .expect("author meta pattern is valid");
    static ref TITLE_META: Regex = Regex::new(
        r"(?i)^\s*(?:(?:og|twitter|dc|dcterm|dcterms|parsely|sailthru)\s*[-.:]\s*)?(title|headline)\s*$"
    )
    .expect("title meta pattern is valid");
    static ref DATE_META: Regex = Regex::new(
        r"(?i)^\s*(?:(?:article|og|dc|dcterm|dcterms|parsely|sailthru)\s*[-.:]\s*)?(published_time|pub-date|pubdate|publish-date|publish_date|datepublished|date|created)\s*$"
    )
    .expect("date meta pattern is valid");
    static ref BYLINE_HINT: Regex =
        Regex::new(r"(?i)\b(byline|by-line|dateline|author-info|contributor|credit)\b")
            .expect("byline pattern is valid");
    static ref AUTHOR_HINT: Regex =
        Regex::new(r"(?i)\b(author|author-name|authorname|writer)\b")
            .expect("author pattern is valid");
    static ref DATE_HINT: Regex = Regex::new(
        r"(?i)\b(date|dateline|published|pubdate|timestamp|post-date|entry-date|datepublished)\b"
    )
    .expect("date pattern is valid");
    static ref BY_PREFIX: Regex =
        Regex::new(r"(?i)^\s*(?:written\s+|posted\s+)?by\b[:\s]*").expect("by pattern is valid");
    static ref BYLINE_TAIL: Regex =
        Regex::new(r"(?i)\s(?:\||•|-|posted|updated|published|on)\s").expect("tail pattern is valid");
    static ref NAME_SEPARATOR: Regex =
        Regex::new(r"(?i)\s*(?:,|&|\band\b)\s*").expect("separator pattern is valid");
    static ref ISO_DATE: Regex =
        Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:T|\b)").expect("iso date pattern is valid");
    static ref MONTH_FIRST: Regex = Regex::new(
        r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b"
    )
    .expect("month-first pattern is valid");
    static ref DAY_FIRST: Regex = Regex::new(
        r"(?i)\b(\d{1,2})(?:st|nd|rd|th)?\s+(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?,?\s+(\d{4})\b"
    )
    .expect("day-first pattern is valid");
}

/// Where an author name was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorSource {
    /// `<meta name="author" content=...>` and friends
    Meta,
    /// `rel="author"` links
    Link,
    /// `itemprop="author"` microdata
    Itemprop,
    /// Elements whose class or id names an author
    Class,
    /// Names split out of a byline
    Byline,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub name: String,
    pub source: AuthorSource,
}

/// Document-level metadata of a parsed page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    /// Author names in discovery order, without duplicates.
    pub author_names: Vec<String>,
    pub authors: Vec<Author>,
    pub byline: Option<String>,
    pub publish_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureKind {
    Title,
    Byline,
    Author(AuthorSource),
    Date,
}

impl CaptureKind {
    /// Regions stop capturing after this many words even without an end tag.
    fn word_limit(self) -> usize {
        match self {
            CaptureKind::Title => 64,
            CaptureKind::Byline => 32,
            CaptureKind::Author(_) => 8,
            CaptureKind::Date => 12,
        }
    }
}

/// Words captured between an element's start tag and its end tag.
#[derive(Debug)]
struct Region {
    kind: CaptureKind,
    tag: String,
    /// Same-name elements opened inside the region and not yet closed.
    nesting: usize,
    words: Vec<String>,
}

/// Accumulates metadata over one tokenize call.
#[derive(Debug, Default)]
pub struct MetadataCollector {
    regions: Vec<Region>,
    title: Option<String>,
    meta_title: Option<String>,
    byline: Option<String>,
    authors: Vec<Author>,
    publish_date: Option<NaiveDate>,
}

impl MetadataCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe a start or self-closing tag. Incomplete tags are ignored until
    /// their last fragment arrives.
    pub fn check_tag(&mut self, tag: &Tag, opens_scope: bool) {
        if !tag.is_valid || tag.is_comment() || tag.is_end_tag() {
            return;
        }
        if opens_scope {
            for region in self.regions.iter_mut().filter(|r| r.tag == tag.short_tag) {
                region.nesting += 1;
            }
        }

        let attrs = tag.attributes();
        let attr = |name: &str| {
            attrs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };

        if tag.short_tag == "meta" {
            self.check_meta(
                attr("name").or(attr("property")).or(attr("itemprop")),
                attr("content"),
            );
        }
        if let Some(datetime) = attr("datetime") {
            self.offer_date(datetime);
        }
        if !opens_scope {
            return;
        }

        if tag.short_tag == "title" {
            if self.title.is_none() && !self.is_capturing(CaptureKind::Title) {
                self.open_region(CaptureKind::Title, &tag.short_tag);
            }
            return;
        }

        let hints = format!(
            "{} {}",
            attr("class").unwrap_or_default(),
            attr("id").unwrap_or_default()
        );
        let itemprop = attr("itemprop").unwrap_or_default().to_ascii_lowercase();

        if BYLINE_HINT.is_match(&hints) {
            if self.byline.is_none() && !self.is_capturing(CaptureKind::Byline) {
                self.open_region(CaptureKind::Byline, &tag.short_tag);
            }
        } else if attr("rel").is_some_and(|rel| rel.eq_ignore_ascii_case("author")) {
            self.open_region(CaptureKind::Author(AuthorSource::Link), &tag.short_tag);
        } else if itemprop.split_whitespace().any(|prop| prop == "author") {
            self.open_region(CaptureKind::Author(AuthorSource::Itemprop), &tag.short_tag);
        } else if AUTHOR_HINT.is_match(&hints) {
            self.open_region(CaptureKind::Author(AuthorSource::Class), &tag.short_tag);
        }

        let wants_date = itemprop == "datepublished" || DATE_HINT.is_match(&hints);
        if wants_date && self.publish_date.is_none() && !self.is_capturing(CaptureKind::Date) {
            self.open_region(CaptureKind::Date, &tag.short_tag);
        }
    }

    /// Observe an end tag, whether or not it matched an open element.
    pub fn check_end_tag(&mut self, short_tag: &str) {
        let mut index = 0;
        while index < self.regions.len() {
            let region = &mut self.regions[index];
            if region.tag != short_tag {
                index += 1;
            } else if region.nesting > 0 {
                region.nesting -= 1;
                index += 1;
            } else {
                let region = self.regions.remove(index);
                self.finalize(region);
            }
        }
    }

    /// Observe a word.
    pub fn check_word(&mut self, text: &str) {
        if self.regions.is_empty() {
            return;
        }
        let mut index = 0;
        while index < self.regions.len() {
            let region = &mut self.regions[index];
            region.words.push(text.to_string());
            if region.words.len() >= region.kind.word_limit() {
                let region = self.regions.remove(index);
                self.finalize(region);
            } else {
                index += 1;
            }
        }
    }

    /// Close any region still open and produce the metadata.
    pub fn finish(mut self) -> Metadata {
        for region in std::mem::take(&mut self.regions) {
            self.finalize(region);
        }
        Metadata {
            title: self.title.or(self.meta_title),
            author_names: self.authors.iter().map(|a| a.name.clone()).collect(),
            authors: self.authors,
            byline: self.byline,
            publish_date: self.publish_date,
        }
    }

    fn is_capturing(&self, kind: CaptureKind) -> bool {
        self.regions.iter().any(|region| region.kind == kind)
    }

    fn open_region(&mut self, kind: CaptureKind, tag: &str) {
        trace!(?kind, tag, "capture region opened");
        self.regions.push(Region {
            kind,
            tag: tag.to_string(),
            nesting: 0,
            words: Vec::new(),
        });
    }

    fn finalize(&mut self, region: Region) {
        let text = region.words.join(" ");
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        trace!(kind = ?region.kind, text, "capture region closed");
        match region.kind {
            CaptureKind::Title => {
                if self.title.is_none() {
                    self.title = Some(text.to_string());
                }
            }
            CaptureKind::Byline => {
                if self.byline.is_none() {
                    self.byline = Some(text.to_string());
                }
                for name in names_from_byline(text) {
                    self.add_author(&name, AuthorSource::Byline);
                }
            }
            CaptureKind::Author(source) => {
                let name = BY_PREFIX.replace(text, "");
                if name.split_whitespace().count() <= 6 {
                    self.add_author(&name, source);
                }
            }
            CaptureKind::Date => self.offer_date(text),
        }
    }

    fn check_meta(&mut self, key: Option<&str>, content: Option<&str>) {
        let (Some(key), Some(content)) = (key, content) else {
            return;
        };
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        if AUTHOR_META.is_match(key) {
            if !content.starts_with("http") {
                for name in NAME_SEPARATOR.split(content) {
                    self.add_author(name, AuthorSource::Meta);
                }
            }
        } else if TITLE_META.is_match(key) {
            if self.meta_title.is_none() {
                self.meta_title = Some(content.to_string());
            }
        } else if DATE_META.is_match(key) {
            self.offer_date(content);
        }
    }

    fn add_author(&mut self, name: &str, source: AuthorSource) {
        let name = name
            .trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '|'))
            .to_string();
        if name.is_empty() {
            return;
        }
        if self
            .authors
            .iter()
            .any(|author| author.name.eq_ignore_ascii_case(&name))
        {
            return;
        }
        trace!(name = %name, ?source, "author found");
        self.authors.push(Author { name, source });
    }

    fn offer_date(&mut self, text: &str) {
        if self.publish_date.is_none() {
            self.publish_date = parse_date(text);
        }
    }
}

/// Split a byline such as "By Jane Roe and John Smith | March 5, 2013" into
/// names that look like personal names.
pub fn names_from_byline(byline: &str) -> Vec<String> {
    let text = BY_PREFIX.replace(byline, "");
    let text = match BYLINE_TAIL.find(&text) {
        Some(tail) => &text[..tail.start()],
        None => &text[..],
    };
    NAME_SEPARATOR
        .split(text)
        .map(str::trim)
        .filter(|name| looks_like_name(name))
        .map(str::to_string)
        .collect()
}

fn looks_like_name(candidate: &str) -> bool {
    let words: Vec<&str> = candidate.split_whitespace().collect();
    !words.is_empty()
        && words.len() <= 4
        && words.iter().all(|word| {
            word.chars().next().is_some_and(char::is_uppercase)
                && !word.chars().any(|c| c.is_ascii_digit())
        })
}

const LOCAL_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a publish date from an attribute value or a run of words.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    // ISO 8601 local times carry no offset.
    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    if let Some(caps) = ISO_DATE.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        );
        if date.is_some() {
            return date;
        }
    }
    if let Some(caps) = MONTH_FIRST.captures(text) {
        return NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            month_number(&caps[1])?,
            caps[2].parse().ok()?,
        );
    }
    if let Some(caps) = DAY_FIRST.captures(text) {
        return NaiveDate::from_ymd_opt(
            caps[3].parse().ok()?,
            month_number(&caps[2])?,
            caps[1].parse().ok()?,
        );
    }
    None
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}
