//! HTML parser for extracting content links and words
//!
//! This module handles parsing fetched HTML to extract:
//! - Outbound on-site content links, with their anchor titles
//! - The normalized words of the page text

use crate::url::{normalize_parsed, LinkFilter};
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text is never indexed
const SKIPPED_TEXT_PARENTS: &[&str] = &["script", "style", "noscript"];

/// A content link found on a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    /// Absolute, normalized link target
    pub url: String,

    /// The anchor's `title` attribute
    pub title: String,
}

/// Extracted information from an HTML page
#[derive(Debug, Clone, Default)]
pub struct ParsedPage {
    /// Content links in document order, without duplicates
    pub links: Vec<PageLink>,

    /// Case-folded, punctuation-stripped words in document order
    pub words: Vec<String>,
}

/// Parses HTML content and extracts links and words
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="..." title="...">` with a non-empty title whose
/// resolved target passes the [`LinkFilter`].
///
/// **Exclude:** links without a title, unresolvable hrefs, other hosts, and
/// non-content paths. Fragments are dropped, so `/wiki/Cat#History` and
/// `/wiki/Cat` are the same link.
///
/// Malformed or empty documents simply yield nothing.
///
/// # Example
///
/// ```
/// use trawl_rank::crawler::parse_page;
/// use trawl_rank::url::LinkFilter;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/wiki/Lion" title="Lion">Lions</a> roar</body></html>"#;
/// let base_url = Url::parse("https://en.wikipedia.org/wiki/Cat").unwrap();
/// let parsed = parse_page(html, &base_url, &LinkFilter::new("/wiki/", vec![]));
/// assert_eq!(parsed.links[0].url, "https://en.wikipedia.org/wiki/Lion");
/// assert_eq!(parsed.words, vec!["lions", "roar"]);
/// ```
pub fn parse_page(html: &str, base_url: &Url, filter: &LinkFilter) -> ParsedPage {
    let document = Html::parse_document(html);

    ParsedPage {
        links: extract_links(&document, base_url, filter),
        words: extract_words(&document),
    }
}

/// Extracts the content links of the document
fn extract_links(document: &Html, base_url: &Url, filter: &LinkFilter) -> Vec<PageLink> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(selector) = Selector::parse("a[href][title]") else {
        return links;
    };

    for element in document.select(&selector) {
        let title = element.value().attr("title").unwrap_or("").trim();
        if title.is_empty() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(target) = resolve_link(href, base_url) else {
            continue;
        };

        if !filter.accepts(base_url, &target) {
            continue;
        }

        if seen.insert(target.to_string()) {
            links.push(PageLink {
                url: target.into(),
                title: title.to_string(),
            });
        }
    }

    links
}

/// Resolves a link href to an absolute, normalized URL
///
/// Returns None for empty hrefs, fragment-only anchors, and anything that does
/// not resolve to an HTTP(S) URL.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_parsed(absolute).ok()
}

/// Extracts the normalized words of every text node
fn extract_words(document: &Html) -> Vec<String> {
    let mut words = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let skipped = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| SKIPPED_TEXT_PARENTS.contains(&element.name()))
            .unwrap_or(false);
        if skipped {
            continue;
        }

        words.extend(normalize_words(text));
    }

    words
}

/// Splits text on whitespace, strips surrounding punctuation, and lowercases
pub fn normalize_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| word.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|word| !word.is_empty())
        .map(|word| word.to_lowercase())
}

/// Turns a search term into the word it is looked up under in the index
///
/// The term goes through [`normalize_words`] so that it matches indexed words
/// exactly. The index holds single words only; for a multi-word term the first
/// word is used. Returns None when nothing indexable is left.
///
/// # Example
///
/// ```
/// use trawl_rank::crawler::index_key;
///
/// assert_eq!(index_key(" Cat. ").as_deref(), Some("cat"));
/// assert_eq!(index_key("?!"), None);
/// ```
pub fn index_key(term: &str) -> Option<String> {
    let mut words = normalize_words(term);
    let key = words.next()?;

    if words.next().is_some() {
        tracing::warn!(
            "Only single-word lookups are supported; searching the index for '{}' from '{}'",
            key,
            term.trim()
        );
    }

    Some(key)
}
