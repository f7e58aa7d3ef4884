//! URL handling module for Trawl-Rank
//!
//! This module provides URL normalization, search-root construction, and the
//! content-link filter that decides which discovered links belong to the site.

mod filter;
mod normalize;

pub use filter::LinkFilter;
pub use normalize::{normalize_parsed, normalize_url};

use crate::{UrlError, UrlResult};
use url::{form_urlencoded, Url};

/// Placeholder replaced by the encoded search term in a search URL template
pub const TERM_PLACEHOLDER: &str = "{term}";

/// Builds the search-root URL for a term from a template
///
/// The term is trimmed and query-encoded before substitution.
///
/// # Examples
///
/// ```
/// use trawl_rank::url::build_search_url;
///
/// let url = build_search_url("https://example.com/search?q={term}", "black cat").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/search?q=black+cat");
/// ```
pub fn build_search_url(template: &str, term: &str) -> UrlResult<Url> {
    if !template.contains(TERM_PLACEHOLDER) {
        return Err(UrlError::MissingPlaceholder(template.to_string()));
    }

    let encoded: String = form_urlencoded::byte_serialize(term.trim().as_bytes()).collect();
    let url = Url::parse(&template.replace(TERM_PLACEHOLDER, &encoded))
        .map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    Ok(url)
}
