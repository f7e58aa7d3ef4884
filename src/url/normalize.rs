use crate::UrlError;
use url::{form_urlencoded, Url};

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Normalizes a discovered link so that equivalent spellings share one key
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything but http:// and https://
/// 3. Require a host (the url crate lowercases it)
/// 4. Normalize path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
/// 5. Remove fragment (everything after #)
/// 6. Remove tracking query parameters
/// 7. Sort remaining query parameters alphabetically
/// 8. Remove empty query string (trailing ?)
///
/// Unlike a canonicalizer for cross-site crawling, the scheme and any `www.`
/// prefix are kept: link records and index entries are keyed by the exact URL
/// that was fetched.
///
/// # Examples
///
/// ```
/// use trawl_rank::url::normalize_url;
///
/// let url = normalize_url("https://en.wikipedia.org/wiki/Cat/#History").unwrap();
/// assert_eq!(url.as_str(), "https://en.wikipedia.org/wiki/Cat");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Same as [`normalize_url`] for an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let filtered_params = filter_and_sort_query_params(&url);

        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(filtered_params.iter())
                .finish();
            url.set_query(Some(&query_string));
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    // Split path into segments and normalize
    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in segments {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            // Parent directory - pop the last segment if possible
            ".." => {
                if !normalized_segments.is_empty() {
                    normalized_segments.pop();
                }
            }
            // Regular segment
            _ => normalized_segments.push(segment),
        }
    }

    // Reconstruct path
    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    let result = format!("/{}", normalized_segments.join("/"));

    // Remove trailing slash unless it's the root
    if result.len() > 1 && result.ends_with('/') {
        result[..result.len() - 1].to_string()
    } else {
        result
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    // Sort by key
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    // Check exact matches
    if TRACKING_PARAMS.contains(&key) {
        return true;
    }

    // Check for utm_* prefix (catches any utm parameter)
    if key.starts_with("utm_") {
        return true;
    }

    false
}
