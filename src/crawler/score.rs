//! Relevance scoring for frontier entries
//!
//! A candidate URL is scored from two signals, each in `[0, 1]`:
//! - how closely the URL itself matches the search term
//! - how strongly the page that linked to it is indexed for the term

use url::Url;

/// Weight of URL text relevance in the combined score
pub const RELEVANCE_WEIGHT: f64 = 0.5;

/// Weight of index strength in the combined score
pub const INDEX_STRENGTH_WEIGHT: f64 = 0.5;

/// Scores how textually related a URL is to a search term
///
/// Both sides are case-folded. If the term occurs in the URL path the
/// relevance is 1.0; otherwise it is the length of the longest common
/// substring divided by the term length. A URL that does not parse is
/// compared as a plain string. An empty term has no relevance.
///
/// # Examples
///
/// ```
/// use trawl_rank::crawler::url_relevance;
///
/// assert_eq!(url_relevance("https://x/cats", "cats"), 1.0);
/// assert!(url_relevance("https://x/dogs", "cats") < 1.0);
/// ```
pub fn url_relevance(url: &str, term: &str) -> f64 {
    let term = term.to_lowercase();
    if term.is_empty() {
        return 0.0;
    }

    let haystack = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_lowercase(),
        Err(_) => url.to_lowercase(),
    };

    if haystack.contains(&term) {
        return 1.0;
    }

    let haystack: Vec<char> = haystack.chars().collect();
    let needle: Vec<char> = term.chars().collect();
    let run = longest_common_substring(&haystack, &needle);

    (run as f64 / needle.len() as f64).clamp(0.0, 1.0)
}

/// Normalizes a stored index count against the highest count for the term
///
/// Returns 0.0 when nothing is indexed for the term yet.
pub fn index_strength(count: u32, highest: u32) -> f64 {
    if highest == 0 {
        return 0.0;
    }
    (count as f64 / highest as f64).clamp(0.0, 1.0)
}

/// Combines URL relevance and index strength into a frontier score
pub fn combined_score(relevance: f64, strength: f64) -> f64 {
    RELEVANCE_WEIGHT * relevance + INDEX_STRENGTH_WEIGHT * strength
}

/// Length of the longest contiguous run shared by `a` and `b`
fn longest_common_substring(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Rolling row of the classic suffix-length table
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    let mut best = 0;

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            current[j + 1] = if ca == cb { previous[j] + 1 } else { 0 };
            best = best.max(current[j + 1]);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}
