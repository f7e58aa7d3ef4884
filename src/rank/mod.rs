//! Global rank engine
//!
//! Computes link-graph authority over everything the crawler has stored and
//! blends it with the word index to rerank search results. None of this runs
//! during crawling; the frontier only uses data local to each page.

mod pagerank;

pub use pagerank::{compute_authority, RankConfig};

use std::collections::BTreeMap;

/// Weight of link-graph authority in the blended score
pub const AUTHORITY_WEIGHT: f64 = 0.7;

/// Weight of index strength in the blended score
pub const STRENGTH_WEIGHT: f64 = 0.3;

/// A search result with its blended score
#[derive(Debug, Clone, PartialEq)]
pub struct HybridScore {
    pub url: String,

    /// Authority normalized to the best candidate
    pub pagerank: f64,

    /// Index count normalized to the best candidate
    pub index_strength: f64,

    pub score: f64,
}

/// Reranks `(url, count)` results by blending authority with index strength
///
/// Both signals are normalized by their maximum over the candidates, so the
/// top score is at most 1. Candidates missing from `authority` get 0.
pub fn hybrid_rerank(authority: &BTreeMap<String, f64>, ranked: &[(String, u32)]) -> Vec<HybridScore> {
    let max_authority = ranked
        .iter()
        .map(|(url, _)| authority.get(url).copied().unwrap_or(0.0))
        .fold(0.0, f64::max);
    let max_count = ranked.iter().map(|(_, count)| *count).max().unwrap_or(0);

    let mut scores: Vec<HybridScore> = ranked
        .iter()
        .map(|(url, count)| {
            let pagerank = if max_authority > 0.0 {
                authority.get(url).copied().unwrap_or(0.0) / max_authority
            } else {
                0.0
            };
            let index_strength = match max_count {
                0 => 0.0,
                max => f64::from(*count) / f64::from(max),
            };

            HybridScore {
                url: url.clone(),
                pagerank,
                index_strength,
                score: AUTHORITY_WEIGHT * pagerank + STRENGTH_WEIGHT * index_strength,
            }
        })
        .collect();

    scores.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.url.cmp(&b.url)));
    scores
}
