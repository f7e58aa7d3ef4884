//! Output module for presenting search results and store summaries
//!
//! This module handles:
//! - Rendering the ranked results of a search session
//! - Rendering authority and hybrid rankings
//! - Rendering the search history
//! - Recording store statistics

pub mod stats;

pub use stats::{format_statistics, load_statistics, print_statistics, StoreStatistics};

use crate::crawler::SessionReport;
use crate::rank::HybridScore;
use crate::storage::SearchRecord;
use std::collections::BTreeMap;

/// Number of rows shown for rankings unless the caller asks otherwise
pub const DEFAULT_RESULT_LIMIT: usize = 20;

/// Renders the ranked results of a finished search
pub fn format_report(report: &SessionReport, limit: usize) -> String {
    let mut out = format!(
        "Results for '{}': {} pages fetched, {} failed, {} expanded from cache\n",
        report.term, report.pages_fetched, report.fetch_failures, report.cache_expansions
    );

    if report.results.is_empty() {
        out.push_str("  No pages found for this term.\n");
        return out;
    }

    for (position, (url, count)) in report.results.iter().take(limit).enumerate() {
        out.push_str(&format!("  {:>3}. {} ({})\n", position + 1, url, count));
    }

    if report.results.len() > limit {
        out.push_str(&format!("  ... and {} more\n", report.results.len() - limit));
    }

    out
}

/// Renders the highest authority scores, best first
pub fn format_authority(authority: &BTreeMap<String, f64>, limit: usize) -> String {
    let mut ranked: Vec<(&String, &f64)> = authority.iter().collect();
    ranked.sort_by(|a, b| b.1.total_cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let mut out = format!("Authority over {} pages:\n", authority.len());
    for (position, (url, score)) in ranked.into_iter().take(limit).enumerate() {
        out.push_str(&format!("  {:>3}. {:.6} {}\n", position + 1, score, url));
    }

    out
}

/// Renders a hybrid reranking
pub fn format_hybrid(term: &str, scores: &[HybridScore], limit: usize) -> String {
    let mut out = format!("Reranked results for '{}':\n", term);

    if scores.is_empty() {
        out.push_str("  No pages found for this term.\n");
        return out;
    }

    for (position, s) in scores.iter().take(limit).enumerate() {
        out.push_str(&format!(
            "  {:>3}. {:.3} {} (pagerank {:.3}, index {:.3})\n",
            position + 1,
            s.score,
            s.url,
            s.pagerank,
            s.index_strength
        ));
    }

    out
}

/// Renders recorded searches, newest first
pub fn format_history(records: &[SearchRecord]) -> String {
    let mut out = String::from("=== Search History ===\n\n");

    if records.is_empty() {
        out.push_str("  No searches recorded.\n");
        return out;
    }

    for record in records {
        let fetched = match record.pages_fetched {
            Some(n) => format!("{}/{} pages", n, record.budget),
            None => "unfinished".to_string(),
        };
        out.push_str(&format!(
            "  #{} {} '{}' {}\n",
            record.id, record.started_at, record.term, fetched
        ));
    }

    out
}
