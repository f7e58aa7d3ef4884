//! Crawl session controller - the fetch/expand/score loop of one search
//!
//! A session starts with the search root in the frontier at score 1.0 and
//! repeatedly pops the best candidate:
//! - If the store already has a link record for it, its links are scored and
//!   queued from cached data without spending budget.
//! - Otherwise one unit of budget is spent to fetch it, index its words, store
//!   its links, and queue its children.
//!
//! The loop ends when the frontier is empty or the budget is spent. All durable
//! state lives in the store; the session itself is discarded afterwards.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::{Frontier, Pop};
use crate::crawler::parser::{index_key, parse_page};
use crate::crawler::score::{combined_score, index_strength, url_relevance};
use crate::storage::{IndexStore, LinkStore};
use crate::url::{build_search_url, LinkFilter};
use crate::TrawlError;
use std::collections::{BTreeSet, HashSet};
use url::Url;

/// Score given to the search root
pub const ROOT_SCORE: f64 = 1.0;

/// Coarse lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Only the search root is queued
    Seeded,
    /// At least one step has run and the loop may continue
    Looping,
    /// No further steps will do anything
    Terminated,
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    FrontierEmpty,
    BudgetExhausted,
}

/// What a single loop iteration did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Links of an already crawled page were queued without fetching
    ExpandedFromCache { url: String, children: usize },

    /// A page was fetched, indexed, and its links queued
    FetchedAndExpanded { url: String, children: usize },

    /// The fetch failed; the budget unit is spent and the URL dropped
    FetchFailed { url: String },

    /// The URL was already handled earlier in this session
    Skipped { url: String },

    /// The loop is over
    Terminated(TerminationReason),
}

/// Outcome of a completed session
#[derive(Debug, Clone)]
pub struct SessionReport {
    /// The search term as entered
    pub term: String,

    /// Successful fetches
    pub pages_fetched: u32,

    /// Fetches that failed (they still consumed budget)
    pub fetch_failures: u32,

    /// Pages expanded from their stored link record
    pub cache_expansions: u32,

    /// Pops of URLs already handled in this session
    pub skipped: u32,

    pub termination: TerminationReason,

    /// `(url, count)` for the term, highest count first
    pub results: Vec<(String, u32)>,
}

impl SessionReport {
    /// Total budget spent, successful or not
    pub fn budget_spent(&self) -> u32 {
        self.pages_fetched + self.fetch_failures
    }
}

/// One search: a term, its frontier, and the collaborators it drives
pub struct SearchSession<'a, S, F> {
    term: String,
    index_term: String,
    frontier: Frontier,
    filter: LinkFilter,
    store: &'a mut S,
    fetcher: &'a mut F,
    resolved: HashSet<String>,
    state: SessionState,
    pages_fetched: u32,
    fetch_failures: u32,
    cache_expansions: u32,
    skipped: u32,
}

impl<'a, S, F> SearchSession<'a, S, F>
where
    S: IndexStore + LinkStore,
    F: Fetcher,
{
    /// Creates a session seeded with `root` at score 1.0
    pub fn new(
        term: &str,
        root: Url,
        budget: u32,
        filter: LinkFilter,
        store: &'a mut S,
        fetcher: &'a mut F,
    ) -> Self {
        let term = term.trim();
        // The root is fetched exactly as built from the configured template
        let mut frontier = Frontier::new(term, budget);
        frontier.push(root, ROOT_SCORE);

        Self {
            term: term.to_string(),
            index_term: index_key(term).unwrap_or_default(),
            frontier,
            filter,
            store,
            fetcher,
            resolved: HashSet::new(),
            state: SessionState::Seeded,
            pages_fetched: 0,
            fetch_failures: 0,
            cache_expansions: 0,
            skipped: 0,
        }
    }

    /// Creates a session whose root is the configured search URL for `term`
    pub fn from_config(
        config: &CrawlerConfig,
        term: &str,
        store: &'a mut S,
        fetcher: &'a mut F,
    ) -> Result<Self, TrawlError> {
        let root = build_search_url(&config.search_url, term)?;
        Ok(Self::new(
            term,
            root,
            config.budget,
            LinkFilter::from_config(config),
            store,
            fetcher,
        ))
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs one loop iteration
    ///
    /// Fetch failures are reported as [`Step::FetchFailed`]; only storage
    /// errors abort the session.
    pub async fn step(&mut self) -> Result<Step, TrawlError> {
        let entry = match self.frontier.pop_highest() {
            Pop::Entry(entry) => entry,
            Pop::Empty => return Ok(self.terminate(TerminationReason::FrontierEmpty)),
            Pop::Exhausted => return Ok(self.terminate(TerminationReason::BudgetExhausted)),
        };
        self.state = SessionState::Looping;

        let url = entry.url;
        if !self.resolved.insert(url.clone()) {
            tracing::trace!("Skipping {}, already handled this session", url);
            self.skipped += 1;
            return Ok(Step::Skipped { url });
        }

        if self.store.has_links(&url)? {
            let children = self.expand_from_cache(&url)?;
            self.cache_expansions += 1;
            tracing::debug!("Expanded {} from cache ({} links)", url, children);
            return Ok(Step::ExpandedFromCache { url, children });
        }

        // The budget unit is spent whether or not the fetch succeeds
        self.frontier.record_fetch();

        let target = match Url::parse(&url) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("Dropping unparseable URL {}: {}", url, e);
                self.fetch_failures += 1;
                return Ok(Step::FetchFailed { url });
            }
        };

        let page = match self.fetcher.fetch(&target).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                self.fetch_failures += 1;
                return Ok(Step::FetchFailed { url });
            }
        };

        let parsed = parse_page(&page.body, &page.final_url, &self.filter);
        self.store.update_index(&url, &parsed.words)?;

        let strength = self.strength_of(&url)?;
        let mut links = BTreeSet::new();
        for link in parsed.links {
            self.enqueue(&link.url, strength);
            links.insert(link.url);
        }
        let children = links.len();

        // Written even when there are no links, so the page counts as crawled
        self.store.store_links(&url, &links)?;
        self.pages_fetched += 1;

        tracing::debug!(
            "Fetched {} ({} words, {} links); {}",
            url,
            parsed.words.len(),
            children,
            self.frontier
        );

        Ok(Step::FetchedAndExpanded { url, children })
    }

    /// Drives the loop to termination and returns the ranked results
    pub async fn run(mut self) -> Result<SessionReport, TrawlError> {
        tracing::info!(
            "Starting search for '{}' (budget {})",
            self.term,
            self.frontier.budget()
        );
        let start_time = std::time::Instant::now();

        let termination = loop {
            match self.step().await? {
                Step::Terminated(reason) => break reason,
                Step::FetchedAndExpanded { .. } if self.pages_fetched % 10 == 0 => {
                    tracing::info!(
                        "Progress: {} pages fetched, {} in frontier",
                        self.pages_fetched,
                        self.frontier.len()
                    );
                }
                _ => {}
            }
        };

        let results = self.store.ranked_urls_for_word(&self.index_term)?;

        tracing::info!(
            "Search for '{}' finished ({:?}): {} fetched, {} failed, {} from cache, {} results in {:?}",
            self.term,
            termination,
            self.pages_fetched,
            self.fetch_failures,
            self.cache_expansions,
            results.len(),
            start_time.elapsed()
        );

        Ok(SessionReport {
            term: self.term,
            pages_fetched: self.pages_fetched,
            fetch_failures: self.fetch_failures,
            cache_expansions: self.cache_expansions,
            skipped: self.skipped,
            termination,
            results,
        })
    }

    fn terminate(&mut self, reason: TerminationReason) -> Step {
        self.state = SessionState::Terminated;
        Step::Terminated(reason)
    }

    /// Queues the stored links of an already crawled page
    fn expand_from_cache(&mut self, url: &str) -> Result<usize, TrawlError> {
        let links = self.store.get_links(url)?;
        let strength = self.strength_of(url)?;

        for link in &links {
            self.enqueue(link, strength);
        }

        Ok(links.len())
    }

    /// Current normalized index strength of `url` for the search term
    fn strength_of(&self, url: &str) -> Result<f64, TrawlError> {
        if self.index_term.is_empty() {
            return Ok(0.0);
        }
        let highest = self.store.highest_count_for_word(&self.index_term)?;
        if highest == 0 {
            return Ok(0.0);
        }
        let count = self.store.count_for_url(&self.index_term, url)?;
        Ok(index_strength(count, highest))
    }

    /// Scores a child from its own URL and its parent's index strength
    fn enqueue(&mut self, link: &str, parent_strength: f64) {
        let relevance = url_relevance(link, &self.index_term);
        let score = combined_score(relevance, parent_strength);
        tracing::trace!(
            "Queueing {} (relevance {:.3}, strength {:.3}, score {:.3})",
            link,
            relevance,
            parent_strength,
            score
        );
        self.frontier.push(link, score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::fetcher::{FetchError, FetchedPage};
    use crate::storage::SqliteStorage;
    use std::collections::HashMap;

    const SITE: &str = "https://site.test";

    /// Serves canned HTML and records every request
    #[derive(Default)]
    struct StaticFetcher {
        pages: HashMap<String, String>,
        requests: Vec<String>,
    }

    impl StaticFetcher {
        fn page(mut self, path: &str, html: &str) -> Self {
            self.pages.insert(format!("{}{}", SITE, path), html.to_string());
            self
        }
    }

    impl Fetcher for StaticFetcher {
        async fn fetch(&mut self, url: &Url) -> Result<FetchedPage, FetchError> {
            self.requests.push(url.to_string());
            match self.pages.get(url.as_str()) {
                Some(body) => Ok(FetchedPage {
                    final_url: url.clone(),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            }
        }
    }

    fn link(path: &str) -> String {
        format!(r#"<a href="{}" title="{}">{}</a>"#, path, path, path)
    }

    fn html(text: &str, links: &[&str]) -> String {
        let anchors: Vec<String> = links.iter().map(|p| link(p)).collect();
        format!(
            "<html><body><p>{}</p>{}</body></html>",
            text,
            anchors.join("")
        )
    }

    fn filter() -> LinkFilter {
        LinkFilter::new("/wiki/", vec!["/wiki/Special".to_string()])
    }

    fn root() -> Url {
        Url::parse(&format!("{}/wiki/Special:Search?search=cat", SITE)).unwrap()
    }

    fn url(path: &str) -> String {
        format!("{}{}", SITE, path)
    }

    fn cat_site() -> StaticFetcher {
        StaticFetcher::default()
            .page(
                "/wiki/Special:Search?search=cat",
                &html("cat cat cat about animals", &["/wiki/Cat_food", "/wiki/Dog"]),
            )
            .page(
                "/wiki/Cat_food",
                &html("cat cat cat cat food", &["/wiki/Kibble"]),
            )
            .page("/wiki/Dog", &html("dog dog dog", &[]))
            .page("/wiki/Kibble", &html("kibble", &[]))
    }

    #[tokio::test]
    async fn test_seeded_with_root() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = StaticFetcher::default();
        let session = SearchSession::new("cat", root(), 5, filter(), &mut store, &mut fetcher);

        assert_eq!(session.state(), SessionState::Seeded);
        assert_eq!(session.frontier().len(), 1);
        let entry = session.frontier().peek().unwrap();
        assert_eq!(entry.url, root().to_string());
        assert_eq!(entry.score, ROOT_SCORE);
    }

    #[tokio::test]
    async fn test_budget_two_scenario() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = cat_site();
        let mut session = SearchSession::new("cat", root(), 2, filter(), &mut store, &mut fetcher);

        let first = session.step().await.unwrap();
        assert_eq!(
            first,
            Step::FetchedAndExpanded {
                url: root().to_string(),
                children: 2
            }
        );

        // The child whose URL contains the term is ahead of the other one
        let next = session.frontier().peek().unwrap();
        assert_eq!(next.url, url("/wiki/Cat_food"));
        assert_eq!(next.score, 1.0);

        let second = session.step().await.unwrap();
        assert_eq!(
            second,
            Step::FetchedAndExpanded {
                url: url("/wiki/Cat_food"),
                children: 1
            }
        );

        let third = session.step().await.unwrap();
        assert_eq!(third, Step::Terminated(TerminationReason::BudgetExhausted));
        assert_eq!(session.state(), SessionState::Terminated);
        // Dog and Kibble are still queued
        assert_eq!(session.frontier().len(), 2);
        assert_eq!(session.frontier().searches_performed(), 2);

        drop(session);
        assert_eq!(fetcher.requests, vec![root().to_string(), url("/wiki/Cat_food")]);
    }

    #[tokio::test]
    async fn test_run_returns_ranked_results() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = cat_site();
        let session = SearchSession::new("Cat", root(), 10, filter(), &mut store, &mut fetcher);

        let report = session.run().await.unwrap();

        assert_eq!(report.termination, TerminationReason::FrontierEmpty);
        assert_eq!(report.pages_fetched, 4);
        assert_eq!(report.fetch_failures, 0);
        assert_eq!(
            report.results,
            vec![(url("/wiki/Cat_food"), 4), (root().to_string(), 3)]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_consumes_budget() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = StaticFetcher::default().page(
            "/wiki/Special:Search?search=cat",
            &html("cat", &["/wiki/Missing", "/wiki/Gone"]),
        );
        let session = SearchSession::new("cat", root(), 10, filter(), &mut store, &mut fetcher);

        let report = session.run().await.unwrap();

        assert_eq!(report.pages_fetched, 1);
        assert_eq!(report.fetch_failures, 2);
        assert_eq!(report.budget_spent(), 3);
        // Failed pages are not marked as crawled
        assert!(!store.has_links(&url("/wiki/Missing")).unwrap());
    }

    #[tokio::test]
    async fn test_leaf_page_is_marked_crawled() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher =
            StaticFetcher::default().page("/wiki/Special:Search?search=cat", "");
        let session = SearchSession::new("cat", root(), 10, filter(), &mut store, &mut fetcher);

        let report = session.run().await.unwrap();

        assert_eq!(report.pages_fetched, 1);
        assert!(store.has_links(&root().to_string()).unwrap());
        assert!(store.get_links(&root().to_string()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_budget_fetches_nothing() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = cat_site();
        let session = SearchSession::new("cat", root(), 0, filter(), &mut store, &mut fetcher);

        let report = session.run().await.unwrap();

        assert_eq!(report.termination, TerminationReason::BudgetExhausted);
        assert_eq!(report.budget_spent(), 0);
        assert!(fetcher.requests.is_empty());
    }

    #[tokio::test]
    async fn test_second_search_reuses_link_records() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = cat_site();

        let first = SearchSession::new("cat", root(), 10, filter(), &mut store, &mut fetcher);
        first.run().await.unwrap();
        let requests_after_first = fetcher.requests.len();

        // Same root, different term: everything is already crawled
        let second = SearchSession::new("dog", root(), 10, filter(), &mut store, &mut fetcher);
        let report = second.run().await.unwrap();

        assert_eq!(fetcher.requests.len(), requests_after_first);
        assert_eq!(report.pages_fetched, 0);
        assert_eq!(report.cache_expansions, 4);
        assert_eq!(report.results, vec![(url("/wiki/Dog"), 3)]);
    }

    #[tokio::test]
    async fn test_cache_expansion_scores_for_new_term() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = cat_site();

        SearchSession::new("cat", root(), 10, filter(), &mut store, &mut fetcher)
            .run()
            .await
            .unwrap();

        let mut session = SearchSession::new("dog", root(), 10, filter(), &mut store, &mut fetcher);
        let step = session.step().await.unwrap();
        assert_eq!(
            step,
            Step::ExpandedFromCache {
                url: root().to_string(),
                children: 2
            }
        );

        // The root has no "dog" index entry, so only URL relevance counts
        let next = session.frontier().peek().unwrap();
        assert_eq!(next.url, url("/wiki/Dog"));
        assert_eq!(next.score, 0.5);
        assert_eq!(session.frontier().searches_performed(), 0);
    }

    #[tokio::test]
    async fn test_cached_cycle_terminates() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let a: BTreeSet<String> = [url("/wiki/B")].into();
        let b: BTreeSet<String> = [url("/wiki/A")].into();
        store.store_links(&url("/wiki/A"), &a).unwrap();
        store.store_links(&url("/wiki/B"), &b).unwrap();

        let mut fetcher = StaticFetcher::default();
        let start = Url::parse(&url("/wiki/A")).unwrap();
        let session = SearchSession::new("cat", start, 5, filter(), &mut store, &mut fetcher);

        let report = session.run().await.unwrap();

        assert_eq!(report.termination, TerminationReason::FrontierEmpty);
        assert_eq!(report.cache_expansions, 2);
        assert_eq!(report.skipped, 1);
        assert!(fetcher.requests.is_empty());
    }

    #[tokio::test]
    async fn test_fetches_never_exceed_budget() {
        for budget in 0..6 {
            let mut store = SqliteStorage::open_in_memory().unwrap();
            let mut fetcher = cat_site();
            let session =
                SearchSession::new("cat", root(), budget, filter(), &mut store, &mut fetcher);

            let report = session.run().await.unwrap();

            assert!(report.budget_spent() <= budget);
            assert!(fetcher.requests.len() <= budget as usize);
        }
    }

    #[tokio::test]
    async fn test_from_config_builds_root() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = StaticFetcher::default();
        let config = CrawlerConfig {
            budget: 3,
            search_url: "https://site.test/wiki/Special:Search?search={term}".to_string(),
            content_prefix: "/wiki/".to_string(),
            excluded_prefixes: vec![],
        };

        let session =
            SearchSession::from_config(&config, "black cat", &mut store, &mut fetcher).unwrap();

        assert_eq!(session.frontier().budget(), 3);
        assert_eq!(
            session.frontier().peek().unwrap().url,
            "https://site.test/wiki/Special:Search?search=black+cat"
        );
    }

    #[tokio::test]
    async fn test_punctuated_term_finds_indexed_pages() {
        for term in ["cat", "Cat.", "cat!", " CAT? "] {
            let mut store = SqliteStorage::open_in_memory().unwrap();
            let mut fetcher = StaticFetcher::default()
                .page("/wiki/Special:Search?search=cat", "<p>cat cat cat cat</p>");
            let session = SearchSession::new(term, root(), 1, filter(), &mut store, &mut fetcher);

            let report = session.run().await.unwrap();

            assert_eq!(report.results, vec![(root().to_string(), 4)], "term {:?}", term);
        }
    }

    #[tokio::test]
    async fn test_root_is_fetched_as_configured() {
        let mut store = SqliteStorage::open_in_memory().unwrap();
        let mut fetcher = StaticFetcher::default().page(
            "/wiki/Special:Search?search=cat&ref=home&source=box",
            "<p>cat cat cat</p>",
        );
        let config = CrawlerConfig {
            budget: 1,
            search_url: "https://site.test/wiki/Special:Search?search={term}&ref=home&source=box"
                .to_string(),
            content_prefix: "/wiki/".to_string(),
            excluded_prefixes: vec![],
        };
        let expected = url("/wiki/Special:Search?search=cat&ref=home&source=box");

        let session = SearchSession::from_config(&config, "cat", &mut store, &mut fetcher).unwrap();
        assert_eq!(session.frontier().peek().unwrap().url, expected);

        let report = session.run().await.unwrap();

        assert_eq!(fetcher.requests, vec![expected.clone()]);
        assert_eq!(report.results, vec![(expected, 3)]);
    }
}
