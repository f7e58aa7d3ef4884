//! Crawl frontier: a budgeted max-priority queue of candidate URLs
//!
//! The frontier hands out the highest-scoring URL first. It also carries the
//! fetch budget of a search: once `searches_performed` reaches `budget`, every
//! pop reports [`Pop::Exhausted`] even if entries remain. The frontier never
//! counts a fetch by itself; the session calls [`Frontier::record_fetch`] when a
//! popped URL actually goes to the network.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

/// A URL waiting in the frontier
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// The URL to visit
    pub url: String,

    /// Priority score in `[0, 1]`, higher is visited first
    pub score: f64,

    /// Insertion order, used to break ties
    seq: u64,
}

// Higher scores are popped first; on equal scores the earlier insertion wins.
// The URL only separates entries that came from different frontiers.
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
            .then_with(|| self.url.cmp(&other.url))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FrontierEntry {}

/// Outcome of [`Frontier::pop_highest`]
#[derive(Debug, Clone, PartialEq)]
pub enum Pop {
    /// The highest-scoring entry
    Entry(FrontierEntry),

    /// Nothing left to visit
    Empty,

    /// The fetch budget is spent
    Exhausted,
}

/// Budgeted priority queue of URLs to visit
#[derive(Debug)]
pub struct Frontier {
    term: String,
    heap: BinaryHeap<FrontierEntry>,
    budget: u32,
    searches_performed: u32,
    next_seq: u64,
}

impl Frontier {
    /// Creates an empty frontier for `term` allowing `budget` fetches
    pub fn new(term: impl Into<String>, budget: u32) -> Self {
        Self {
            term: term.into(),
            heap: BinaryHeap::new(),
            budget,
            searches_performed: 0,
            next_seq: 0,
        }
    }

    /// Adds a URL with the given score
    ///
    /// Scores are expected in `[0, 1]` and are not validated. The same URL may
    /// be queued more than once.
    pub fn push(&mut self, url: impl Into<String>, score: f64) {
        let entry = FrontierEntry {
            url: url.into(),
            score,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.heap.push(entry);
    }

    /// Removes and returns the highest-scoring entry, unless the budget is spent
    pub fn pop_highest(&mut self) -> Pop {
        if self.is_exhausted() {
            return Pop::Exhausted;
        }

        match self.heap.pop() {
            Some(entry) => Pop::Entry(entry),
            None => Pop::Empty,
        }
    }

    /// Returns the highest-scoring entry without removing it
    pub fn peek(&self) -> Option<&FrontierEntry> {
        self.heap.peek()
    }

    /// Counts one physical fetch against the budget
    pub fn record_fetch(&mut self) {
        debug_assert!(
            self.searches_performed < self.budget,
            "fetch recorded past the budget"
        );
        self.searches_performed = self.searches_performed.saturating_add(1);
    }

    /// Returns true once no more fetches are allowed
    pub fn is_exhausted(&self) -> bool {
        self.searches_performed >= self.budget
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn searches_performed(&self) -> u32 {
        self.searches_performed
    }

    pub fn remaining_budget(&self) -> u32 {
        self.budget.saturating_sub(self.searches_performed)
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl fmt::Display for Frontier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Frontier for '{}' with {} of {} pages searched. Next page: ",
            self.term, self.searches_performed, self.budget
        )?;
        match self.peek() {
            Some(next) => write!(f, "{} ({:.3})", next.url, next.score),
            None => write!(f, "none"),
        }
    }
}
