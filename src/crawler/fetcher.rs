//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - A per-fetcher rate limiter enforcing a minimum interval between requests
//! - Bounded retry with exponential backoff for transient failures
//! - Error classification

use crate::config::{FetcherConfig, UserAgentConfig};
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use url::Url;

/// Maximum redirect hops followed for a single request
const MAX_REDIRECTS: usize = 10;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Expected HTML from {url}, got {content_type}")]
    ContentMismatch { url: String, content_type: String },
}

impl FetchError {
    /// Returns true if another attempt may succeed
    ///
    /// | Condition | Retry |
    /// |-----------|-------|
    /// | HTTP 429, HTTP 5xx | yes |
    /// | Timeout, network error | yes |
    /// | Other HTTP status | no |
    /// | Non-HTML content | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
            }
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::ContentMismatch { .. } => false,
        }
    }
}

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects, used to resolve relative links
    pub final_url: Url,

    /// Page body
    pub body: String,
}

/// Source of HTML pages for a crawl session
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetches `url`, returning the page body or the reason it failed
    async fn fetch(&mut self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Monotonic "next allowed time" gate between physical requests
///
/// Each fetcher owns its own limiter, so independent sessions and tests do not
/// throttle one another.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    next_allowed: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: None,
        }
    }

    /// Waits until a request is allowed, then reserves the next slot
    pub async fn acquire(&mut self) {
        if let Some(wait) = self.time_until_ready(Instant::now()) {
            tracing::trace!("Rate limiter sleeping for {:?}", wait);
            tokio::time::sleep(wait).await;
        }
        self.next_allowed = Some(Instant::now() + self.min_interval);
    }

    /// Returns how long a request made at `now` would have to wait
    pub fn time_until_ready(&self, now: Instant) -> Option<Duration> {
        self.next_allowed
            .filter(|next| *next > now)
            .map(|next| next - now)
    }
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &FetcherConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.retry_backoff),
        }
    }

    /// Delay before retry number `retry` (1-based), doubling each time
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Per-request timeout
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use trawl_rank::config::UserAgentConfig;
/// use trawl_rank::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "TrawlRank".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited HTTP fetcher with retries
pub struct HttpFetcher {
    client: Client,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(client: Client, limiter: RateLimiter, retry: RetryPolicy) -> Self {
        Self {
            client,
            limiter,
            retry,
        }
    }

    /// Builds a fetcher from configuration
    pub fn from_config(
        fetcher: &FetcherConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, Duration::from_secs(fetcher.timeout))?;
        Ok(Self::new(
            client,
            RateLimiter::new(Duration::from_millis(fetcher.min_request_interval)),
            RetryPolicy::from_config(fetcher),
        ))
    }

    /// Performs a single rate-limited request
    async fn fetch_once(&mut self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.limiter.acquire().await;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // A missing Content-Type is accepted as HTML
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/html")
            .to_string();

        if !content_type.contains("text/html") {
            return Err(FetchError::ContentMismatch {
                url: url.to_string(),
                content_type,
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage { final_url, body })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&mut self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut attempt = 1;
        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff(attempt);
                    tracing::debug!(
                        "Attempt {}/{} for {} failed ({}), retrying in {:?}",
                        attempt,
                        self.retry.max_attempts,
                        url,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Maps a reqwest error onto a fetch error
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = error.status() {
        FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
