use serde::Deserialize;

/// Default search entry point; `{term}` is replaced with the encoded search term
pub const DEFAULT_SEARCH_URL: &str =
    "https://en.wikipedia.org/wiki/Special:Search?go=Go&search={term}&ns0=1";

/// Main configuration structure for Trawl-Rank
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub rank: RankSettings,
}

/// Crawl session configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of physical page fetches per search
    #[serde(default = "default_budget")]
    pub budget: u32,

    /// Search entry point template containing a `{term}` placeholder
    #[serde(rename = "search-url", default = "default_search_url")]
    pub search_url: String,

    /// Path prefix that marks a link as an on-site content page
    #[serde(rename = "content-prefix", default = "default_content_prefix")]
    pub content_prefix: String,

    /// Path prefixes of non-content pages (help, talk, templates, ...)
    #[serde(rename = "excluded-prefixes", default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,
}

/// HTTP fetcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Minimum time between two physical requests (milliseconds)
    #[serde(rename = "min-request-interval", default = "default_min_request_interval")]
    pub min_request_interval: u64,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Total attempts per URL, including the first one
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry (milliseconds), doubled for every further retry
    #[serde(rename = "retry-backoff", default = "default_retry_backoff")]
    pub retry_backoff: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            min_request_interval: default_min_request_interval(),
            timeout: default_timeout(),
            max_attempts: default_max_attempts(),
            retry_backoff: default_retry_backoff(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Global rank engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RankSettings {
    #[serde(default = "default_damping")]
    pub damping: f64,

    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    #[serde(rename = "max-iterations", default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            damping: default_damping(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_budget() -> u32 {
    100
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

fn default_content_prefix() -> String {
    "/wiki/".to_string()
}

fn default_excluded_prefixes() -> Vec<String> {
    [
        "/wiki/Wikipedia",
        "/wiki/Help",
        "/wiki/File",
        "/wiki/Special",
        "/wiki/Template",
        "/wiki/Talk",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_request_interval() -> u64 {
    1000
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_damping() -> f64 {
    0.85
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iterations() -> u32 {
    1000
}
