use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for the crawler
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    /// Overrides for the built-in selector table, keyed by selector name
    #[serde(default)]
    pub selectors: BTreeMap<String, String>,
}

/// How far the discovery walk goes before detail fetching starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryPolicy {
    /// Walk every listing page before fetching details
    #[default]
    Full,
    /// Stop walking once enough pending candidates exist for the target count
    EarlyStop,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Listing index URL the discovery walk starts from
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Additional listing seeds walked after the base URL
    #[serde(rename = "extra-seeds", default)]
    pub extra_seeds: Vec<String>,

    /// Number of detail records to scrape in one run
    #[serde(rename = "target-count")]
    pub target_count: usize,

    /// Continue from the persisted ledger instead of starting empty
    #[serde(default = "default_resume")]
    pub resume: bool,

    #[serde(rename = "discovery-policy", default)]
    pub discovery_policy: DiscoveryPolicy,

    /// Hosts detail links must belong to; empty means no restriction
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Upper bound for a single page load (seconds)
    #[serde(rename = "page-timeout-secs", default = "default_page_timeout")]
    pub page_timeout_secs: u64,

    /// Upper bound for waiting on a readiness selector (seconds)
    #[serde(rename = "ready-timeout-secs", default = "default_ready_timeout")]
    pub ready_timeout_secs: u64,

    /// Ceiling for a whole run (seconds); 0 disables it
    #[serde(rename = "run-timeout-secs", default = "default_run_timeout")]
    pub run_timeout_secs: u64,

    /// Maximum listing pages per seed; 0 means unbounded
    #[serde(rename = "max-listing-pages", default)]
    pub max_listing_pages: usize,
}

impl CrawlerConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    /// Returns the run ceiling, or None when disabled
    pub fn run_timeout(&self) -> Option<Duration> {
        (self.run_timeout_secs > 0).then(|| Duration::from_secs(self.run_timeout_secs))
    }

    /// All listing seeds in walk order, base URL first
    pub fn seeds(&self) -> Vec<String> {
        std::iter::once(self.base_url.clone())
            .chain(self.extra_seeds.iter().cloned())
            .collect()
    }
}

/// HTTP 429 handling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Lower bound of the randomized wait after a 429 (milliseconds)
    #[serde(rename = "min-wait-ms", default = "default_min_wait")]
    pub min_wait_ms: u64,

    /// Upper bound of the randomized wait after a 429 (milliseconds)
    #[serde(rename = "max-wait-ms", default = "default_max_wait")]
    pub max_wait_ms: u64,

    /// Request-level retries before a 429 is surfaced as a failure
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed wait before a crawl-internal retry of a detail fetch (milliseconds)
    #[serde(rename = "crawl-retry-wait-ms", default = "default_crawl_retry_wait")]
    pub crawl_retry_wait_ms: u64,

    /// Crawl-internal retries of a rate-limited detail fetch
    #[serde(rename = "crawl-retries", default = "default_crawl_retries")]
    pub crawl_retries: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_wait_ms: default_min_wait(),
            max_wait_ms: default_max_wait(),
            max_retries: default_max_retries(),
            crawl_retry_wait_ms: default_crawl_retry_wait(),
            crawl_retries: default_crawl_retries(),
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

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory holding the ledger, status log and record file
    pub directory: PathBuf,

    #[serde(rename = "ledger-file", default = "default_ledger_file")]
    pub ledger_file: String,

    #[serde(rename = "log-file", default = "default_log_file")]
    pub log_file: String,

    #[serde(rename = "records-file", default = "default_records_file")]
    pub records_file: String,
}

impl OutputConfig {
    pub fn ledger_path(&self) -> PathBuf {
        self.directory.join(&self.ledger_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.directory.join(&self.log_file)
    }

    pub fn records_path(&self) -> PathBuf {
        self.directory.join(&self.records_file)
    }
}

fn default_resume() -> bool {
    true
}

fn default_page_timeout() -> u64 {
    30
}

fn default_ready_timeout() -> u64 {
    10
}

fn default_run_timeout() -> u64 {
    6 * 60 * 60
}

fn default_min_wait() -> u64 {
    30_000
}

fn default_max_wait() -> u64 {
    90_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_crawl_retry_wait() -> u64 {
    60_000
}

fn default_crawl_retries() -> u32 {
    1
}

fn default_ledger_file() -> String {
    "crawl_progress.json".to_string()
}

fn default_log_file() -> String {
    "crawl_status.log".to_string()
}

fn default_records_file() -> String {
    "restaurants.json".to_string()
}
