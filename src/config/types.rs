use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Rockpool
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawl bounds and scope configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Starting URL; the crawl domain is derived from its host
    #[serde(rename = "root-url")]
    pub root_url: String,

    /// Keywords used to prioritize links within a depth level
    /// (empty = no prioritization). Lowercased on load.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Maximum number of successfully fetched pages
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum BFS depth from the root URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Whether subdomains of the root host are in scope
    #[serde(rename = "include-subdomains", default)]
    pub include_subdomains: bool,
}

/// Fetch behavior configuration
///
/// Every field has a default, so the `[fetch]` section can be omitted
/// entirely. Each of these tunables can also be overridden through the
/// environment (see the config parser).
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms", default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Minimum delay between consecutive requests to the same host
    /// (milliseconds)
    #[serde(rename = "politeness-delay-ms", default = "default_politeness_delay_ms")]
    pub politeness_delay_ms: u64,

    /// Number of retries after a transient failure
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Response body byte cap; larger bodies are truncated and flagged
    #[serde(rename = "max-body-bytes", default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Skip all robots.txt checks (testing escape hatch, off by default)
    #[serde(rename = "ignore-robots", default)]
    pub ignore_robots: bool,
}

impl FetchConfig {
    /// Per-request timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Politeness delay as a Duration
    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            politeness_delay_ms: default_politeness_delay_ms(),
            max_retries: default_max_retries(),
            max_body_bytes: default_max_body_bytes(),
            ignore_robots: false,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    25_000
}

fn default_politeness_delay_ms() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
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

impl UserAgentConfig {
    /// Formats the identifying user-agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the JSONL pages file
    #[serde(rename = "pages-path")]
    pub pages_path: String,

    /// Optional path to a SQLite database mirroring the pages
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}
