//! Robots.txt policy gate
//!
//! The gate answers allow/deny for canonical URLs, fetching and caching
//! robots.txt once per origin. Policy choices:
//!
//! - Fetch failure (network error or non-2xx) caches an allow-all entry, so
//!   absence of robots data never blocks a crawl and the fetch is not
//!   retried.
//! - An explicit ignore-robots flag short-circuits every check to allow.
//! - Crawl-delay directives are surfaced so the fetch loop can widen its
//!   per-host politeness gap.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::RobotsRules;

use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Timeout for robots.txt requests, kept short so a dead robots endpoint
/// does not stall the first fetch on each origin
const ROBOTS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-job robots.txt gate with a lazy per-origin cache
pub struct RobotsGate {
    client: Client,
    user_agent: String,
    ignore_robots: bool,
    cache: HashMap<String, CachedRobots>,
}

impl RobotsGate {
    /// Creates a new gate
    ///
    /// # Arguments
    ///
    /// * `user_agent` - The identifying user-agent string, used both for the
    ///   robots.txt request itself and for rule group matching
    /// * `ignore_robots` - When set, `allowed` always returns true
    pub fn new(user_agent: &str, ignore_robots: bool) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent.to_string())
            .timeout(ROBOTS_FETCH_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            user_agent: user_agent.to_string(),
            ignore_robots,
            cache: HashMap::new(),
        })
    }

    /// Checks whether a URL may be fetched
    ///
    /// The first query for an origin fetches `<origin>/robots.txt`; later
    /// queries hit the cache.
    pub async fn allowed(&mut self, url: &Url) -> bool {
        if self.ignore_robots {
            return true;
        }

        let origin = origin_key(url);
        self.ensure_cached(&origin, url).await;

        self.cache
            .get(&origin)
            .map(|entry| entry.rules.is_allowed(url.as_str(), &self.user_agent))
            .unwrap_or(true)
    }

    /// Returns the site-requested crawl delay for the URL's origin, if any
    pub async fn crawl_delay(&mut self, url: &Url) -> Option<Duration> {
        if self.ignore_robots {
            return None;
        }

        let origin = origin_key(url);
        self.ensure_cached(&origin, url).await;

        self.cache
            .get(&origin)
            .and_then(|entry| entry.rules.crawl_delay(&self.user_agent))
    }

    /// Returns how many origins have cached robots data
    pub fn cached_origins(&self) -> usize {
        self.cache.len()
    }

    /// Fetches and caches robots.txt for an origin if not already present
    async fn ensure_cached(&mut self, origin: &str, url: &Url) {
        if self.cache.contains_key(origin) {
            return;
        }

        let rules = match url.join("/robots.txt") {
            Ok(robots_url) => self.fetch_rules(robots_url).await,
            Err(_) => RobotsRules::allow_all(),
        };

        self.cache
            .insert(origin.to_string(), CachedRobots::new(rules));
    }

    /// Fetches robots.txt, mapping every failure mode to allow-all
    async fn fetch_rules(&self, robots_url: Url) -> RobotsRules {
        tracing::debug!("Fetching robots.txt: {}", robots_url);

        match self.client.get(robots_url.clone()).send().await {
            Ok(response) if response.status().is_success() => match response.text().await {
                Ok(body) => RobotsRules::from_content(&body),
                Err(e) => {
                    tracing::debug!("Failed to read robots.txt body from {}: {}", robots_url, e);
                    RobotsRules::allow_all()
                }
            },
            Ok(response) => {
                tracing::debug!(
                    "robots.txt at {} returned {}, allowing all",
                    robots_url,
                    response.status()
                );
                RobotsRules::allow_all()
            }
            Err(e) => {
                tracing::debug!("Failed to fetch robots.txt from {}: {}", robots_url, e);
                RobotsRules::allow_all()
            }
        }
    }
}

/// Cache key for a URL's origin (scheme + host + port)
fn origin_key(url: &Url) -> String {
    url.origin().ascii_serialization()
}
