//! Crawl coordinator - main crawl orchestration logic
//!
//! One coordinator owns everything a single crawl job needs: the frontier,
//! the fetcher with its politeness bookkeeping, the robots gate with its
//! cache, and the page stores. The loop is strictly sequential; cancellation
//! is checked between iterations only, so persisted state always reflects
//! fully completed fetches.

use crate::config::{validate, Config};
use crate::crawler::extractor::extract_page;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry, Offer};
use crate::robots::RobotsGate;
use crate::storage::{JsonlStore, PageRecord, PageStore, SqliteStore};
use crate::url::{canonicalize, normalize_url, DomainScope};
use crate::RockpoolError;
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// Cloneable handle for requesting early termination of a crawl
///
/// The coordinator checks the signal between frontier iterations, never
/// mid-fetch. Callers keep a clone and flip it from another task or thread.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Creates a fresh, unset signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests termination
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns whether termination has been requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The frontier drained
    FrontierExhausted,

    /// The page budget was consumed; remaining entries were discarded
    PageBudgetReached,

    /// A stop was requested through the [`StopSignal`]
    Cancelled,
}

/// Summary of a finished crawl
///
/// Per-URL failures never fail the job; they show up here as counts instead.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Pages successfully fetched and persisted
    pub pages_stored: u32,

    /// URLs that failed after exhausting retries
    pub failed: u32,

    /// URLs skipped because robots.txt disallowed them
    pub robots_skipped: u32,

    /// Responses refused (wrong content type, oversized body)
    pub blocked: u32,

    /// Redirect responses routed back through the frontier
    pub redirects_followed: u32,

    /// Links discovered beyond the depth bound (never enqueued)
    pub beyond_depth: u32,

    /// Frontier entries discarded when the crawl stopped early
    pub frontier_discarded: u32,

    /// Unique canonical URLs seen (enqueued or fetched)
    pub urls_seen: u32,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,

    /// Why the crawl stopped
    pub termination: Termination,
}

/// Running counters, folded into the final [`CrawlReport`]
#[derive(Debug, Default)]
struct CrawlStats {
    pages_stored: u32,
    failed: u32,
    robots_skipped: u32,
    blocked: u32,
    redirects_followed: u32,
    beyond_depth: u32,
}

/// Main crawl coordinator
pub struct Coordinator {
    config: Config,
    scope: DomainScope,
    frontier: Frontier,
    fetcher: Fetcher,
    robots: RobotsGate,
    stores: Vec<Box<dyn PageStore>>,
    stop: StopSignal,
}

impl Coordinator {
    /// Creates a coordinator for one crawl job
    ///
    /// Validates the configuration, canonicalizes the root URL, derives the
    /// domain scope, builds the HTTP clients, and opens the page stores.
    /// This is the only place a crawl can fail before any fetch.
    ///
    /// # Arguments
    ///
    /// * `config` - The crawl configuration
    /// * `stop` - Cancellation handle checked between iterations
    pub fn new(config: Config, stop: StopSignal) -> Result<Self, RockpoolError> {
        validate(&config)?;

        let root = normalize_url(&config.crawl.root_url)?;
        let scope = DomainScope::from_root_url(&root, config.crawl.include_subdomains)?;

        let user_agent = config.user_agent.header_value();
        let fetcher = Fetcher::new(config.fetch.clone(), &config.user_agent)?;
        let robots = RobotsGate::new(&user_agent, config.fetch.ignore_robots)?;

        let mut stores: Vec<Box<dyn PageStore>> = vec![Box::new(JsonlStore::open(Path::new(
            &config.output.pages_path,
        ))?)];
        if let Some(db_path) = &config.output.database_path {
            stores.push(Box::new(SqliteStore::open(Path::new(db_path))?));
        }

        let mut frontier = Frontier::new(config.crawl.max_depth);
        frontier.seed(root);

        Ok(Self {
            config,
            scope,
            frontier,
            fetcher,
            robots,
            stores,
            stop,
        })
    }

    /// Runs the crawl loop to completion
    ///
    /// Pops frontier entries in BFS order, gates each through robots.txt,
    /// fetches, extracts, persists, and feeds discovered links back into the
    /// frontier. Stops when the frontier drains, the page budget is reached,
    /// or cancellation is requested, whichever comes first.
    pub async fn run(&mut self) -> Result<CrawlReport, RockpoolError> {
        let started = Instant::now();
        let mut stats = CrawlStats::default();

        tracing::info!(
            "Starting crawl of {} (max {} pages, depth {})",
            self.scope.root_host(),
            self.config.crawl.max_pages,
            self.config.crawl.max_depth
        );

        let termination = loop {
            if self.stop.is_stopped() {
                tracing::info!("Stop requested, ending crawl");
                break Termination::Cancelled;
            }

            if stats.pages_stored >= self.config.crawl.max_pages {
                tracing::info!(
                    "Page budget of {} reached, discarding {} frontier entries",
                    self.config.crawl.max_pages,
                    self.frontier.len()
                );
                break Termination::PageBudgetReached;
            }

            let entry = match self.frontier.pop() {
                Some(entry) => entry,
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    break Termination::FrontierExhausted;
                }
            };

            self.process_entry(&entry, &mut stats).await?;

            let handled = stats.pages_stored + stats.failed + stats.robots_skipped + stats.blocked;
            if handled > 0 && handled % 10 == 0 {
                tracing::info!(
                    "Progress: {} pages stored, {} in frontier, {:.2} pages/sec",
                    stats.pages_stored,
                    self.frontier.len(),
                    stats.pages_stored as f64 / started.elapsed().as_secs_f64()
                );
            }
        };

        let report = CrawlReport {
            pages_stored: stats.pages_stored,
            failed: stats.failed,
            robots_skipped: stats.robots_skipped,
            blocked: stats.blocked,
            redirects_followed: stats.redirects_followed,
            beyond_depth: stats.beyond_depth,
            frontier_discarded: self.frontier.len() as u32,
            urls_seen: self.frontier.visited_count() as u32,
            elapsed: started.elapsed(),
            termination,
        };

        tracing::info!(
            "Crawl finished: {} pages stored, {} failed, {} robots-skipped in {:?}",
            report.pages_stored,
            report.failed,
            report.robots_skipped,
            report.elapsed
        );

        Ok(report)
    }

    /// Processes one frontier entry
    ///
    /// Per-URL failures are absorbed into the stats; only storage write
    /// errors propagate, since silently losing pages would defeat the job.
    async fn process_entry(
        &mut self,
        entry: &FrontierEntry,
        stats: &mut CrawlStats,
    ) -> Result<(), RockpoolError> {
        if !self.robots.allowed(&entry.url).await {
            tracing::debug!("Disallowed by robots.txt: {}", entry.url);
            stats.robots_skipped += 1;
            return Ok(());
        }

        let host_delay = self.effective_host_delay(&entry.url).await;

        match self.fetcher.fetch(&entry.url, host_delay).await {
            FetchResult::Success {
                body,
                truncated,
                final_url,
                ..
            } => {
                if truncated {
                    tracing::warn!("Body of {} truncated at byte cap", entry.url);
                }

                let page = extract_page(
                    &body,
                    &final_url,
                    &self.scope,
                    &self.config.crawl.keywords,
                );

                let record = PageRecord {
                    url: entry.url.as_str().to_string(),
                    depth: entry.depth,
                    title: page.title,
                    text: page.text,
                    fetched_at: Utc::now(),
                };

                for store in &mut self.stores {
                    store.append(&record)?;
                }
                stats.pages_stored += 1;

                tracing::debug!("Stored {} (depth {})", entry.url, entry.depth);

                for link in page.links {
                    if let Offer::BeyondDepth =
                        self.frontier.offer(link.url, entry.depth + 1, link.keyword_hit)
                    {
                        stats.beyond_depth += 1;
                    }
                }
            }

            FetchResult::Redirected { new_url } => {
                stats.redirects_followed += 1;
                self.handle_redirect(entry, &new_url);
            }

            FetchResult::Blocked { reason } => {
                tracing::debug!("Skipping {}: {}", entry.url, reason);
                stats.blocked += 1;
            }

            FetchResult::Failed { kind, attempts } => {
                tracing::warn!(
                    "Giving up on {} after {} attempt(s): {}",
                    entry.url,
                    attempts,
                    kind
                );
                stats.failed += 1;
            }
        }

        Ok(())
    }

    /// Routes a redirect target back through the frontier
    ///
    /// The target re-enters at the redirecting entry's depth: a redirect is
    /// the same document moving, not a link away from it. Loops die in the
    /// visited set; off-scope targets are dropped like any other link.
    fn handle_redirect(&mut self, entry: &FrontierEntry, new_url: &str) {
        match canonicalize(new_url, &entry.url, &self.scope) {
            Some(target) => {
                tracing::debug!("Redirect: {} -> {}", entry.url, target);
                self.frontier.offer(target, entry.depth, entry.keyword_hit);
            }
            None => {
                tracing::debug!(
                    "Dropping redirect from {} to out-of-scope target {}",
                    entry.url,
                    new_url
                );
            }
        }
    }

    /// Computes the per-host request gap for a URL
    ///
    /// The configured politeness delay, widened by the site's robots.txt
    /// crawl-delay when one is declared.
    async fn effective_host_delay(&mut self, url: &Url) -> Duration {
        let politeness = self.config.fetch.politeness_delay();
        match self.robots.crawl_delay(url).await {
            Some(crawl_delay) => politeness.max(crawl_delay),
            None => politeness,
        }
    }
}

/// Runs a complete crawl for the given configuration
///
/// # Arguments
///
/// * `config` - The crawl configuration
/// * `stop` - Cancellation handle; pass a fresh one if cancellation is not
///   needed
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl ran to termination (early stops included)
/// * `Err(RockpoolError)` - Invalid configuration or a storage failure
pub async fn run_crawl(config: Config, stop: StopSignal) -> Result<CrawlReport, RockpoolError> {
    let mut coordinator = Coordinator::new(config, stop)?;
    coordinator.run().await
}
