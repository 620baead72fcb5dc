//! Crawler module: the focused crawl engine
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry, backoff, and politeness delays
//! - HTML extraction of clean text and same-domain links
//! - The BFS frontier with duplicate suppression
//! - Overall crawl coordination and reporting

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;

pub use coordinator::{run_crawl, Coordinator, CrawlReport, StopSignal, Termination};
pub use extractor::{extract_page, ChildLink, ExtractedPage};
pub use fetcher::{BlockReason, FetchErrorKind, FetchResult, Fetcher};
pub use frontier::{Frontier, FrontierEntry, Offer};

use crate::config::Config;
use crate::RockpoolError;

/// Runs a complete crawl operation
///
/// This is the main entry point for library callers. It will:
/// 1. Validate the configuration
/// 2. Seed the frontier with the root URL
/// 3. Crawl breadth-first within the depth and page bounds
/// 4. Append each fetched page to the configured stores
/// 5. Return a report of what was stored and skipped
///
/// Callers that need cancellation should use [`run_crawl`] with their own
/// [`StopSignal`].
///
/// # Arguments
///
/// * `config` - The crawl configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl ran to termination
/// * `Err(RockpoolError)` - Invalid configuration or storage failure
pub async fn crawl(config: Config) -> Result<CrawlReport, RockpoolError> {
    run_crawl(config, StopSignal::new()).await
}
