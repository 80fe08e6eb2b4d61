//! Crawler module for page fetching and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching through the page cache
//! - HTML scanning for frames, links and pattern matches
//! - Ranking of the hrefs worth following
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod ranking;

pub use coordinator::{run_crawl, Coordinator, CrawlLimits};
pub use fetcher::{
    build_http_client, resolve_scheme, FetchOptions, Fetcher, Page, SeedResolution,
};
pub use parser::{find_frames, find_links, find_pattern, parse_html, scan_page, ScannedPage};
pub use ranking::{ranking_score, HrefRecord, HrefTable};

use crate::config::Config;
use crate::output::CrawlReport;
use crate::CrawlError;

/// Crawls a single seed
///
/// This is the main entry point for one-off searches. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Resolve the seed to an https or http address
/// 3. Scan the seed, its frames and the ranked hrefs for the search patterns
///
/// # Example
///
/// ```no_run
/// use pattern_crawl::config::Config;
///
/// # async fn example() -> Result<(), pattern_crawl::CrawlError> {
/// let mut config = Config::default();
/// config.search.presets = vec!["zip".to_string()];
/// let report = pattern_crawl::crawler::crawl(config, "www.example.nl").await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: Config, seed: &str) -> Result<CrawlReport, CrawlError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.start(seed).await)
}
