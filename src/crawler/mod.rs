//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The frontier (FIFO queue, seen set and link acceptance)
//! - HTTP fetching
//! - HTML field and link extraction
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, Coordinator, CrawlReport, UrlOutcome};
pub use fetcher::{build_http_client, fetch_page, FetchError, FetchedPage};
pub use frontier::{CrawlTask, Frontier};
pub use parser::{ExtractedPage, Extractor, HtmlExtractor};

use crate::config::Config;
use crate::SearchEngineError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the record store
/// 2. Record a new crawl run
/// 3. Build the HTTP client
/// 4. Fetch pages breadth-first from the seed
/// 5. Extract fields and follow accepted links
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `seed` - The URL the crawl starts from
/// * `config_hash` - Hash of the configuration file, stored with the run
pub async fn crawl(
    config: &Config,
    seed: &str,
    config_hash: &str,
) -> Result<CrawlReport, SearchEngineError> {
    run_crawl(config, seed, config_hash).await
}
