//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding and draining the frontier
//! - Coordinating fetching, extraction, and link discovery
//! - Persisting crawled records and recording the crawl run
//! - Enforcing the page limit and the politeness delay

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchError};
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::parser::{Extractor, HtmlExtractor};
use crate::storage::{CrawledRecord, PutOutcome, RecordStore, SqliteStore};
use crate::url::{normalize_url, LinkMatcher};
use crate::SearchEngineError;
use chrono::Utc;
use reqwest::Client;
use std::path::Path;
use std::time::{Duration, Instant};

/// Result of processing one dequeued URL
#[derive(Debug)]
pub enum UrlOutcome {
    /// The page was fetched and extracted
    Fetched {
        record: CrawledRecord,
        /// Absolute links found on the page, in document order
        links: Vec<String>,
    },

    /// The page could not be fetched and is skipped
    Skipped { reason: FetchError },
}

/// Counters for a finished crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Crawl run id in the record store, if the run could be recorded
    pub run_id: Option<i64>,
    /// URLs fetched and extracted successfully
    pub processed: u64,
    /// URLs skipped because of a fetch failure
    pub skipped: u64,
    /// Fetched records the store failed to persist
    pub store_failures: u64,
    /// Records that overwrote an earlier record for the same URL
    pub replaced: u64,
    /// Links accepted into the frontier
    pub enqueued: u64,
    /// URLs still waiting when the loop stopped
    pub remaining: usize,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: RecordStore = SqliteStore> {
    store: S,
    frontier: Frontier,
    client: Client,
    extractor: Box<dyn Extractor>,
    max_urls: u64,
    delay: Duration,
}

impl Coordinator<SqliteStore> {
    /// Creates a coordinator backed by the configured SQLite record store
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(SearchEngineError)` - Failed to open the store or build the client
    pub fn new(config: &Config) -> Result<Self, SearchEngineError> {
        let store = SqliteStore::new(Path::new(&config.storage.database_path))?;
        Self::with_store(config, store)
    }
}

impl<S: RecordStore> Coordinator<S> {
    /// Creates a coordinator that persists into `store`
    pub fn with_store(config: &Config, store: S) -> Result<Self, SearchEngineError> {
        let matcher = LinkMatcher::new(&config.crawler.accept_patterns)?;
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        let extractor = HtmlExtractor::new(&config.extraction)?;

        Ok(Self {
            store,
            frontier: Frontier::new(matcher),
            client,
            extractor: Box::new(extractor),
            max_urls: u64::from(config.crawler.max_urls),
            delay: Duration::from_millis(config.crawler.crawl_delay_ms),
        })
    }

    /// Replaces the default HTML extractor
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs the main crawl loop from `seed`
    ///
    /// The loop stops when the frontier is empty or when `max-urls` pages have
    /// been processed successfully. Fetch failures are logged and skipped; they
    /// never end the run and do not count toward the limit.
    ///
    /// # Errors
    ///
    /// Only a malformed seed URL is an error. Store failures are logged and
    /// counted in the report.
    pub async fn run(
        &mut self,
        seed: &str,
        config_hash: &str,
    ) -> Result<CrawlReport, SearchEngineError> {
        let seed_url = normalize_url(seed)?;
        self.frontier.enqueue(seed_url.as_str());

        let mut report = CrawlReport {
            run_id: match self.store.create_run(seed_url.as_str(), config_hash) {
                Ok(id) => Some(id),
                Err(e) => {
                    tracing::warn!("Could not record crawl run: {}", e);
                    None
                }
            },
            ..CrawlReport::default()
        };

        tracing::info!(
            "Starting crawl from {} (limit {} pages, delay {:?})",
            seed_url,
            self.max_urls,
            self.delay
        );

        let start_time = Instant::now();
        let mut attempts: u64 = 0;

        while report.processed < self.max_urls {
            let task = match self.frontier.next() {
                Some(t) => t,
                None => {
                    tracing::info!("Frontier is empty, crawl complete");
                    break;
                }
            };

            if attempts > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            attempts += 1;

            tracing::debug!("Processing URL #{}: {}", task.order, task.url);

            match self.process_url(&task).await {
                UrlOutcome::Fetched { record, links } => {
                    self.persist(&record, &mut report);

                    for link in &links {
                        if self.frontier.offer(link) {
                            report.enqueued += 1;
                        }
                    }

                    report.processed += 1;

                    // Progress reporting every 10 pages
                    if report.processed % 10 == 0 {
                        let rate = report.processed as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages processed, {} skipped, {} in frontier, {:.2} pages/sec",
                            report.processed,
                            report.skipped,
                            self.frontier.len(),
                            rate
                        );
                    }
                }
                UrlOutcome::Skipped { reason } => {
                    tracing::warn!("Skipping {}: {}", task.url, reason);
                    report.skipped += 1;
                }
            }
        }

        report.remaining = self.frontier.len();

        if let Some(run_id) = report.run_id {
            if let Err(e) = self
                .store
                .complete_run(run_id, report.processed, report.skipped)
            {
                tracing::warn!("Could not finish crawl run {}: {}", run_id, e);
            }
        }

        tracing::info!(
            "Crawl completed: {} processed, {} skipped, {} store failures in {:?}",
            report.processed,
            report.skipped,
            report.store_failures,
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Fetches and extracts a single URL
    async fn process_url(&self, task: &CrawlTask) -> UrlOutcome {
        let page = match fetch_page(&self.client, &task.url).await {
            Ok(page) => page,
            Err(reason) => return UrlOutcome::Skipped { reason },
        };

        let extracted = self.extractor.extract(&page.body, &page.final_url);

        UrlOutcome::Fetched {
            record: CrawledRecord {
                url: task.url.clone(),
                title: extracted.title,
                description: extracted.description,
                keywords: extracted.keywords,
                detail: extracted.detail,
                content: extracted.content,
                fetched_at: Utc::now().timestamp_millis(),
            },
            links: extracted.links,
        }
    }

    fn persist(&mut self, record: &CrawledRecord, report: &mut CrawlReport) {
        match self.store.put(record) {
            Ok(PutOutcome::Inserted) => {}
            Ok(PutOutcome::Replaced) => {
                tracing::debug!("Replaced existing record for {}", record.url);
                report.replaced += 1;
            }
            Err(e) => {
                tracing::error!("Failed to store record for {}: {}", record.url, e);
                report.store_failures += 1;
            }
        }
    }
}

/// Runs a complete crawl against the configured record store
pub async fn run_crawl(
    config: &Config,
    seed: &str,
    config_hash: &str,
) -> Result<CrawlReport, SearchEngineError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run(seed, config_hash).await
}
