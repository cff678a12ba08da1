//! Crawl frontier: the to-visit queue and the seen-URL set
//!
//! The frontier is owned by a single crawl run and lives only in memory. URLs
//! are handed out in the order they were accepted, which makes the crawl a
//! breadth-first traversal from the seed.

use crate::url::{normalize_url, LinkMatcher};
use std::collections::{HashSet, VecDeque};

/// A URL accepted into the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// Normalized URL to fetch
    pub url: String,

    /// 0-based position in discovery order
    pub order: u64,
}

/// FIFO queue of URLs to visit plus the set of every URL ever enqueued
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    seen: HashSet<String>,
    matcher: LinkMatcher,
    next_order: u64,
}

impl Frontier {
    /// Creates an empty frontier that follows links matching `matcher`
    pub fn new(matcher: LinkMatcher) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            matcher,
            next_order: 0,
        }
    }

    /// Normalizes `url` and appends it to the queue
    ///
    /// Malformed URLs and URLs that were already enqueued once (even if they
    /// have since been dequeued) are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the URL was added
    pub fn enqueue(&mut self, url: &str) -> bool {
        let normalized = match normalize_url(url) {
            Ok(u) => String::from(u),
            Err(e) => {
                tracing::trace!("Ignoring malformed URL {}: {}", url, e);
                return false;
            }
        };

        if !self.seen.insert(normalized.clone()) {
            return false;
        }

        self.queue.push_back(CrawlTask {
            url: normalized,
            order: self.next_order,
        });
        self.next_order += 1;
        true
    }

    /// Returns true if the whole URL matches one of the accept patterns
    pub fn accept_link(&self, url: &str) -> bool {
        self.matcher.matches(url)
    }

    /// Enqueues a discovered link if it passes the accept patterns
    ///
    /// # Returns
    ///
    /// `true` if the link was accepted and was not seen before
    pub fn offer(&mut self, url: &str) -> bool {
        self.accept_link(url) && self.enqueue(url)
    }

    /// Returns true if `url` (after normalization) was ever enqueued
    pub fn contains(&self, url: &str) -> bool {
        normalize_url(url)
            .map(|u| self.seen.contains(u.as_str()))
            .unwrap_or(false)
    }

    /// Number of URLs waiting to be visited
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs ever enqueued
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// URLs currently waiting, in visiting order
    pub fn pending(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(|t| t.url.as_str())
    }
}

/// Dequeues the earliest-enqueued URL; `None` once the queue is empty
impl Iterator for Frontier {
    type Item = CrawlTask;

    fn next(&mut self) -> Option<CrawlTask> {
        self.queue.pop_front()
    }
}
