//! Topic-Search: a polite single-site crawler with a boolean full-text index
//!
//! This crate crawls a bounded set of pages from a seed site, persists the
//! extracted document fields, builds an inverted index from those records and
//! answers paginated AND/OR/NOT queries against it.

pub mod config;
pub mod crawler;
pub mod index;
pub mod search;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Topic-Search operations
#[derive(Debug, Error)]
pub enum SearchEngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] crawler::FetchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Index error: {0}")]
    Index(#[from] index::IndexError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid link pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlReport, Frontier};
pub use index::{IndexReader, IndexWriter, Indexer, InvertedIndex};
pub use search::{Page, Query, SearchEngine, SearchRequest};
pub use storage::{CrawledRecord, RecordStore, SqliteStore};
pub use url::{normalize_url, LinkMatcher};
