//! Record store for crawled documents
//!
//! This module persists one record per crawled URL and decouples the crawl
//! stage from the index-build stage:
//! - SQLite database initialization and schema management
//! - One live record per URL; a re-crawl replaces it with a new record
//! - Snapshot scans in insertion order for index builds
//! - Crawl run tracking

mod scan;
mod schema;
mod sqlite;
mod traits;

pub use scan::{RecordBatch, RecordScan};
pub use sqlite::SqliteStore;
pub use traits::{RecordStore, StorageError, StorageResult};

/// The fields extracted from one fetched page, persisted under its URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawledRecord {
    pub url: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub detail: String,
    pub content: String,
    /// Fetch time in milliseconds since the Unix epoch
    pub fetched_at: i64,
}

/// A record together with its store-assigned id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Row id; ascending ids follow insertion order
    pub id: i64,
    pub record: CrawledRecord,
}

/// What `put` did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The URL was not stored yet
    Inserted,
    /// A record for the URL existed and was replaced by a new one
    Replaced,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub seed_url: String,
    pub config_hash: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: RunStatus,
    pub pages_processed: u64,
    pub pages_skipped: u64,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            _ => None,
        }
    }
}
