//! Storage traits and error types
//!
//! This module defines the trait interface for record store backends and
//! associated error types.

use crate::storage::scan::{RecordBatch, RecordScan};
use crate::storage::{CrawledRecord, PutOutcome, RunRecord, StoredRecord};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Number of records fetched per round trip by `scan_all`
pub const DEFAULT_SCAN_BATCH: usize = 256;

/// Trait for record store backends
///
/// Reads and writes are independent short-lived operations. The only state
/// held between calls is the read snapshot of an open scan, which does not
/// block writers.
pub trait RecordStore {
    // ===== Records =====

    /// Stores a record, replacing any existing record with the same URL
    ///
    /// A replacement is a new record with a new id: the old row is never
    /// updated in place, and the URL moves to the end of insertion order.
    fn put(&mut self, record: &CrawledRecord) -> StorageResult<PutOutcome>;

    /// Gets the record stored under a URL
    fn get_by_url(&self, url: &str) -> StorageResult<Option<StoredRecord>>;

    /// Counts stored records
    fn count_records(&self) -> StorageResult<u64>;

    /// Highest record id currently stored, 0 when empty
    fn max_record_id(&self) -> StorageResult<i64>;

    /// Reads up to `limit` records with `after_id < id <= up_to_id`, in id order
    fn read_batch(&self, after_id: i64, up_to_id: i64, limit: usize)
        -> StorageResult<RecordBatch>;

    /// Starts a read snapshot for a scan
    ///
    /// Returns `false` when a snapshot is already open on this store, in which
    /// case the caller must not end it.
    fn begin_snapshot(&self) -> StorageResult<bool> {
        Ok(false)
    }

    /// Ends a snapshot started by `begin_snapshot`
    fn end_snapshot(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Starts a lazy scan over every record stored right now
    ///
    /// Records written after this call are not part of the scan.
    fn scan_all(&self) -> StorageResult<RecordScan<'_, Self>>
    where
        Self: Sized,
    {
        RecordScan::new(self, DEFAULT_SCAN_BATCH)
    }

    // ===== Run Management =====

    /// Creates a new crawl run, marking any run still flagged as running as interrupted
    fn create_run(&mut self, seed_url: &str, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as completed with its final counters
    fn complete_run(&mut self, run_id: i64, processed: u64, skipped: u64) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
