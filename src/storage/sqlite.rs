//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::storage::scan::RecordBatch;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{CrawledRecord, PutOutcome, RunRecord, RunStatus, StoredRecord};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const RECORD_COLUMNS: &str =
    "id, url, title, description, keywords, detail, content, fetched_at";

/// SQLite record store backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the record store database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Decodes the record columns of a row selected with `RECORD_COLUMNS`
fn record_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    Ok(StoredRecord {
        id: row.get(0)?,
        record: CrawledRecord {
            url: row.get(1)?,
            title: row.get(2)?,
            description: row.get(3)?,
            keywords: row.get(4)?,
            detail: row.get(5)?,
            content: row.get(6)?,
            fetched_at: row.get(7)?,
        },
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        seed_url: row.get(1)?,
        config_hash: row.get(2)?,
        started_at: row.get(3)?,
        finished_at: row.get(4)?,
        status: {
            let status: String = row.get(5)?;
            RunStatus::from_db_string(&status).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    5,
                    Type::Text,
                    format!("unknown run status '{}'", status).into(),
                )
            })?
        },
        pages_processed: row.get::<_, i64>(6)? as u64,
        pages_skipped: row.get::<_, i64>(7)? as u64,
    })
}

const RUN_COLUMNS: &str = "id, seed_url, config_hash, started_at, finished_at, status,
     pages_processed, pages_skipped";

impl RecordStore for SqliteStore {
    // ===== Records =====

    fn put(&mut self, record: &CrawledRecord) -> StorageResult<PutOutcome> {
        let tx = self.conn.transaction()?;

        // A re-crawled URL gets a fresh row; open scans keep seeing the old one
        let removed = tx.execute(
            "DELETE FROM crawled_records WHERE url = ?1",
            params![record.url],
        )?;

        tx.execute(
            "INSERT INTO crawled_records
                (url, title, description, keywords, detail, content, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.url,
                record.title,
                record.description,
                record.keywords,
                record.detail,
                record.content,
                record.fetched_at
            ],
        )?;
        tx.commit()?;

        Ok(if removed > 0 {
            PutOutcome::Replaced
        } else {
            PutOutcome::Inserted
        })
    }

    fn get_by_url(&self, url: &str) -> StorageResult<Option<StoredRecord>> {
        let record = self
            .conn
            .query_row(
                &format!("SELECT {} FROM crawled_records WHERE url = ?1", RECORD_COLUMNS),
                params![url],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM crawled_records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn max_record_id(&self) -> StorageResult<i64> {
        let max: Option<i64> =
            self.conn
                .query_row("SELECT MAX(id) FROM crawled_records", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }

    fn read_batch(
        &self,
        after_id: i64,
        up_to_id: i64,
        limit: usize,
    ) -> StorageResult<RecordBatch> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM crawled_records WHERE id > ?1 AND id <= ?2 ORDER BY id LIMIT ?3",
            RECORD_COLUMNS
        ))?;

        let rows = stmt.query_map(params![after_id, up_to_id, limit as i64], |row| {
            let id: i64 = row.get(0)?;
            Ok((id, record_from_row(row)))
        })?;

        let mut batch = RecordBatch::default();
        for row in rows {
            let (id, decoded) = row?;
            batch.last_id = Some(id);
            batch.records.push(decoded.map_err(StorageError::from));
        }

        Ok(batch)
    }

    fn begin_snapshot(&self) -> StorageResult<bool> {
        if !self.conn.is_autocommit() {
            return Ok(false);
        }
        self.conn.execute_batch("BEGIN DEFERRED")?;
        Ok(true)
    }

    fn end_snapshot(&self) -> StorageResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    // ===== Run Management =====

    fn create_run(&mut self, seed_url: &str, config_hash: &str) -> StorageResult<i64> {
        self.conn.execute(
            "UPDATE crawl_runs SET status = ?1 WHERE status = ?2",
            params![
                RunStatus::Interrupted.to_db_string(),
                RunStatus::Running.to_db_string()
            ],
        )?;

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_runs (seed_url, config_hash, started_at, status)
             VALUES (?1, ?2, ?3, ?4)",
            params![seed_url, config_hash, now, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn complete_run(&mut self, run_id: i64, processed: u64, skipped: u64) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE crawl_runs SET status = ?1, finished_at = ?2,
             pages_processed = ?3, pages_skipped = ?4 WHERE id = ?5",
            params![
                RunStatus::Completed.to_db_string(),
                now,
                processed as i64,
                skipped as i64,
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM crawl_runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }
}
