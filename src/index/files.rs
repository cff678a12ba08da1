//! On-disk layout of an index directory
//!
//! ```text
//! <index-path>/
//!   index.db       published index (SQLite)
//!   index.db.tmp   being written by IndexWriter::close
//!   write.lock     present while a writer is open
//! ```

use crate::index::document::{FieldName, StoredDocument};
use crate::index::inverted::{DocId, InvertedIndex, Posting};
use crate::index::IndexError;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const INDEX_FILE: &str = "index.db";
pub const TEMP_FILE: &str = "index.db.tmp";
pub const LOCK_FILE: &str = "write.lock";

/// Version of the table layout below
const FORMAT_VERSION: &str = "1";

const INDEX_SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
    doc_id INTEGER PRIMARY KEY,
    record_id INTEGER NOT NULL,
    url TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    summary TEXT NOT NULL,
    detail TEXT NOT NULL,
    fetched_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS postings (
    field TEXT NOT NULL,
    term TEXT NOT NULL,
    doc_id INTEGER NOT NULL REFERENCES documents(doc_id),
    frequency INTEGER NOT NULL CHECK (frequency >= 1),
    PRIMARY KEY (field, term, doc_id)
) WITHOUT ROWID;
"#;

/// Exclusive claim on an index directory, released on drop
#[derive(Debug)]
pub struct WriteLock {
    path: PathBuf,
}

impl WriteLock {
    /// Creates the lock file, failing if another writer holds it
    pub fn acquire(dir: &Path) -> Result<Self, IndexError> {
        let path = dir.join(LOCK_FILE);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(IndexError::Locked(dir.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        // Owner pid helps when clearing a lock left by a crashed process
        writeln!(file, "{}", std::process::id())?;

        Ok(Self { path })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("Failed to release index lock {}: {}", self.path.display(), e);
        }
    }
}

pub fn is_locked(dir: &Path) -> bool {
    dir.join(LOCK_FILE).exists()
}

/// Writes `index` to a temporary file and renames it over the published one
pub fn publish(dir: &Path, index: &InvertedIndex, tokenizer: &str) -> Result<(), IndexError> {
    let temp_path = dir.join(TEMP_FILE);
    if temp_path.exists() {
        fs::remove_file(&temp_path)?;
    }

    {
        let mut conn = Connection::open(&temp_path)?;
        conn.execute_batch(INDEX_SCHEMA_SQL)?;

        let tx = conn.transaction()?;
        {
            let mut meta = tx.prepare("INSERT INTO meta (key, value) VALUES (?1, ?2)")?;
            meta.execute(params!["format_version", FORMAT_VERSION])?;
            meta.execute(params!["tokenizer", tokenizer])?;
            meta.execute(params!["built_at", chrono::Utc::now().to_rfc3339()])?;

            let mut insert_doc = tx.prepare(
                "INSERT INTO documents (doc_id, record_id, url, title, summary, detail, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (doc_id, doc) in index.documents() {
                insert_doc.execute(params![
                    doc_id,
                    doc.record_id,
                    doc.url,
                    doc.title,
                    doc.summary,
                    doc.detail,
                    doc.fetched_at
                ])?;
            }

            let mut insert_posting = tx.prepare(
                "INSERT INTO postings (field, term, doc_id, frequency) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (field, term, list) in index.posting_lists() {
                for posting in list {
                    insert_posting.execute(params![
                        field.as_str(),
                        term,
                        posting.doc_id,
                        posting.frequency
                    ])?;
                }
            }
        }
        tx.commit()?;
    }

    fs::rename(&temp_path, dir.join(INDEX_FILE))?;
    Ok(())
}

/// Loads the published index of `dir`
///
/// # Returns
///
/// * `Ok(None)` - The directory has no published index
/// * `Ok(Some(index))` - The index was loaded
pub fn load(dir: &Path, tokenizer: &str) -> Result<Option<InvertedIndex>, IndexError> {
    let path = dir.join(INDEX_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;

    let version: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'format_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if version.as_deref() != Some(FORMAT_VERSION) {
        return Err(IndexError::Corrupt(format!(
            "{} has unsupported format version {:?}",
            path.display(),
            version
        )));
    }

    let built_with: Option<String> = conn
        .query_row("SELECT value FROM meta WHERE key = 'tokenizer'", [], |row| {
            row.get(0)
        })
        .optional()?;
    if built_with.as_deref() != Some(tokenizer) {
        return Err(IndexError::TokenizerMismatch {
            expected: tokenizer.to_string(),
            found: built_with.unwrap_or_default(),
        });
    }

    let mut stmt = conn.prepare(
        "SELECT doc_id, record_id, url, title, summary, detail, fetched_at FROM documents",
    )?;
    let documents = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, DocId>(0)?,
                StoredDocument {
                    record_id: row.get(1)?,
                    url: row.get(2)?,
                    title: row.get(3)?,
                    summary: row.get(4)?,
                    detail: row.get(5)?,
                    fetched_at: row.get(6)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare("SELECT field, term, doc_id, frequency FROM postings")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                Posting {
                    doc_id: row.get(2)?,
                    frequency: row.get(3)?,
                },
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut postings = Vec::with_capacity(rows.len());
    for (field, term, posting) in rows {
        let field = FieldName::from_db_string(&field)
            .ok_or_else(|| IndexError::Corrupt(format!("unknown field '{}'", field)))?;
        postings.push((field, term, posting));
    }

    Ok(Some(InvertedIndex::from_parts(documents, postings)))
}
