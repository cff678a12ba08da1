//! Inverted index over crawled records
//!
//! This module covers everything between the record store and the query
//! engine:
//! - Tokenization of full-text fields
//! - The in-memory inverted index and its posting lists
//! - Publishing an index directory under an exclusive write lock
//! - Loading a published index for searching

mod analysis;
mod builder;
mod document;
mod files;
mod inverted;
mod reader;
mod writer;

pub use analysis::{StandardTokenizer, Tokenizer};
pub use builder::{BuildReport, Indexer};
pub use document::{summarize, FieldName, IndexedDocument, StoredDocument};
pub use files::{INDEX_FILE, LOCK_FILE};
pub use inverted::{AddOutcome, DocId, InvertedIndex, Posting};
pub use reader::IndexReader;
pub use writer::IndexWriter;

use crate::config::{Config, OpenMode};
use crate::storage::{RecordStore, SqliteStore};
use crate::SearchEngineError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort an index build or prevent opening an index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index at {0} is locked by a running build (remove write.lock if no build is running)")]
    Locked(PathBuf),

    #[error("No index has been built at {0}")]
    Missing(PathBuf),

    #[error("Index is corrupt: {0}")]
    Corrupt(String),

    #[error("Index was built with tokenizer '{found}', expected '{expected}'")]
    TokenizerMismatch { expected: String, found: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Builds the index from every record currently in the record store
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `fresh` - Start from an empty index regardless of the configured open mode
pub fn build_index(config: &Config, fresh: bool) -> Result<BuildReport, SearchEngineError> {
    let store = SqliteStore::new(Path::new(&config.storage.database_path))?;
    let scan = store.scan_all()?;

    let mode = if fresh {
        OpenMode::Create
    } else {
        config.index.open_mode
    };
    tracing::info!(
        "Building index at {} ({:?}) from {} records",
        config.index.index_path,
        mode,
        store.count_records()?
    );

    let tokenizer = StandardTokenizer;
    let mut indexer = Indexer::open(
        Path::new(&config.index.index_path),
        mode,
        &tokenizer,
        config.index.summary_length,
    )?;
    indexer.build(scan);
    let report = indexer.close()?;

    tracing::info!(
        "Index build complete: {} indexed, {} replaced, {} skipped, {} documents total",
        report.indexed,
        report.replaced,
        report.skipped,
        report.total_documents
    );

    Ok(report)
}
