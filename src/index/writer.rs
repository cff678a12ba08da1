//! Index writer with exclusive directory lock

use crate::config::OpenMode;
use crate::index::document::IndexedDocument;
use crate::index::files::{self, WriteLock};
use crate::index::inverted::{AddOutcome, InvertedIndex};
use crate::index::IndexError;
use std::fs;
use std::path::{Path, PathBuf};

/// Builds an index in memory and publishes it on `close`
///
/// Opening a writer takes `write.lock` in the index directory. The lock is
/// released when the writer is closed or dropped, whichever comes first. A
/// writer that is dropped without `close` publishes nothing, so the previous
/// index stays authoritative.
#[derive(Debug)]
pub struct IndexWriter {
    dir: PathBuf,
    index: InvertedIndex,
    tokenizer: &'static str,
    _lock: WriteLock,
}

impl IndexWriter {
    /// Opens the index directory for writing
    ///
    /// In `CreateOrAppend` mode the published index, if any, is loaded and new
    /// documents are added on top of it. `Create` starts from an empty index.
    /// `tokenizer` is recorded with the published index.
    ///
    /// # Errors
    ///
    /// * `IndexError::Locked` - Another writer holds the directory
    /// * `IndexError::TokenizerMismatch` - Appending to an index built with another tokenizer
    /// * `IndexError::Io` / `IndexError::Sqlite` - The directory or existing index is unreadable
    pub fn open(dir: &Path, mode: OpenMode, tokenizer: &'static str) -> Result<Self, IndexError> {
        fs::create_dir_all(dir)?;
        let lock = WriteLock::acquire(dir)?;

        let index = match mode {
            OpenMode::Create => InvertedIndex::new(),
            OpenMode::CreateOrAppend => files::load(dir, tokenizer)?.unwrap_or_default(),
        };

        tracing::debug!(
            "Opened index writer at {} ({:?}, {} existing documents)",
            dir.display(),
            mode,
            index.doc_count()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            index,
            tokenizer,
            _lock: lock,
        })
    }

    pub fn add_document(&mut self, doc: IndexedDocument) -> AddOutcome {
        self.index.add_document(doc)
    }

    /// The index as built so far
    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Publishes the index and releases the lock
    ///
    /// # Returns
    ///
    /// The number of documents in the published index
    pub fn close(self) -> Result<usize, IndexError> {
        files::publish(&self.dir, &self.index, self.tokenizer)?;
        tracing::debug!(
            "Published index at {} with {} documents",
            self.dir.display(),
            self.index.doc_count()
        );
        Ok(self.index.doc_count())
    }
}
