//! Read-only access to a published index

use crate::index::files;
use crate::index::inverted::InvertedIndex;
use crate::index::IndexError;
use std::path::Path;
use std::sync::Arc;

/// A published index loaded into memory
///
/// The loaded index is immutable and can be shared across threads. A newer
/// build is picked up by opening the directory again.
#[derive(Debug, Clone)]
pub struct IndexReader {
    index: Arc<InvertedIndex>,
}

impl IndexReader {
    /// Loads the index published in `dir`
    ///
    /// `tokenizer` names the tokenizer queries will be analyzed with; it must
    /// be the one the index was built with.
    ///
    /// # Errors
    ///
    /// * `IndexError::Locked` - A writer is currently building into `dir`
    /// * `IndexError::Missing` - Nothing has been published in `dir`
    /// * `IndexError::TokenizerMismatch` - The index was built with another tokenizer
    pub fn open(dir: &Path, tokenizer: &str) -> Result<Self, IndexError> {
        if files::is_locked(dir) {
            return Err(IndexError::Locked(dir.to_path_buf()));
        }

        let index = files::load(dir, tokenizer)?.ok_or_else(|| IndexError::Missing(dir.to_path_buf()))?;
        tracing::debug!(
            "Loaded index from {} ({} documents, {} terms)",
            dir.display(),
            index.doc_count(),
            index.term_count()
        );

        Ok(Self {
            index: Arc::new(index),
        })
    }

    /// Shared handle to the loaded index
    pub fn index(&self) -> Arc<InvertedIndex> {
        Arc::clone(&self.index)
    }

    pub fn doc_count(&self) -> usize {
        self.index.doc_count()
    }
}
