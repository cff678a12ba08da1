//! Index build pass over the record store

use crate::config::OpenMode;
use crate::index::analysis::Tokenizer;
use crate::index::document::IndexedDocument;
use crate::index::inverted::AddOutcome;
use crate::index::writer::IndexWriter;
use crate::index::IndexError;
use crate::storage::{StorageResult, StoredRecord};
use std::path::Path;
use std::time::Instant;

/// Counters for one build pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Records added as new documents
    pub indexed: u64,
    /// Records that replaced a document with the same URL
    pub replaced: u64,
    /// Records that could not be read from the store
    pub skipped: u64,
    /// Documents in the index after the pass
    pub total_documents: usize,
}

/// Turns crawled records into index documents
///
/// The indexer owns the writer for its whole lifetime and analyzes every
/// record with the tokenizer it was opened with, which is also the one
/// recorded in the published index. `close` must be called to publish the
/// build; dropping the indexer releases the directory lock and leaves the
/// previously published index in place.
pub struct Indexer<'t> {
    writer: IndexWriter,
    tokenizer: &'t dyn Tokenizer,
    summary_length: usize,
    report: BuildReport,
}

impl<'t> Indexer<'t> {
    /// Opens `dir` for a build pass
    pub fn open(
        dir: &Path,
        mode: OpenMode,
        tokenizer: &'t dyn Tokenizer,
        summary_length: usize,
    ) -> Result<Self, IndexError> {
        Ok(Self {
            writer: IndexWriter::open(dir, mode, tokenizer.name())?,
            tokenizer,
            summary_length,
            report: BuildReport::default(),
        })
    }

    /// Tokenizes and adds every record of `records`
    ///
    /// A record that fails to load is logged and counted as skipped.
    pub fn build<I>(&mut self, records: I) -> &BuildReport
    where
        I: IntoIterator<Item = StorageResult<StoredRecord>>,
    {
        let start_time = Instant::now();
        let before = self.report.indexed + self.report.replaced;

        for item in records {
            let stored = match item {
                Ok(stored) => stored,
                Err(e) => {
                    tracing::warn!("Skipping unreadable record: {}", e);
                    self.report.skipped += 1;
                    continue;
                }
            };

            let doc = IndexedDocument::from_record(&stored, self.tokenizer, self.summary_length);
            match self.writer.add_document(doc) {
                AddOutcome::Added(_) => self.report.indexed += 1,
                AddOutcome::Replaced { .. } => {
                    tracing::debug!("Replaced indexed document for {}", stored.record.url);
                    self.report.replaced += 1;
                }
            }

            let done = self.report.indexed + self.report.replaced;
            if done % 1000 == 0 {
                tracing::info!("Indexed {} records", done);
            }
        }

        tracing::info!(
            "Build pass added {} records in {:?}",
            self.report.indexed + self.report.replaced - before,
            start_time.elapsed()
        );

        &self.report
    }

    /// Publishes the index and releases the writer
    pub fn close(mut self) -> Result<BuildReport, IndexError> {
        self.report.total_documents = self.writer.close()?;
        Ok(self.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::analysis::StandardTokenizer;
    use crate::index::document::FieldName;
    use crate::index::reader::IndexReader;
    use crate::storage::{CrawledRecord, StorageError};
    use tempfile::TempDir;

    fn stored(id: i64, url: &str, title: &str) -> StorageResult<StoredRecord> {
        Ok(StoredRecord {
            id,
            record: CrawledRecord {
                url: url.to_string(),
                title: title.to_string(),
                description: String::new(),
                keywords: String::new(),
                detail: String::new(),
                content: String::new(),
                fetched_at: 0,
            },
        })
    }

    #[test]
    fn test_build_and_close() {
        let dir = TempDir::new().unwrap();
        let tokenizer = StandardTokenizer;
        let mut indexer = Indexer::open(dir.path(), OpenMode::Create, &tokenizer, 100).unwrap();

        indexer.build(vec![stored(1, "a", "alpha"), stored(2, "b", "beta")]);
        let report = indexer.close().unwrap();

        assert_eq!(report.indexed, 2);
        assert_eq!(report.total_documents, 2);

        let reader = IndexReader::open(dir.path(), tokenizer.name()).unwrap();
        let index = reader.index();
        assert_eq!(index.postings(FieldName::Title, "alpha").len(), 1);
    }

    #[test]
    fn test_unreadable_record_is_skipped() {
        let dir = TempDir::new().unwrap();
        let tokenizer = StandardTokenizer;
        let mut indexer = Indexer::open(dir.path(), OpenMode::Create, &tokenizer, 100).unwrap();

        let records = vec![
            stored(1, "a", "alpha"),
            Err(StorageError::Sqlite(rusqlite::Error::QueryReturnedNoRows)),
            stored(3, "c", "gamma"),
        ];
        let report = indexer.build(records).clone();

        assert_eq!(report.indexed, 2);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn test_duplicate_url_in_one_pass_replaces() {
        let dir = TempDir::new().unwrap();
        let tokenizer = StandardTokenizer;
        let mut indexer = Indexer::open(dir.path(), OpenMode::Create, &tokenizer, 100).unwrap();

        indexer.build(vec![stored(1, "a", "first"), stored(2, "a", "second")]);
        let report = indexer.close().unwrap();

        assert_eq!(report.indexed, 1);
        assert_eq!(report.replaced, 1);
        assert_eq!(report.total_documents, 1);
    }

    #[test]
    fn test_dropped_indexer_keeps_previous_index() {
        let dir = TempDir::new().unwrap();
        let tokenizer = StandardTokenizer;

        let mut indexer = Indexer::open(dir.path(), OpenMode::Create, &tokenizer, 100).unwrap();
        indexer.build(vec![stored(1, "a", "alpha")]);
        indexer.close().unwrap();

        {
            let mut failed =
                Indexer::open(dir.path(), OpenMode::Create, &tokenizer, 100).unwrap();
            failed.build(vec![stored(2, "b", "beta")]);
            // dropped without close
        }

        let reader = IndexReader::open(dir.path(), tokenizer.name()).unwrap();
        assert_eq!(reader.doc_count(), 1);
        assert!(reader.index().doc_id_for_url("a").is_some());
    }
}
