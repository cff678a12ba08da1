//! Snapshot scans over the record store

use crate::storage::traits::{RecordStore, StorageResult};
use crate::storage::StoredRecord;
use std::collections::VecDeque;

/// One page of rows read by a scan
#[derive(Debug, Default)]
pub struct RecordBatch {
    /// Decoded rows; a row that failed to decode is an `Err` entry
    pub records: Vec<StorageResult<StoredRecord>>,
    /// Id of the last row read, used as the cursor for the next batch
    pub last_id: Option<i64>,
}

/// Lazy, finite, restartable iteration over every stored record
///
/// The scan opens a read snapshot at creation time and keeps it until it is
/// dropped, so records added or replaced while an index build is running are
/// left for the next build. It also pins the highest record id of that
/// snapshot. Rows are read in id order, i.e. insertion order.
pub struct RecordScan<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    owns_snapshot: bool,
    high_water: i64,
    cursor: i64,
    batch_size: usize,
    buffer: VecDeque<StorageResult<StoredRecord>>,
    done: bool,
}

impl<'a, S: RecordStore + ?Sized> RecordScan<'a, S> {
    /// Pins the snapshot and prepares the first batch read
    pub fn new(store: &'a S, batch_size: usize) -> StorageResult<Self> {
        let owns_snapshot = store.begin_snapshot()?;
        let high_water = match store.max_record_id() {
            Ok(id) => id,
            Err(e) => {
                if owns_snapshot {
                    let _ = store.end_snapshot();
                }
                return Err(e);
            }
        };
        Ok(Self {
            store,
            owns_snapshot,
            high_water,
            cursor: 0,
            batch_size: batch_size.max(1),
            buffer: VecDeque::new(),
            done: high_water == 0,
        })
    }

    /// Highest record id included in this snapshot
    pub fn high_water(&self) -> i64 {
        self.high_water
    }

    /// Rewinds to the first record of the same snapshot
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.buffer.clear();
        self.done = self.high_water == 0;
    }
}

impl<'a, S: RecordStore + ?Sized> Iterator for RecordScan<'a, S> {
    type Item = StorageResult<StoredRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(item);
            }

            if self.done {
                return None;
            }

            match self
                .store
                .read_batch(self.cursor, self.high_water, self.batch_size)
            {
                Ok(batch) => {
                    match batch.last_id {
                        Some(id) => self.cursor = id,
                        None => self.done = true,
                    }
                    if batch.records.len() < self.batch_size || self.cursor >= self.high_water {
                        self.done = true;
                    }
                    self.buffer.extend(batch.records);
                }
                Err(e) => {
                    // The cursor cannot advance past a failed read
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<'a, S: RecordStore + ?Sized> Drop for RecordScan<'a, S> {
    fn drop(&mut self) {
        if self.owns_snapshot {
            if let Err(e) = self.store.end_snapshot() {
                tracing::warn!("Failed to end record scan snapshot: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CrawledRecord, SqliteStore};

    fn record(url: &str, title: &str) -> CrawledRecord {
        CrawledRecord {
            url: url.to_string(),
            title: title.to_string(),
            description: String::new(),
            keywords: String::new(),
            detail: String::new(),
            content: format!("content of {}", title),
            fetched_at: 1_000,
        }
    }

    fn store_with(n: usize) -> SqliteStore {
        let mut store = SqliteStore::new_in_memory().unwrap();
        for i in 0..n {
            store
                .put(&record(&format!("https://example.com/{}", i), &format!("t{}", i)))
                .unwrap();
        }
        store
    }

    #[test]
    fn test_scan_crosses_batch_boundaries_in_order() {
        let store = store_with(7);
        let scan = RecordScan::new(&store, 3).unwrap();

        let titles: Vec<String> = scan.map(|r| r.unwrap().record.title).collect();
        assert_eq!(titles, vec!["t0", "t1", "t2", "t3", "t4", "t5", "t6"]);
    }

    #[test]
    fn test_scan_empty_store() {
        let store = SqliteStore::new_in_memory().unwrap();
        let mut scan = store.scan_all().unwrap();
        assert_eq!(scan.high_water(), 0);
        assert!(scan.next().is_none());
    }

    #[test]
    fn test_scan_restart_replays_same_snapshot() {
        let store = store_with(4);
        let mut scan = RecordScan::new(&store, 2).unwrap();

        let first: Vec<i64> = scan.by_ref().map(|r| r.unwrap().id).collect();
        scan.restart();
        let second: Vec<i64> = scan.map(|r| r.unwrap().id).collect();

        assert_eq!(first.len(), 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_nested_scans_share_one_snapshot() {
        let store = store_with(3);
        let outer = RecordScan::new(&store, 2).unwrap();
        {
            let inner = RecordScan::new(&store, 2).unwrap();
            assert_eq!(inner.count(), 3);
        }
        // Dropping the inner scan leaves the outer snapshot open
        assert_eq!(outer.count(), 3);
        assert!(store.begin_snapshot().unwrap());
        store.end_snapshot().unwrap();
    }

    #[test]
    fn test_exact_multiple_of_batch_size() {
        let store = store_with(4);
        let scan = RecordScan::new(&store, 2).unwrap();
        assert_eq!(scan.count(), 4);
    }
}
