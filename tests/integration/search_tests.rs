//! Integration tests for indexing and searching
//!
//! Records are written to an on-disk record store, indexed into a temporary
//! index directory and queried through the search engine.

use std::path::Path;
use tempfile::TempDir;
use topic_search::config::OpenMode;
use topic_search::index::{Indexer, IndexError, IndexWriter, StandardTokenizer};
use topic_search::search::{LogicalOperator, QueryError, SearchEngine, SearchRequest};
use topic_search::storage::{CrawledRecord, RecordStore, SqliteStore};

fn record(url: &str, title: &str, content: &str) -> CrawledRecord {
    CrawledRecord {
        url: url.to_string(),
        title: title.to_string(),
        description: String::new(),
        keywords: String::new(),
        detail: "2024-03-01".to_string(),
        content: content.to_string(),
        fetched_at: 1_709_251_200_000,
    }
}

fn store_with(dir: &TempDir, records: &[CrawledRecord]) -> SqliteStore {
    let mut store = SqliteStore::new(&dir.path().join("records.db")).unwrap();
    for r in records {
        store.put(r).unwrap();
    }
    store
}

fn build(store: &SqliteStore, index_dir: &Path, mode: OpenMode) {
    let tokenizer = StandardTokenizer;
    let mut indexer = Indexer::open(index_dir, mode, &tokenizer, 20).unwrap();
    indexer.build(store.scan_all().unwrap());
    indexer.close().unwrap();
}

fn request(primary: &str, op: Option<LogicalOperator>, secondary: &str) -> SearchRequest {
    SearchRequest {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        operator: op,
        page_index: 1,
        page_size: 10,
    }
}

fn hit_urls(engine: &SearchEngine, request: &SearchRequest) -> Vec<String> {
    let page = engine.handle(request).unwrap();
    page.hits
        .iter()
        .map(|h| engine.document(h.doc_id).unwrap().url.clone())
        .collect()
}

fn corpus() -> Vec<CrawledRecord> {
    vec![
        record(
            "https://games.test/news/1",
            "Zelda review",
            "The new Zelda game is an adventure on Switch",
        ),
        record(
            "https://games.test/news/2",
            "Mario Kart update",
            "Nintendo ships a Mario Kart update for Switch owners",
        ),
        record(
            "https://games.test/news/3",
            "Elden Ring DLC",
            "A large expansion for the adventure hit",
        ),
    ]
}

#[test]
fn test_store_index_search_pipeline() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let store = store_with(&dir, &corpus());
    build(&store, &index_dir, OpenMode::Create);

    let engine = SearchEngine::open(&index_dir).unwrap();
    assert_eq!(engine.doc_count(), 3);

    assert_eq!(
        hit_urls(&engine, &request("zelda", None, "")),
        vec!["https://games.test/news/1"]
    );

    // AND
    assert_eq!(
        hit_urls(&engine, &request("switch", Some(LogicalOperator::And), "mario")),
        vec!["https://games.test/news/2"]
    );

    // OR, title match ranks first
    let urls = hit_urls(&engine, &request("zelda", Some(LogicalOperator::Or), "elden"));
    assert_eq!(urls.len(), 2);
    assert!(urls.contains(&"https://games.test/news/1".to_string()));
    assert!(urls.contains(&"https://games.test/news/3".to_string()));

    // NOT
    assert_eq!(
        hit_urls(&engine, &request("adventure", Some(LogicalOperator::Not), "zelda")),
        vec!["https://games.test/news/3"]
    );
}

#[test]
fn test_stored_display_fields() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let store = store_with(&dir, &corpus());
    build(&store, &index_dir, OpenMode::Create);

    let engine = SearchEngine::open(&index_dir).unwrap();
    let page = engine.search("nintendo", 1, 10).unwrap();
    let doc = engine.document(page.hits[0].doc_id).unwrap();

    assert_eq!(doc.title, "Mario Kart update");
    assert_eq!(doc.summary, "Nintendo ships a Mar...");
    assert_eq!(doc.detail, "2024-03-01");
    assert_eq!(doc.fetched_at, 1_709_251_200_000);
}

#[test]
fn test_append_mode_replaces_recrawled_urls() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let mut store = store_with(&dir, &corpus());
    build(&store, &index_dir, OpenMode::CreateOrAppend);

    // The same URL is crawled again with new content
    store
        .put(&record(
            "https://games.test/news/1",
            "Zelda patch notes",
            "Patch 1.2 fixes the water temple",
        ))
        .unwrap();
    build(&store, &index_dir, OpenMode::CreateOrAppend);

    let engine = SearchEngine::open(&index_dir).unwrap();
    assert_eq!(engine.doc_count(), 3);
    assert_eq!(
        hit_urls(&engine, &request("temple", None, "")),
        vec!["https://games.test/news/1"]
    );
    assert!(hit_urls(&engine, &request("review", None, "")).is_empty());
}

#[test]
fn test_create_mode_starts_over() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let store = store_with(&dir, &corpus());
    build(&store, &index_dir, OpenMode::Create);

    let other = TempDir::new().unwrap();
    let small = store_with(&other, &corpus()[..1]);
    build(&small, &index_dir, OpenMode::Create);

    let engine = SearchEngine::open(&index_dir).unwrap();
    assert_eq!(engine.doc_count(), 1);
}

#[test]
fn test_search_refused_during_build() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let store = store_with(&dir, &corpus());
    build(&store, &index_dir, OpenMode::Create);

    let writer = IndexWriter::open(&index_dir, OpenMode::CreateOrAppend, "standard").unwrap();
    assert!(matches!(
        SearchEngine::open(&index_dir),
        Err(IndexError::Locked(_))
    ));
    drop(writer);

    assert!(SearchEngine::open(&index_dir).is_ok());
}

#[test]
fn test_search_without_index() {
    let dir = TempDir::new().unwrap();
    assert!(matches!(
        SearchEngine::open(&dir.path().join("index")),
        Err(IndexError::Missing(_))
    ));
}

#[test]
fn test_rejected_requests_leave_engine_usable() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let store = store_with(&dir, &corpus());
    build(&store, &index_dir, OpenMode::Create);
    let engine = SearchEngine::open(&index_dir).unwrap();

    assert_eq!(
        engine.handle(&request("zelda", None, "mario")),
        Err(QueryError::MissingOperator)
    );
    assert_eq!(
        engine.handle(&request("zelda", Some(LogicalOperator::Not), "ZELDA")),
        Err(QueryError::ConflictingTerm("zelda".to_string()))
    );
    assert_eq!(
        engine.handle(&request("   ", None, "")),
        Err(QueryError::EmptyQuery)
    );

    assert_eq!(hit_urls(&engine, &request("zelda", None, "")).len(), 1);
}

#[test]
fn test_pages_beyond_the_end() {
    let dir = TempDir::new().unwrap();
    let index_dir = dir.path().join("index");
    let records: Vec<CrawledRecord> = (0..25)
        .map(|i| {
            record(
                &format!("https://games.test/news/{}", i),
                "weekly roundup",
                "roundup",
            )
        })
        .collect();
    let store = store_with(&dir, &records);
    build(&store, &index_dir, OpenMode::Create);
    let engine = SearchEngine::open(&index_dir).unwrap();

    let mut req = request("roundup", None, "");
    req.page_index = 3;
    let page = engine.handle(&req).unwrap();
    assert_eq!(page.total_pages(), 3);
    assert_eq!(page.hits.len(), 5);

    req.page_index = 4;
    let page = engine.handle(&req).unwrap();
    assert_eq!(page.total_hits, 25);
    assert!(page.hits.is_empty());
}
