//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from a TOML config file to the
//! record store.

use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use topic_search::config::{load_config_with_hash, Config};
use topic_search::crawler::crawl;
use topic_search::storage::{RecordStore, RunStatus, SqliteStore};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Writes a config file for a crawl of `server` and loads it back
fn write_config(dir: &TempDir, server: &MockServer, max_urls: u32) -> (Config, String) {
    let pattern = format!("{}/news/.*", regex::escape(&server.uri()));
    let content = format!(
        r#"
[crawler]
max-urls = {max_urls}
crawl-delay-ms = 10
request-timeout-secs = 5
accept-patterns = ['{pattern}']

[user-agent]
user-agent = "TestBot/1.0"
cookie = "token=xyz"

[storage]
database-path = '{db}'

[index]
index-path = '{index}'
"#,
        max_urls = max_urls,
        pattern = pattern,
        db = dir.path().join("records.db").display(),
        index = dir.path().join("index").display(),
    );

    let config_path = dir.path().join("config.toml");
    let mut file = std::fs::File::create(&config_path).expect("Failed to create config");
    file.write_all(content.as_bytes())
        .expect("Failed to write config");

    load_config_with_hash(&config_path).expect("Failed to load config")
}

fn article(title: &str, body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    format!(
        r#"<html><head><title>{title}</title>
        <meta name="keywords" content="{title}"></head>
        <body>
        <div class="Mid2L_tit"><div class="detail">2024-01-01 10:00</div></div>
        <div class="Mid2L_con"><p>{body}</p></div>
        {anchors}
        </body></html>"#,
        title = title,
        body = body,
        anchors = anchors
    )
}

async fn mount_page(server: &MockServer, at: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
}

fn open_store(config: &Config) -> SqliteStore {
    SqliteStore::new(Path::new(&config.storage.database_path)).expect("Failed to open store")
}

#[tokio::test]
async fn test_full_crawl_stores_accepted_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, 100);

    mount_page(
        &server,
        "/news/1",
        article("Seed", "seed body", &["/news/2", "/news/3", "/about", "mailto:x@y.z"]),
    )
    .await;
    mount_page(&server, "/news/2", article("Second", "second body", &["/news/1"])).await;
    mount_page(&server, "/news/3", article("Third", "third body", &[])).await;

    // Never requested: does not match the accept pattern
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let seed = format!("{}/news/1", server.uri());
    let report = crawl(&config, &seed, &hash).await.expect("Crawl failed");

    assert_eq!(report.processed, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.remaining, 0);

    let store = open_store(&config);
    assert_eq!(store.count_records().unwrap(), 3);

    let second = store
        .get_by_url(&format!("{}/news/2", server.uri()))
        .unwrap()
        .expect("Second page not stored");
    assert_eq!(second.record.title, "Second");
    assert_eq!(second.record.keywords, "Second");
    assert_eq!(second.record.detail, "2024-01-01 10:00");
    assert_eq!(second.record.content, "second body");
    assert!(second.record.fetched_at > 0);

    // Breadth-first: records are stored in discovery order
    let urls: Vec<String> = store
        .scan_all()
        .unwrap()
        .map(|r| r.unwrap().record.url)
        .collect();
    assert_eq!(
        urls,
        vec![
            format!("{}/news/1", server.uri()),
            format!("{}/news/2", server.uri()),
            format!("{}/news/3", server.uri()),
        ]
    );

    let run = store.get_latest_run().unwrap().expect("Run not recorded");
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, hash);
    assert_eq!(run.pages_processed, 3);
}

#[tokio::test]
async fn test_crawl_stops_at_max_urls() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, 3);

    // A long chain: every page links to the next one
    for i in 0..10 {
        let next = format!("/news/{}", i + 1);
        mount_page(
            &server,
            &format!("/news/{}", i),
            article(&format!("Page {}", i), "chain", &[next.as_str()]),
        )
        .await;
    }

    let seed = format!("{}/news/0", server.uri());
    let report = crawl(&config, &seed, &hash).await.expect("Crawl failed");

    assert_eq!(report.processed, 3);
    assert_eq!(report.remaining, 1);
    assert_eq!(open_store(&config).count_records().unwrap(), 3);
}

#[tokio::test]
async fn test_failed_pages_are_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, 100);

    mount_page(
        &server,
        "/news/1",
        article("Seed", "seed", &["/news/missing", "/news/error", "/news/ok"]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/news/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/news/error"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/news/ok", article("Ok", "fine", &[])).await;

    let seed = format!("{}/news/1", server.uri());
    let report = crawl(&config, &seed, &hash).await.expect("Crawl failed");

    assert_eq!(report.processed, 2);
    assert_eq!(report.skipped, 2);

    let store = open_store(&config);
    assert_eq!(store.count_records().unwrap(), 2);
    assert!(store
        .get_by_url(&format!("{}/news/missing", server.uri()))
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_identity_headers_sent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, 10);

    Mock::given(method("GET"))
        .and(path("/news/1"))
        .and(header("user-agent", "TestBot/1.0"))
        .and(header("cookie", "token=xyz"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string(article("Seed", "body", &[])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let seed = format!("{}/news/1", server.uri());
    let report = crawl(&config, &seed, &hash).await.expect("Crawl failed");
    assert_eq!(report.processed, 1);
}

#[tokio::test]
async fn test_recrawl_overwrites_records() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, 10);

    mount_page(&server, "/news/1", article("Seed", "body", &["/news/2"])).await;
    mount_page(&server, "/news/2", article("Two", "body", &[])).await;

    let seed = format!("{}/news/1", server.uri());
    let first = crawl(&config, &seed, &hash).await.expect("First crawl failed");
    let second = crawl(&config, &seed, &hash).await.expect("Second crawl failed");

    assert_eq!(first.replaced, 0);
    assert_eq!(second.processed, 2);
    assert_eq!(second.replaced, 2);
    assert_eq!(open_store(&config).count_records().unwrap(), 2);
}

#[tokio::test]
async fn test_malformed_seed_is_an_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &server, 10);

    assert!(crawl(&config, "::not a url::", &hash).await.is_err());
}
