//! Topic-Search main entry point
//!
//! This is the command-line interface for crawling, indexing and searching.

use anyhow::Context;
use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use topic_search::config::{load_config_with_hash, Config};
use topic_search::crawler::crawl;
use topic_search::index::{build_index, IndexError, IndexReader, StandardTokenizer, Tokenizer};
use topic_search::search::{LogicalOperator, Page, SearchEngine, SearchRequest};
use topic_search::storage::{RecordStore, SqliteStore};
use tracing_subscriber::EnvFilter;

/// Topic-Search: crawl one site, index it, search it
///
/// Crawls a bounded number of pages from a seed URL, stores the extracted
/// fields, builds a full-text index from them and answers AND/OR/NOT queries.
#[derive(Parser, Debug)]
#[command(name = "topic-search")]
#[command(version = "1.0.0")]
#[command(about = "Topical crawler with a boolean full-text search", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl from a seed URL into the record store
    Crawl {
        /// URL the crawl starts from
        seed: String,
    },

    /// Build the index from every stored record
    Index {
        /// Discard the existing index instead of appending to it
        #[arg(long)]
        fresh: bool,
    },

    /// Search the index
    Search {
        /// Primary search term
        primary: String,

        /// How to combine the primary and secondary terms
        #[arg(long = "op", value_name = "and|or|not")]
        operator: Option<LogicalOperator>,

        /// Secondary search term
        #[arg(long, default_value = "")]
        secondary: String,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Results per page (defaults to the configured page size)
        #[arg(long)]
        page_size: Option<usize>,
    },

    /// Show record store and index statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::debug!("Configuration loaded (hash: {})", config_hash);

    match cli.command {
        Command::Crawl { seed } => handle_crawl(&config, &seed, &config_hash).await,
        Command::Index { fresh } => handle_index(&config, fresh),
        Command::Search {
            primary,
            operator,
            secondary,
            page,
            page_size,
        } => handle_search(
            &config,
            SearchRequest {
                primary,
                secondary,
                operator,
                page_index: page,
                page_size: page_size.unwrap_or(config.search.page_size),
            },
        ),
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("topic_search=info,warn"),
            1 => EnvFilter::new("topic_search=debug,info"),
            2 => EnvFilter::new("topic_search=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn handle_crawl(config: &Config, seed: &str, config_hash: &str) -> anyhow::Result<()> {
    let report = crawl(config, seed, config_hash)
        .await
        .with_context(|| format!("Crawl from {} failed", seed))?;

    println!("Processed: {}", report.processed);
    println!("Skipped:   {}", report.skipped);
    if report.store_failures > 0 {
        println!("Not stored: {}", report.store_failures);
    }
    println!("Left in frontier: {}", report.remaining);

    Ok(())
}

fn handle_index(config: &Config, fresh: bool) -> anyhow::Result<()> {
    let report = build_index(config, fresh).context("Index build failed")?;

    println!("Indexed:  {}", report.indexed);
    println!("Replaced: {}", report.replaced);
    println!("Skipped:  {}", report.skipped);
    println!("Documents in index: {}", report.total_documents);

    Ok(())
}

fn handle_search(config: &Config, request: SearchRequest) -> anyhow::Result<()> {
    let engine = SearchEngine::open(Path::new(&config.index.index_path))
        .context("Cannot open the index")?;

    // A rejected query is reported, not treated as a failure
    let page = match engine.handle(&request) {
        Ok(page) => page,
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    print_page(&engine, &page);
    Ok(())
}

fn print_page(engine: &SearchEngine, page: &Page) {
    if page.total_hits == 0 {
        println!("No results.");
        return;
    }

    for hit in &page.hits {
        let Some(doc) = engine.document(hit.doc_id) else {
            continue;
        };
        let fetched = Utc
            .timestamp_millis_opt(doc.fetched_at)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        println!("{}", doc.title);
        println!("  {}", doc.summary);
        println!("  {}", doc.url);
        if !doc.detail.is_empty() {
            println!("  {}", doc.detail);
        }
        println!("  {} (score {:.3})", fetched, hit.score);
        println!();
    }

    println!(
        "Page: {} / {} ({} results)",
        page.page_index,
        page.total_pages(),
        page.total_hits
    );
}

fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::new(Path::new(&config.storage.database_path))
        .context("Cannot open the record store")?;

    println!("Database: {}", config.storage.database_path);
    println!("Records:  {}", store.count_records()?);

    match store.get_latest_run()? {
        Some(run) => println!(
            "Latest crawl: #{} from {} ({}, {} processed, {} skipped, started {})",
            run.id,
            run.seed_url,
            run.status.to_db_string(),
            run.pages_processed,
            run.pages_skipped,
            run.started_at
        ),
        None => println!("Latest crawl: none"),
    }

    println!("Index:    {}", config.index.index_path);
    match IndexReader::open(Path::new(&config.index.index_path), StandardTokenizer.name()) {
        Ok(reader) => println!("Indexed documents: {}", reader.doc_count()),
        Err(
            e @ (IndexError::Missing(_)
            | IndexError::Locked(_)
            | IndexError::TokenizerMismatch { .. }),
        ) => println!("{}", e),
        Err(e) => return Err(e).context("Cannot read the index"),
    }

    Ok(())
}
