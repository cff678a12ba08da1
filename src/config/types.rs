use serde::Deserialize;

/// Main configuration structure for Topic-Search
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub storage: StorageConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of successfully processed URLs per run
    #[serde(rename = "max-urls")]
    pub max_urls: u32,

    /// Politeness delay between two fetches (milliseconds)
    #[serde(rename = "crawl-delay-ms")]
    pub crawl_delay_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Full-string regular expressions a discovered link must match to be followed
    #[serde(rename = "accept-patterns")]
    pub accept_patterns: Vec<String>,
}

/// HTTP identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Optional Cookie header sent with every request
    #[serde(default)]
    pub cookie: Option<String>,
}

/// CSS selectors used by the HTML extraction adapter
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    #[serde(rename = "detail-selector", default = "default_detail_selector")]
    pub detail_selector: String,

    #[serde(rename = "content-selector", default = "default_content_selector")]
    pub content_selector: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            detail_selector: default_detail_selector(),
            content_selector: default_content_selector(),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file holding crawled records
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// How an index build treats an existing index directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenMode {
    /// Start from an empty index, replacing whatever was there
    Create,
    /// Keep previously indexed documents and add the new pass on top
    CreateOrAppend,
}

/// Index build configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IndexConfig {
    /// Directory holding the index files
    #[serde(rename = "index-path")]
    pub index_path: String,

    #[serde(rename = "open-mode", default = "default_open_mode")]
    pub open_mode: OpenMode,

    /// Number of content characters kept as the display summary
    #[serde(rename = "summary-length", default = "default_summary_length")]
    pub summary_length: usize,
}

/// Query defaults
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

fn default_detail_selector() -> String {
    ".Mid2L_tit .detail".to_string()
}

fn default_content_selector() -> String {
    ".Mid2L_con p, .Mid2L_con .GsImageLabel".to_string()
}

fn default_open_mode() -> OpenMode {
    OpenMode::CreateOrAppend
}

fn default_summary_length() -> usize {
    100
}

fn default_page_size() -> usize {
    10
}
