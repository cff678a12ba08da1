//! HTML extraction adapter
//!
//! This module turns a fetched HTML document into the fields of a crawled
//! record and the list of outgoing links:
//! - Page title (from the <title> tag)
//! - `description` and `keywords` meta tags
//! - A short detail line and the article body, chosen by CSS selectors
//! - Links to follow (from <a> tags), resolved against the page URL
//!
//! A page that does not have the expected structure is not an error; the
//! missing fields are simply empty.

use crate::config::ExtractionConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Fields and links extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub description: String,
    pub keywords: String,
    pub detail: String,
    pub content: String,

    /// All links found on the page (absolute URLs)
    pub links: Vec<String>,
}

/// Pluggable page extraction
///
/// The crawl loop only depends on this trait so that site-specific adapters
/// can replace the default CSS-selector extractor.
pub trait Extractor {
    /// Extracts fields and links from `html`, resolving links against `base_url`
    fn extract(&self, html: &str, base_url: &Url) -> ExtractedPage;
}

/// CSS-selector based extractor
#[derive(Debug)]
pub struct HtmlExtractor {
    title: Selector,
    description: Selector,
    keywords: Selector,
    detail: Selector,
    content: Selector,
    anchors: Selector,
}

impl HtmlExtractor {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(HtmlExtractor)` - All selectors parsed
    /// * `Err(ConfigError::Validation)` - A selector is not valid CSS
    pub fn new(config: &ExtractionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: parse_selector("title")?,
            description: parse_selector("meta[name=description]")?,
            keywords: parse_selector("meta[name=keywords]")?,
            detail: parse_selector(&config.detail_selector)?,
            content: parse_selector(&config.content_selector)?,
            anchors: parse_selector("a[href]")?,
        })
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, html: &str, base_url: &Url) -> ExtractedPage {
        let document = Html::parse_document(html);

        let title = document
            .select(&self.title)
            .next()
            .map(element_text)
            .unwrap_or_default();

        // Content paragraphs stay on separate lines
        let content = document
            .select(&self.content)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        ExtractedPage {
            title,
            description: meta_content(&document, &self.description),
            keywords: meta_content(&document, &self.keywords),
            detail: document
                .select(&self.detail)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            content,
            links: extract_links(&document, &self.anchors, base_url),
        }
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::Validation(format!("Invalid CSS selector '{}': {:?}", selector, e)))
}

/// Text of an element with runs of whitespace collapsed to one space
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn meta_content(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Extracts all valid links from the HTML document
fn extract_links(document: &Html, anchors: &Selector, base_url: &Url) -> Vec<String> {
    document
        .select(anchors)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
